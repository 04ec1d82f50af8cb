//! An item paired with the ordered chain of tools it should run through:
//! the destination file name, the original item URL, and the ordered list
//! of tool instances.

use std::path::{Path, PathBuf};

use crate::tool::ToolInstance;

/// One queue entry: an item plus the ordered chain of tool instances it
/// will run through.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// File name (without directory) the final output should be saved as,
    /// before any extension substitution from `target_suffix`.
    pub dest_file_name: String,
    /// The original, unmodified source path. The task executor always
    /// reports errors and progress against this path, never an
    /// intermediate temp file.
    pub item_url: PathBuf,
    pub tools: Vec<ToolInstance>,
}

impl Assignment {
    pub fn new(item_url: impl Into<PathBuf>, dest_file_name: impl Into<String>) -> Self {
        Assignment {
            dest_file_name: dest_file_name.into(),
            item_url: item_url.into(),
            tools: Vec::new(),
        }
    }

    pub fn push_tool(&mut self, tool: ToolInstance) -> &mut Self {
        self.tools.push(tool);
        self
    }

    /// Resolves the suffix the final output file should carry.
    ///
    /// Walks every tool in the chain (not just the last one) and keeps the
    /// suffix from the *last* tool that declares a non-empty one, since a
    /// later tool's container change always wins over an earlier one's.
    /// `lookup` resolves a tool instance to its descriptor's
    /// `output_suffix`; it lives in `bqm-registry`, so it is injected here
    /// rather than looked up directly to avoid a dependency cycle.
    pub fn target_suffix<F>(&self, lookup: F) -> (String, bool)
    where
        F: Fn(&ToolInstance) -> Option<String>,
    {
        let mut suffix = String::new();
        let mut ext_set = false;
        for tool in &self.tools {
            if let Some(s) = lookup(tool) {
                if !s.is_empty() {
                    suffix = s;
                    ext_set = true;
                }
            }
        }
        if !ext_set {
            suffix = Path::new(&self.item_url)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_string();
        }
        (suffix, ext_set)
    }
}
