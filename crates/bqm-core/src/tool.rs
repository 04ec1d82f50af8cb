//! Static tool metadata (`ToolDescriptor`) and the per-assignment snapshot
//! of a tool with its settings (`ToolInstance`).
//!
//! A group plus a name identifies a tool family, a version disambiguates
//! incompatible settings schemas across releases, and an instance carries
//! settings separately from identity.

use serde::{Deserialize, Serialize};

use crate::value::ToolSettings;

/// The category a tool belongs to. `Custom` is distinguished from the rest
/// because the task executor's chaining rule treats it specially: a tool
/// immediately followed by a `Custom` tool is always the last one to run
/// in-process, even if later tools remain in the assignment (see
/// `bqm-task`'s chain walk).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolGroup {
    Convert,
    Transform,
    Decorate,
    Filters,
    Color,
    Enhance,
    Metadata,
    Custom,
}

/// Static metadata a registered tool publishes about itself. It never
/// carries settings, only identity and capability flags the queue/task
/// layers consult.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub group: ToolGroup,
    pub version: u32,
    /// Non-empty when the tool changes the container format; an empty
    /// string means the tool keeps whatever suffix the chain already has.
    pub output_suffix: String,
    /// True for tools (like metadata edits applied in place) that never
    /// need the task executor to persist a new output file for them.
    pub in_place: bool,
}

/// One tool placed at a specific position in an assignment's chain, with
/// the settings it should run with. Equality considers only the identity
/// fields (position, version, name, group), not settings, so two
/// instances of the same tool at the same position compare equal
/// regardless of configuration differences picked up between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInstance {
    pub index: usize,
    pub version: u32,
    pub name: String,
    pub group: ToolGroup,
    pub settings: ToolSettings,
}

impl PartialEq for ToolInstance {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.version == other.version
            && self.name == other.name
            && self.group == other.group
    }
}

impl Eq for ToolInstance {}

impl ToolInstance {
    pub fn new(index: usize, descriptor: &ToolDescriptor, settings: ToolSettings) -> Self {
        ToolInstance {
            index,
            version: descriptor.version,
            name: descriptor.name.clone(),
            group: descriptor.group,
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ToolDescriptor {
        ToolDescriptor {
            name: "Resize".to_string(),
            group: ToolGroup::Transform,
            version: 1,
            output_suffix: String::new(),
            in_place: false,
        }
    }

    #[test]
    fn equality_ignores_settings() {
        let d = descriptor();
        let a = ToolInstance::new(0, &d, ToolSettings::new().with("width", 800i64));
        let b = ToolInstance::new(0, &d, ToolSettings::new().with("width", 1200i64));
        assert_eq!(a, b);
    }

    #[test]
    fn equality_requires_same_position() {
        let d = descriptor();
        let a = ToolInstance::new(0, &d, ToolSettings::new());
        let b = ToolInstance::new(1, &d, ToolSettings::new());
        assert_ne!(a, b);
    }

    #[test]
    fn equality_requires_same_version() {
        let d = descriptor();
        let a = ToolInstance::new(0, &d, ToolSettings::new());
        let mut newer = d.clone();
        newer.version = 2;
        let b = ToolInstance::new(0, &newer, ToolSettings::new());
        assert_ne!(a, b);
    }
}
