//! A saved preset: a title, description, queue processing policy and tool
//! chain that can be applied to a fresh queue later.

use bqm_core::{QueueSettings, ToolInstance};

#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    pub title: String,
    pub description: String,
    pub queue_settings: QueueSettings,
    pub tools: Vec<ToolInstance>,
}

impl Workflow {
    pub fn new(title: impl Into<String>, description: impl Into<String>, queue_settings: QueueSettings) -> Self {
        Workflow { title: title.into(), description: description.into(), queue_settings, tools: Vec::new() }
    }
}
