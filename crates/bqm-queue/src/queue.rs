//! `Queue`: an ordered collection of assignments plus the processing
//! policy they share.

use bqm_core::{Assignment, QueueSettings};

use crate::error::QueueError;

#[derive(Debug, Clone)]
pub struct Queue {
    pub title: String,
    pub settings: QueueSettings,
    items: Vec<Assignment>,
    /// Indices into `items` not yet claimed by a worker.
    pending: std::collections::VecDeque<usize>,
}

impl Queue {
    pub fn new(title: impl Into<String>, settings: QueueSettings) -> Self {
        Queue { title: title.into(), settings, items: Vec::new(), pending: std::collections::VecDeque::new() }
    }

    pub fn push(&mut self, assignment: Assignment) {
        let index = self.items.len();
        self.items.push(assignment);
        self.pending.push_back(index);
    }

    /// Sum of tool-chain lengths over every still-pending assignment, not
    /// just the assignment count, since each tool in a chain is one task.
    pub fn pending_task_count(&self) -> usize {
        self.pending.iter().map(|&i| self.items[i].tools.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn pending_items(&self) -> impl Iterator<Item = &Assignment> {
        self.pending.iter().map(move |&i| &self.items[i])
    }

    /// Claims the next pending assignment for processing, handing one
    /// assignment at a time to a free worker thread.
    pub fn claim_next(&mut self) -> Result<&Assignment, QueueError> {
        let index = self.pending.pop_front().ok_or(QueueError::Empty)?;
        Ok(&self.items[index])
    }

    pub fn all_items(&self) -> &[Assignment] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bqm_core::{Assignment, ToolDescriptor, ToolGroup, ToolInstance, ToolSettings};

    fn tool(name: &str, index: usize) -> ToolInstance {
        let descriptor = ToolDescriptor {
            name: name.to_string(),
            group: ToolGroup::Transform,
            version: 1,
            output_suffix: String::new(),
            in_place: false,
        };
        ToolInstance::new(index, &descriptor, ToolSettings::new())
    }

    #[test]
    fn claim_next_drains_in_fifo_order() {
        let mut queue = Queue::new("My Queue", QueueSettings::default());
        queue.push(Assignment::new("/a.png", "a"));
        queue.push(Assignment::new("/b.png", "b"));

        assert_eq!(queue.claim_next().unwrap().item_url, std::path::PathBuf::from("/a.png"));
        assert_eq!(queue.claim_next().unwrap().item_url, std::path::PathBuf::from("/b.png"));
        assert!(queue.claim_next().is_err());
    }

    #[test]
    fn all_items_survives_claiming() {
        let mut queue = Queue::new("My Queue", QueueSettings::default());
        queue.push(Assignment::new("/a.png", "a"));
        let _ = queue.claim_next();
        assert_eq!(queue.all_items().len(), 1);
        assert_eq!(queue.pending_task_count(), 0);
    }

    #[test]
    fn pending_task_count_sums_tool_chain_lengths() {
        let mut queue = Queue::new("My Queue", QueueSettings::default());

        let mut one_tool = Assignment::new("/a.png", "a");
        one_tool.push_tool(tool("Resize", 0));
        queue.push(one_tool);

        let mut three_tools = Assignment::new("/b.png", "b");
        three_tools.push_tool(tool("Resize", 0));
        three_tools.push_tool(tool("Convert", 1));
        three_tools.push_tool(tool("TimeAdjust", 2));
        queue.push(three_tools);

        assert_eq!(queue.pending_task_count(), 4);
        let _ = queue.claim_next();
        assert_eq!(queue.pending_task_count(), 3);
    }
}
