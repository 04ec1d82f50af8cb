//! `WorkflowStore`: load/save a workflow list against a file path supplied
//! by the caller, rather than a fixed app-data location, so tests can
//! point it at a temp directory instead of a hardcoded one.

use std::path::{Path, PathBuf};

use bqm_core::ToolGroup;
use bqm_registry::ToolRegistry;

use crate::error::WorkflowError;
use crate::event::WorkflowEvent;
use crate::workflow::Workflow;
use crate::xml::{read_workflows, write_workflows};

pub struct WorkflowStore {
    path: PathBuf,
    workflows: Vec<Workflow>,
}

impl WorkflowStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        WorkflowStore { path: path.into(), workflows: Vec::new() }
    }

    /// Loads the document at this store's path, checking every workflow's
    /// tools against `registry`. Incompatible workflows (tool missing, or
    /// present at a different version) are dropped from the loaded set and
    /// their titles are returned so the caller can report them. A missing
    /// file is not an error: it loads as an empty store, matching
    /// first-run behavior.
    pub fn load(&mut self, registry: &ToolRegistry) -> Result<Vec<String>, WorkflowError> {
        if !self.path.exists() {
            self.workflows.clear();
            return Ok(Vec::new());
        }
        let xml = std::fs::read_to_string(&self.path)?;
        let lookup = |group: ToolGroup, name: &str| registry.descriptor(group, name).ok().map(|d| d.version);
        let (loaded, failed) = read_workflows(&xml, &lookup)?;
        for title in &failed {
            tracing::warn!(workflow = %title, "dropped workflow referencing an incompatible tool");
        }
        self.workflows = loaded;
        Ok(failed)
    }

    pub fn save(&self) -> Result<(), WorkflowError> {
        let xml = write_workflows(&self.workflows)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, xml)?;
        Ok(())
    }

    /// Replaces any existing workflow with the same title, then reports
    /// `WorkflowEvent::Added` through `emit` so a UI mirroring the store
    /// can update without re-reading the whole list.
    pub fn insert(&mut self, workflow: Workflow, mut emit: impl FnMut(WorkflowEvent)) {
        let title = workflow.title.clone();
        self.workflows.retain(|w| w.title != workflow.title);
        self.workflows.push(workflow);
        emit(WorkflowEvent::Added(title));
    }

    pub fn remove(&mut self, title: &str, mut emit: impl FnMut(WorkflowEvent)) -> Result<(), WorkflowError> {
        let before = self.workflows.len();
        self.workflows.retain(|w| w.title != title);
        if self.workflows.len() == before {
            return Err(WorkflowError::NotFound(title.to_string()));
        }
        emit(WorkflowEvent::Removed(title.to_string()));
        Ok(())
    }

    pub fn find_by_title(&self, title: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.title == title)
    }

    pub fn queue_settings_list(&self) -> &[Workflow] {
        &self.workflows
    }

    pub fn clear(&mut self) {
        self.workflows.clear();
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bqm_core::{QueueSettings, ToolInstance, ToolSettings};
    use tempfile::tempdir;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let registry = bqm_registry::default_registry();
        let descriptor = registry.descriptor(ToolGroup::Convert, "Convert").unwrap();

        let mut store = WorkflowStore::new(dir.path().join("workflows.xml"));
        let mut workflow = Workflow::new("Archive", "", QueueSettings::default());
        workflow.tools.push(ToolInstance::new(0, &descriptor, ToolSettings::new().with("format", "png")));
        store.insert(workflow, |_| {});
        store.save().unwrap();

        let mut reloaded = WorkflowStore::new(dir.path().join("workflows.xml"));
        let failed = reloaded.load(&registry).unwrap();
        assert!(failed.is_empty());
        assert_eq!(reloaded.queue_settings_list().len(), 1);
        assert_eq!(reloaded.find_by_title("Archive").unwrap().tools.len(), 1);
    }

    #[test]
    fn loading_missing_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let registry = bqm_registry::default_registry();
        let mut store = WorkflowStore::new(dir.path().join("absent.xml"));
        let failed = store.load(&registry).unwrap();
        assert!(failed.is_empty());
        assert!(store.queue_settings_list().is_empty());
    }

    #[test]
    fn insert_replaces_existing_title() {
        let dir = tempdir().unwrap();
        let mut store = WorkflowStore::new(dir.path().join("workflows.xml"));
        store.insert(Workflow::new("Archive", "first", QueueSettings::default()), |_| {});
        store.insert(Workflow::new("Archive", "second", QueueSettings::default()), |_| {});
        assert_eq!(store.queue_settings_list().len(), 1);
        assert_eq!(store.find_by_title("Archive").unwrap().description, "second");
    }

    #[test]
    fn remove_unknown_title_errors() {
        let dir = tempdir().unwrap();
        let mut store = WorkflowStore::new(dir.path().join("workflows.xml"));
        assert!(store.remove("nope", |_| {}).is_err());
    }

    #[test]
    fn insert_and_remove_emit_matching_events() {
        let dir = tempdir().unwrap();
        let mut store = WorkflowStore::new(dir.path().join("workflows.xml"));
        let mut events = Vec::new();

        store.insert(Workflow::new("Archive", "first", QueueSettings::default()), |e| events.push(e));
        store.remove("Archive", |e| events.push(e)).unwrap();

        assert_eq!(events, vec![WorkflowEvent::Added("Archive".to_string()), WorkflowEvent::Removed("Archive".to_string())]);
    }
}
