//! Events a `WorkflowStore` reports so a UI mirroring the saved workflow
//! list can stay in sync without re-reading the whole store after every
//! change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Added(String),
    Removed(String),
}
