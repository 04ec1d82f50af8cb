//! Tool registry and built-in tools.

pub mod error;
pub mod registry;
pub mod tool_trait;
pub mod tools;

pub use error::RegistryError;
pub use registry::{default_registry, ToolRegistry};
pub use tool_trait::{Tool, ToolContext, ToolOutcome, ToolOutput};
