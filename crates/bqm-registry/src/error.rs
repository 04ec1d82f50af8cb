use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool `{name}` is already registered in group {group:?}")]
    AlreadyRegistered { group: bqm_core::ToolGroup, name: String },

    #[error("no tool named `{name}` registered in group {group:?}")]
    NotFound { group: bqm_core::ToolGroup, name: String },

    #[error("tool `{tool}` rejected setting `{key}`: {reason}")]
    InvalidSetting { tool: String, key: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("in-memory image buffer handed between chain steps was malformed: {0}")]
    MalformedBuffer(String),
}
