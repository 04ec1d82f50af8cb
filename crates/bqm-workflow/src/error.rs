use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("xml attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("settings decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed workflow document: {0}")]
    Malformed(String),

    #[error("no workflow titled `{0}`")]
    NotFound(String),
}
