use thiserror::Error;

#[derive(Debug, Error)]
pub enum MjpegError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("xml attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("server is already running")]
    AlreadyRunning,

    #[error("album list is empty")]
    NoAlbums,
}
