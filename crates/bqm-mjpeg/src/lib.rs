//! MJPEG streaming pipeline.

pub mod albums;
pub mod error;
pub mod frame;
pub mod server;
pub mod service;
pub mod settings;

pub use albums::MjpegAlbumsMap;
pub use error::MjpegError;
pub use frame::FrameGenerator;
pub use server::MjpegServer;
pub use service::MjpegServiceHandle;
pub use settings::{EffectType, MjpegStreamSettings, OsdConfig, TransitionType};
