//! Application Ports - 端口定义
//!
//! 定义仲裁层与引擎、音频后端、状态存储、控制面之间的抽象接口

mod audio_state;
mod content_license;
mod media_engine;
mod media_server;
mod session_builder;
mod status_store;

pub use audio_state::AudioStatePort;
pub use content_license::ContentLicensePort;
pub use media_engine::{EngineContext, EngineInformation, MediaEngine};
pub use media_server::{ManagedState, MediaServerPort, SessionInfo};
pub use session_builder::{
    BuilderAttributes, SessionBuilder, MIME_TYPES_ATTRIBUTE, URI_SCHEMES_ATTRIBUTE,
};
pub use status_store::{media_path, StatusPublisherPort, MEDIA_ROOT};
