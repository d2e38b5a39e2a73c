//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 端口定义（MediaEngine、SessionBuilder、AudioState、StatusPublisher、MediaServer 等）
//! - commands: 控制面命令
//! - arbitration: 会话 / 领域 / 音频设备仲裁
//! - error: 应用层错误定义

pub mod arbitration;
pub mod commands;
pub mod error;
pub mod ports;

// Re-exports
pub use arbitration::{ArbitrationSettings, MediaServer, MediaServerDeps};
pub use commands::{CreateSessionCommand, SessionAction};
pub use error::ApplicationError;
pub use ports::{
    AudioStatePort, ContentLicensePort, EngineContext, EngineInformation, ManagedState,
    MediaEngine, MediaServerPort, SessionBuilder, SessionInfo, StatusPublisherPort,
};
