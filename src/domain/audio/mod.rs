//! Audio Context - 音频设备仲裁上下文
//!
//! 职责:
//! - 音频接口行协议（解析 / 编码）
//! - 客户端实例模型

mod instance;
mod protocol;

pub use instance::{
    AudioClientInstance, ConnectionId, InstanceState, InstanceType, MEDIA_SERVER_DOMAIN,
    PRIVILEGED_PRIORITY,
};
pub use protocol::{ClientCommand, ProtocolError, ServerDirective, LINE_PREFIX};
