//! Session Context - 会话限界上下文
//!
//! 职责:
//! - 会话请求（SessionRequest）
//! - 播放器状态与会话事件
//! - MediaSession 能力接口

mod errors;
mod media_session;
mod value_objects;

pub use errors::SessionError;
pub use media_session::{
    MediaSession, SessionEvent, SessionEventKind, SessionEventReceiver, SessionEventSender,
};
pub use value_objects::{
    clamp_volume, PlayerState, RequestPayload, SessionId, SessionRequest, MEDIA_DOMAIN,
    URI_SESSION_TYPE,
};
