//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Session Context: 会话请求、播放器状态、MediaSession 能力接口
//! - Audio Context: 音频接口协议与客户端实例

pub mod audio;
pub mod session;
