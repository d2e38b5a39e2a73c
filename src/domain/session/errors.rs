//! Session Context - Errors

use thiserror::Error;

use super::SessionId;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("会话不存在: {0}")]
    NotFound(SessionId),

    #[error("会话已存在: {0}")]
    AlreadyExists(SessionId),

    #[error("无效的会话请求: {0}")]
    InvalidRequest(String),
}
