//! 应用层错误定义
//!
//! 统一的命令/查询错误类型，仲裁失败本身不是错误（返回 bool / 状态迁移）

use thiserror::Error;

use crate::domain::session::SessionError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 没有 builder / negotiator 能处理该请求
    #[error("Not configured to handle this request: {0}")]
    NotConfigured(String),

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 媒体服务已停止
    #[error("Media server unavailable: {0}")]
    Unavailable(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<SessionError> for ApplicationError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => Self::not_found("Session", id),
            SessionError::AlreadyExists(id) => {
                Self::InvalidState(format!("session already exists: {}", id))
            }
            SessionError::InvalidRequest(msg) => Self::ValidationError(msg),
        }
    }
}
