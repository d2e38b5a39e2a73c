//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::ports::SessionInfo;
use crate::domain::session::SessionId;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

// ============================================================================
// Session DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub domain: String,
    /// 缺省为 URI 会话
    #[serde(rename = "type", default)]
    pub request_type: Option<String>,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: SessionId,
}

#[derive(Debug, Deserialize)]
pub struct SessionIdRequest {
    pub session_id: SessionId,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub session_id: SessionId,
    pub position_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    pub session_id: SessionId,
    /// 超出 0..=100 的值会被截断
    pub volume: i32,
}

#[derive(Debug, Deserialize)]
pub struct MuteRequest {
    pub session_id: SessionId,
    pub muted: bool,
}

#[derive(Debug, Deserialize)]
pub struct DomainRequest {
    pub session_id: SessionId,
    pub domain: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub domain: String,
    pub engine: String,
    pub state: &'static str,
    pub player_state: &'static str,
    pub volume: u8,
    pub muted: bool,
    pub length_ms: u64,
    pub position_ms: u64,
    pub created_at: String,
}

impl From<SessionInfo> for SessionResponse {
    fn from(info: SessionInfo) -> Self {
        Self {
            session_id: info.id,
            domain: info.domain,
            engine: info.engine,
            state: info.state.as_str(),
            player_state: info.player_state.as_str(),
            volume: info.volume,
            muted: info.muted,
            length_ms: info.length_ms,
            position_ms: info.position_ms,
            created_at: info.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Call DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub active: bool,
}
