//! Media Server Port - 控制面入站端口
//!
//! HTTP 层通过该接口访问单线程事件循环中的仲裁状态

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::commands::{CreateSessionCommand, SessionAction};
use crate::application::error::ApplicationError;
use crate::domain::session::{PlayerState, SessionId};

/// 会话管理层状态（与播放器状态独立）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagedState {
    /// 等待领域激活
    Starting,
    /// 领域已激活，可以使用设备
    Activated,
    /// 领域被抢占，会话已挂起
    Deactivated,
    Stopped,
}

impl ManagedState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagedState::Starting => "starting",
            ManagedState::Activated => "activated",
            ManagedState::Deactivated => "deactivated",
            ManagedState::Stopped => "stopped",
        }
    }
}

/// 会话快照
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub domain: String,
    pub engine: String,
    pub state: ManagedState,
    pub player_state: PlayerState,
    pub volume: u8,
    pub muted: bool,
    pub length_ms: u64,
    pub position_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Media Server Port
#[async_trait]
pub trait MediaServerPort: Send + Sync {
    async fn create_session(&self, cmd: CreateSessionCommand)
        -> Result<SessionId, ApplicationError>;

    async fn control_session(
        &self,
        id: SessionId,
        action: SessionAction,
    ) -> Result<(), ApplicationError>;

    async fn destroy_session(&self, id: SessionId) -> Result<(), ApplicationError>;

    async fn session_info(&self, id: SessionId) -> Result<SessionInfo, ApplicationError>;

    async fn list_sessions(&self) -> Result<Vec<SessionInfo>, ApplicationError>;

    /// 电话事件（CallMonitor 输入）
    async fn set_call_active(&self, active: bool) -> Result<(), ApplicationError>;
}
