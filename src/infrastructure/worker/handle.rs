//! Media Server Handle
//!
//! MediaServerPort 的实现：把请求作为 ServerCommand 发送给 MediaWorker，
//! 等待 oneshot 回复

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::media_worker::ServerCommand;
use crate::application::commands::{CreateSessionCommand, SessionAction};
use crate::application::error::ApplicationError;
use crate::application::ports::{MediaServerPort, SessionInfo};
use crate::domain::session::SessionId;

#[derive(Clone)]
pub struct MediaServerHandle {
    commands: mpsc::Sender<ServerCommand>,
}

impl MediaServerHandle {
    pub fn new(commands: mpsc::Sender<ServerCommand>) -> Self {
        Self { commands }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, ApplicationError>>) -> ServerCommand,
    ) -> Result<T, ApplicationError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| ApplicationError::Unavailable("media worker stopped".to_string()))?;
        rx.await
            .map_err(|_| ApplicationError::Unavailable("media worker dropped request".to_string()))?
    }

    /// 请求 MediaWorker 停止，并等待其释放所有会话
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self
            .commands
            .send(ServerCommand::Shutdown { reply: tx })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }
}

#[async_trait]
impl MediaServerPort for MediaServerHandle {
    async fn create_session(
        &self,
        cmd: CreateSessionCommand,
    ) -> Result<SessionId, ApplicationError> {
        self.request(|reply| ServerCommand::CreateSession { cmd, reply })
            .await
    }

    async fn control_session(
        &self,
        id: SessionId,
        action: SessionAction,
    ) -> Result<(), ApplicationError> {
        self.request(|reply| ServerCommand::Control { id, action, reply })
            .await
    }

    async fn destroy_session(&self, id: SessionId) -> Result<(), ApplicationError> {
        self.request(|reply| ServerCommand::DestroySession { id, reply })
            .await
    }

    async fn session_info(&self, id: SessionId) -> Result<SessionInfo, ApplicationError> {
        self.request(|reply| ServerCommand::SessionInfo { id, reply })
            .await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionInfo>, ApplicationError> {
        self.request(|reply| ServerCommand::ListSessions { reply })
            .await
    }

    async fn set_call_active(&self, active: bool) -> Result<(), ApplicationError> {
        self.request(|reply| ServerCommand::SetCallActive { active, reply })
            .await
    }
}
