//! Session Manager - 会话门面
//!
//! 负责创建/销毁会话，并把每个会话的领域与 DomainManager 的激活状态绑定：
//! 领域未激活时 start 请求进入 Starting 排队，直到后续领域状态变化把它激活。
//! 同时维护“正在播放的会话数”并发布到状态存储

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use super::call_monitor::DomainControl;
use super::domain_manager::{DomainManager, DomainStatus};
use super::media_agent::MediaAgent;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    media_path, ManagedState, SessionInfo, StatusPublisherPort,
};
use crate::domain::session::{
    PlayerState, SessionEvent, SessionEventKind, SessionId, SessionRequest,
};

struct ManagedSession {
    id: SessionId,
    domain: String,
    state: ManagedState,
    created_at: DateTime<Utc>,
}

impl ManagedSession {
    /// Activated / Deactivated 状态的会话持有领域引用
    fn holds_domain(&self) -> bool {
        matches!(
            self.state,
            ManagedState::Activated | ManagedState::Deactivated
        )
    }
}

pub struct SessionManager {
    domains: DomainManager,
    agent: MediaAgent,
    sessions: Vec<ManagedSession>,
    active_count: usize,
    status: Arc<dyn StatusPublisherPort>,
}

impl SessionManager {
    pub fn new(
        domains: DomainManager,
        agent: MediaAgent,
        status: Arc<dyn StatusPublisherPort>,
    ) -> Self {
        status.set_attribute(&media_path(&["Sessions", "ActiveCount"]), json!(0));
        Self {
            domains,
            agent,
            sessions: Vec::new(),
            active_count: 0,
            status,
        }
    }

    pub fn agent(&self) -> &MediaAgent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut MediaAgent {
        &mut self.agent
    }

    pub fn domains(&self) -> &DomainManager {
        &self.domains
    }

    pub fn create_session(&mut self, request: &SessionRequest) -> Result<SessionId, ApplicationError> {
        let engine = self.agent.create_session(request).ok_or_else(|| {
            tracing::warn!(
                domain = %request.domain(),
                request_type = %request.request_type(),
                "No builder accepted session request"
            );
            ApplicationError::NotConfigured(request.request_type().to_string())
        })?;

        let id = request.id().clone();
        tracing::info!(
            session_id = %id,
            domain = %request.domain(),
            engine = %engine,
            "Session created"
        );

        self.sessions.push(ManagedSession {
            id: id.clone(),
            domain: request.domain().to_string(),
            state: ManagedState::Stopped,
            created_at: Utc::now(),
        });
        self.status.set_attribute(
            &media_path(&["Sessions", id.as_str(), "Domain"]),
            json!(request.domain()),
        );
        self.publish_state(self.sessions.len() - 1);
        Ok(id)
    }

    /// 先按停止处理释放领域，再逐层拆除会话
    pub fn destroy_session(&mut self, id: &SessionId) -> Result<(), ApplicationError> {
        let index = self.index_of(id)?;
        self.session_stopped(index);
        self.sessions.remove(index);

        let result = self.agent.destroy_session(id);
        self.status
            .remove_attribute(&media_path(&["Sessions", id.as_str()]));
        self.refresh_active_count();

        tracing::info!(session_id = %id, "Session destroyed");
        result
    }

    /// 领域未激活时不启动底层会话
    pub fn start(&mut self, id: &SessionId) -> Result<(), ApplicationError> {
        let index = self.index_of(id)?;
        if self.session_can_start(index) {
            self.agent.start(id)?;
        } else {
            tracing::debug!(
                session_id = %id,
                state = self.sessions[index].state.as_str(),
                "Session start queued until its domain becomes active"
            );
        }
        self.after_player_change();
        Ok(())
    }

    pub fn pause(&mut self, id: &SessionId) -> Result<(), ApplicationError> {
        self.agent.session_mut(id)?.pause();
        self.after_player_change();
        Ok(())
    }

    pub fn stop(&mut self, id: &SessionId) -> Result<(), ApplicationError> {
        let index = self.index_of(id)?;
        self.agent.session_mut(id)?.stop();
        self.session_stopped(index);
        self.after_player_change();
        Ok(())
    }

    pub fn suspend(&mut self, id: &SessionId) -> Result<(), ApplicationError> {
        self.agent.suspend(id)?;
        self.after_player_change();
        Ok(())
    }

    pub fn resume(&mut self, id: &SessionId) -> Result<(), ApplicationError> {
        self.agent.resume(id)?;
        self.after_player_change();
        Ok(())
    }

    pub fn seek(&mut self, id: &SessionId, position_ms: u64) -> Result<(), ApplicationError> {
        self.agent.session_mut(id)?.seek(position_ms);
        Ok(())
    }

    pub fn set_volume(&mut self, id: &SessionId, volume: u8) -> Result<(), ApplicationError> {
        self.agent.session_mut(id)?.set_volume(volume);
        Ok(())
    }

    pub fn set_muted(&mut self, id: &SessionId, muted: bool) -> Result<(), ApplicationError> {
        self.agent.session_mut(id)?.set_muted(muted);
        Ok(())
    }

    /// 只允许在会话不持有领域时切换
    pub fn set_domain(&mut self, id: &SessionId, domain: &str) -> Result<(), ApplicationError> {
        if domain.is_empty() {
            return Err(ApplicationError::validation("domain must not be empty"));
        }
        let index = self.index_of(id)?;
        if self.sessions[index].state != ManagedState::Stopped {
            return Err(ApplicationError::invalid_state(format!(
                "session {} is {}, stop it before changing domain",
                id,
                self.sessions[index].state.as_str()
            )));
        }

        self.agent.session_mut(id)?.set_domain(domain);
        self.sessions[index].domain = domain.to_string();
        self.status.set_attribute(
            &media_path(&["Sessions", id.as_str(), "Domain"]),
            json!(domain),
        );
        Ok(())
    }

    fn session_can_start(&mut self, index: usize) -> bool {
        match self.sessions[index].state {
            ManagedState::Activated => true,
            ManagedState::Deactivated => false,
            ManagedState::Stopped | ManagedState::Starting => {
                let domain = self.sessions[index].domain.clone();
                let granted = self.domains.activate_domain(&domain);
                self.sessions[index].state = if granted {
                    ManagedState::Activated
                } else {
                    ManagedState::Starting
                };
                self.publish_state(index);
                self.dispatch_domain_changes();
                granted
            }
        }
    }

    /// 同一会话重复上报停止时只释放一次领域
    fn session_stopped(&mut self, index: usize) {
        let session = &mut self.sessions[index];
        if session.state == ManagedState::Stopped {
            return;
        }
        let held = session.holds_domain();
        let domain = session.domain.clone();
        session.state = ManagedState::Stopped;
        tracing::debug!(session_id = %session.id, domain = %domain, "Session stopped");
        self.publish_state(index);

        if held {
            self.domains.deactivate_domain(&domain);
            self.dispatch_domain_changes();
        }
    }

    fn dispatch_domain_changes(&mut self) {
        for change in self.domains.take_status_changes() {
            self.domain_status_changed(&change);
        }
    }

    fn domain_status_changed(&mut self, change: &DomainStatus) {
        tracing::debug!(active = ?change.active, inactive = ?change.inactive, "Domain status changed");

        for index in 0..self.sessions.len() {
            let active = change.is_active(&self.sessions[index].domain);
            let state = self.sessions[index].state;
            let id = self.sessions[index].id.clone();

            let next = match (active, state) {
                (false, ManagedState::Activated) => {
                    if let Err(e) = self.agent.suspend(&id) {
                        tracing::warn!(session_id = %id, error = %e, "Failed to suspend session");
                    }
                    ManagedState::Deactivated
                }
                (true, ManagedState::Deactivated) => {
                    if let Err(e) = self.agent.resume(&id) {
                        tracing::warn!(session_id = %id, error = %e, "Failed to resume session");
                    }
                    ManagedState::Activated
                }
                // 排队中的 start 请求此时才真正执行；领域已活动，只增加引用计数
                (true, ManagedState::Starting) => {
                    let domain = self.sessions[index].domain.clone();
                    if !self.domains.activate_domain(&domain) {
                        continue;
                    }
                    if let Err(e) = self.agent.start(&id) {
                        tracing::warn!(session_id = %id, error = %e, "Failed to start queued session");
                    }
                    ManagedState::Activated
                }
                _ => continue,
            };

            tracing::info!(
                session_id = %id,
                from = state.as_str(),
                to = next.as_str(),
                "Session domain state changed"
            );
            self.sessions[index].state = next;
            self.publish_state(index);
        }
    }

    /// 引擎上报的会话事件
    pub fn session_event(&mut self, event: SessionEvent) {
        let index = match self.index_of(&event.session_id) {
            Ok(index) => index,
            Err(_) => {
                tracing::debug!(session_id = %event.session_id, "Event for unknown session ignored");
                return;
            }
        };
        let id = event.session_id.as_str();

        match event.kind {
            SessionEventKind::StateChanged(state) => {
                tracing::debug!(session_id = %id, player_state = state.as_str(), "Player state changed");
                self.status.set_attribute(
                    &media_path(&["Sessions", id, "PlayerState"]),
                    json!(state.as_str()),
                );
                if state.is_terminal() {
                    self.session_stopped(index);
                }
                self.after_player_change();
            }
            SessionEventKind::PositionChanged(ms) => {
                self.status
                    .set_attribute(&media_path(&["Sessions", id, "Position"]), json!(ms));
            }
            SessionEventKind::LengthChanged(ms) => {
                self.status
                    .set_attribute(&media_path(&["Sessions", id, "Length"]), json!(ms));
            }
            SessionEventKind::VolumeChanged(volume) => {
                self.status
                    .set_attribute(&media_path(&["Sessions", id, "Volume"]), json!(volume));
            }
            SessionEventKind::MutedChanged(muted) => {
                self.status
                    .set_attribute(&media_path(&["Sessions", id, "Muted"]), json!(muted));
            }
        }
    }

    /// 轮询入口
    pub fn poll(&mut self) {
        self.after_player_change();
    }

    fn after_player_change(&mut self) {
        self.agent.update_sessions();
        self.refresh_active_count();
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions
            .iter()
            .filter_map(|s| self.agent.session(&s.id))
            .filter(|s| s.player_state() == PlayerState::Playing)
            .count()
    }

    fn refresh_active_count(&mut self) {
        let count = self.active_session_count();
        if count != self.active_count {
            self.active_count = count;
            tracing::debug!(active_sessions = count, "Active session count changed");
            self.status
                .set_attribute(&media_path(&["Sessions", "ActiveCount"]), json!(count));
        }
    }

    pub fn session_state(&self, id: &SessionId) -> Option<ManagedState> {
        self.sessions.iter().find(|s| &s.id == id).map(|s| s.state)
    }

    pub fn session_info(&self, id: &SessionId) -> Result<SessionInfo, ApplicationError> {
        let index = self.index_of(id)?;
        self.info_at(index)
    }

    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        (0..self.sessions.len())
            .filter_map(|index| self.info_at(index).ok())
            .collect()
    }

    fn info_at(&self, index: usize) -> Result<SessionInfo, ApplicationError> {
        let record = &self.sessions[index];
        let session = self
            .agent
            .session(&record.id)
            .ok_or_else(|| ApplicationError::not_found("Session", &record.id))?;

        Ok(SessionInfo {
            id: record.id.clone(),
            domain: record.domain.clone(),
            engine: self.agent.engine_of(&record.id).unwrap_or_default().to_string(),
            state: record.state,
            player_state: session.player_state(),
            volume: session.volume(),
            muted: session.is_muted(),
            length_ms: session.length(),
            position_ms: session.position(),
            created_at: record.created_at,
        })
    }

    fn publish_state(&self, index: usize) {
        let session = &self.sessions[index];
        self.status.set_attribute(
            &media_path(&["Sessions", session.id.as_str(), "State"]),
            json!(session.state.as_str()),
        );
    }

    fn index_of(&self, id: &SessionId) -> Result<usize, ApplicationError> {
        self.sessions
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| ApplicationError::not_found("Session", id))
    }
}

impl DomainControl for SessionManager {
    fn activate_domain(&mut self, name: &str) -> bool {
        let granted = self.domains.activate_domain(name);
        self.dispatch_domain_changes();
        granted
    }

    fn deactivate_domain(&mut self, name: &str) {
        self.domains.deactivate_domain(name);
        self.dispatch_domain_changes();
    }
}
