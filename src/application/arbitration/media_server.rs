//! Media Server - 组合根
//!
//! 持有 DomainManager、MediaAgent、SessionManager、CallMonitor 和
//! AudioInterfaceServer，生命周期与进程一致。所有方法只在 MediaWorker
//! 的事件循环中调用

use std::collections::HashMap;
use std::sync::Arc;

use super::audio_interface::{AudioInterfaceServer, Directives};
use super::builder_manager::BuilderManager;
use super::call_monitor::CallMonitor;
use super::domain_manager::DomainManager;
use super::media_agent::MediaAgent;
use super::session_manager::SessionManager;
use super::uri_negotiator::UriNegotiator;
use crate::application::commands::{CreateSessionCommand, SessionAction};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioStatePort, ContentLicensePort, EngineContext, MediaEngine, SessionInfo,
    StatusPublisherPort,
};
use crate::domain::audio::ConnectionId;
use crate::domain::session::{SessionEvent, SessionId};

/// 仲裁参数（由配置转换而来）
#[derive(Debug, Clone, Default)]
pub struct ArbitrationSettings {
    pub domain_priorities: HashMap<String, i32>,
    pub engine_priorities: HashMap<String, i32>,
    pub call_domain: String,
    pub audio_mixing: bool,
    pub exclusive_domains: Vec<String>,
}

/// 外部协作者
pub struct MediaServerDeps {
    pub engines: Vec<Box<dyn MediaEngine>>,
    pub audio_state: Arc<dyn AudioStatePort>,
    pub license: Arc<dyn ContentLicensePort>,
    pub status: Arc<dyn StatusPublisherPort>,
}

pub struct MediaServer {
    sessions: SessionManager,
    calls: CallMonitor,
    audio: AudioInterfaceServer,
}

impl MediaServer {
    pub fn new(settings: ArbitrationSettings, deps: MediaServerDeps, context: EngineContext) -> Self {
        let mut builders = BuilderManager::new();
        builders.add_negotiator(Box::new(
            UriNegotiator::new(settings.engine_priorities.clone()).with_license(deps.license),
        ));

        let mut agent = MediaAgent::new(builders, deps.status.clone());
        agent.initialize(deps.engines, context);

        let domains = DomainManager::new(
            settings.domain_priorities,
            deps.audio_state,
            deps.status.clone(),
        );
        let sessions = SessionManager::new(domains, agent, deps.status.clone());
        let calls = CallMonitor::new(settings.call_domain, deps.status.clone());
        let audio = AudioInterfaceServer::new(
            settings.audio_mixing,
            settings.exclusive_domains,
            deps.status,
        );

        tracing::info!(
            engines = sessions.agent().engines().len(),
            wrapping = sessions.agent().is_wrapping(),
            "Media server initialized"
        );

        Self {
            sessions,
            calls,
            audio,
        }
    }

    pub fn create_session(&mut self, cmd: CreateSessionCommand) -> Result<SessionId, ApplicationError> {
        let request = cmd.into_request()?;
        self.sessions.create_session(&request)
    }

    pub fn control_session(
        &mut self,
        id: &SessionId,
        action: SessionAction,
    ) -> Result<(), ApplicationError> {
        tracing::debug!(session_id = %id, action = action.name(), "Session control");
        match action {
            SessionAction::Start => self.sessions.start(id),
            SessionAction::Pause => self.sessions.pause(id),
            SessionAction::Stop => self.sessions.stop(id),
            SessionAction::Suspend => self.sessions.suspend(id),
            SessionAction::Resume => self.sessions.resume(id),
            SessionAction::Seek(ms) => self.sessions.seek(id, ms),
            SessionAction::SetVolume(volume) => self.sessions.set_volume(id, volume),
            SessionAction::SetMuted(muted) => self.sessions.set_muted(id, muted),
            SessionAction::SetDomain(domain) => self.sessions.set_domain(id, &domain),
        }
    }

    pub fn destroy_session(&mut self, id: &SessionId) -> Result<(), ApplicationError> {
        self.sessions.destroy_session(id)
    }

    pub fn session_info(&self, id: &SessionId) -> Result<SessionInfo, ApplicationError> {
        self.sessions.session_info(id)
    }

    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        self.sessions.list_sessions()
    }

    pub fn set_call_active(&mut self, active: bool) {
        self.calls.set_call_active(active, &mut self.sessions);
    }

    pub fn session_event(&mut self, event: SessionEvent) {
        self.sessions.session_event(event);
    }

    pub fn poll(&mut self) {
        self.sessions.poll();
    }

    pub fn audio_connected(&mut self, id: ConnectionId) -> Directives {
        self.audio.connect(id)
    }

    pub fn audio_line(&mut self, id: ConnectionId, line: &str) -> Directives {
        self.audio.handle_line(id, line)
    }

    pub fn audio_disconnected(&mut self, id: ConnectionId) -> Directives {
        self.audio.disconnect(id)
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn audio(&self) -> &AudioInterfaceServer {
        &self.audio
    }

    /// 销毁所有会话（释放领域和引擎资源）
    pub fn shutdown(&mut self) {
        let ids = self.sessions.agent().session_ids();
        tracing::info!(sessions = ids.len(), "Media server shutting down");
        for id in ids {
            if let Err(e) = self.sessions.destroy_session(&id) {
                tracing::warn!(session_id = %id, error = %e, "Failed to destroy session on shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::application::arbitration::testing::{
        Journal, MockAudioState, MockBuilder, MockLicense, RecordingStatus,
    };
    use crate::application::ports::{EngineInformation, SessionBuilder};
    use crate::domain::audio::ServerDirective;

    struct UriEngine {
        builder: Arc<MockBuilder>,
    }

    impl MediaEngine for UriEngine {
        fn initialize(&mut self, _context: EngineContext) {}
        fn suspend(&mut self) {}
        fn resume(&mut self) {}

        fn information(&self) -> EngineInformation {
            EngineInformation {
                name: "uri".to_string(),
                version: "1.0".to_string(),
                idle_time_secs: 0,
                exclusive_device_access: true,
            }
        }

        fn builders(&self) -> Vec<Arc<dyn SessionBuilder>> {
            vec![self.builder.clone() as Arc<dyn SessionBuilder>]
        }
    }

    fn server(status: Arc<RecordingStatus>) -> MediaServer {
        let journal = Journal::default();
        let builder = Arc::new(MockBuilder::uri(journal, "uri", &["file", "qtopia"], &["audio/*"]));
        let settings = ArbitrationSettings {
            domain_priorities: [("Media".to_string(), 5), ("Phone".to_string(), 0)]
                .into_iter()
                .collect(),
            call_domain: "Phone".to_string(),
            exclusive_domains: vec!["Phone".to_string()],
            ..Default::default()
        };
        let deps = MediaServerDeps {
            engines: vec![Box::new(UriEngine { builder })],
            audio_state: Arc::new(MockAudioState::default()),
            license: Arc::new(MockLicense::new(true)),
            status,
        };
        let (tx, _rx) = mpsc::unbounded_channel();
        MediaServer::new(settings, deps, EngineContext::new(tx))
    }

    #[test]
    fn test_call_preempts_media_session() {
        let status = Arc::new(RecordingStatus::default());
        let mut server = server(status.clone());
        let id = server
            .create_session(CreateSessionCommand::new("Media", "file:///music/a.mp3"))
            .unwrap();
        server.control_session(&id, SessionAction::Start).unwrap();

        server.set_call_active(true);
        assert_eq!(
            status.get(&format!("/Media/Sessions/{}/State", id)),
            Some(json!("deactivated"))
        );
        assert_eq!(status.get("/Media/Calls/Active"), Some(json!(true)));

        server.set_call_active(false);
        assert_eq!(
            status.get(&format!("/Media/Sessions/{}/State", id)),
            Some(json!("activated"))
        );
    }

    #[test]
    fn test_unsupported_scheme_is_not_configured() {
        let mut server = server(Arc::new(RecordingStatus::default()));
        let err = server
            .create_session(CreateSessionCommand::new("Media", "rtsp://host/stream"))
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotConfigured(_)));
    }

    #[test]
    fn test_shutdown_destroys_sessions() {
        let mut server = server(Arc::new(RecordingStatus::default()));
        server
            .create_session(CreateSessionCommand::new("Media", "qtopia:///drm/a.mp3"))
            .unwrap();
        assert_eq!(server.list_sessions().len(), 1);

        server.shutdown();
        assert!(server.list_sessions().is_empty());
    }

    #[test]
    fn test_audio_socket_events_reach_arbiter() {
        let mut server = server(Arc::new(RecordingStatus::default()));
        let a = ConnectionId::new(1);
        assert_eq!(server.audio_connected(a), vec![(a, ServerDirective::Active)]);
        assert_eq!(server.audio_line(a, "--- PLAY"), vec![(a, ServerDirective::Ready)]);
        assert!(server.audio_disconnected(a).is_empty());
        assert_eq!(server.audio().instance_count(), 0);
    }
}
