//! Simulated Engine - 不做解码的模拟媒体引擎
//!
//! 会话状态按调用立即迁移，并通过引擎上下文的事件通道上报，
//! 用于驱动服务本身和集成测试

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::application::ports::{
    BuilderAttributes, EngineContext, EngineInformation, MediaEngine, SessionBuilder,
    MIME_TYPES_ATTRIBUTE, URI_SCHEMES_ATTRIBUTE,
};
use crate::domain::session::{
    MediaSession, PlayerState, SessionEvent, SessionEventKind, SessionEventSender, SessionId,
    SessionRequest, URI_SESSION_TYPE,
};

/// Simulated Engine 配置
#[derive(Debug, Clone)]
pub struct SimulatedEngineSettings {
    pub name: String,
    pub version: String,
    pub exclusive: bool,
    pub uri_schemes: Vec<String>,
    pub mime_types: Vec<String>,
    pub idle_time_secs: u64,
    /// 每个会话报告的媒体时长（毫秒）
    pub track_length_ms: u64,
}

impl Default for SimulatedEngineSettings {
    fn default() -> Self {
        Self {
            name: "simulated".to_string(),
            version: "1.0".to_string(),
            exclusive: false,
            uri_schemes: vec!["file".to_string()],
            mime_types: vec!["audio/*".to_string()],
            idle_time_secs: 0,
            track_length_ms: 180_000,
        }
    }
}

pub struct SimulatedEngine {
    settings: SimulatedEngineSettings,
    builder: Option<Arc<SimulatedBuilder>>,
    suspended: bool,
}

impl SimulatedEngine {
    pub fn new(settings: SimulatedEngineSettings) -> Self {
        Self {
            settings,
            builder: None,
            suspended: false,
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}

impl MediaEngine for SimulatedEngine {
    fn initialize(&mut self, context: EngineContext) {
        let attributes = BuilderAttributes::new()
            .with(URI_SCHEMES_ATTRIBUTE, self.settings.uri_schemes.clone())
            .with(MIME_TYPES_ATTRIBUTE, self.settings.mime_types.clone());

        self.builder = Some(Arc::new(SimulatedBuilder {
            engine: self.settings.name.clone(),
            attributes,
            track_length_ms: self.settings.track_length_ms,
            events: context.session_events,
            live: AtomicUsize::new(0),
        }));
        tracing::info!(
            engine = %self.settings.name,
            schemes = ?self.settings.uri_schemes,
            "SimulatedEngine initialized"
        );
    }

    fn suspend(&mut self) {
        self.suspended = true;
        tracing::debug!(engine = %self.settings.name, "SimulatedEngine suspended");
    }

    fn resume(&mut self) {
        self.suspended = false;
        tracing::debug!(engine = %self.settings.name, "SimulatedEngine resumed");
    }

    fn information(&self) -> EngineInformation {
        EngineInformation {
            name: self.settings.name.clone(),
            version: self.settings.version.clone(),
            idle_time_secs: self.settings.idle_time_secs,
            exclusive_device_access: self.settings.exclusive,
        }
    }

    fn builders(&self) -> Vec<Arc<dyn SessionBuilder>> {
        self.builder
            .iter()
            .map(|b| b.clone() as Arc<dyn SessionBuilder>)
            .collect()
    }
}

struct SimulatedBuilder {
    engine: String,
    attributes: BuilderAttributes,
    track_length_ms: u64,
    events: SessionEventSender,
    live: AtomicUsize,
}

impl SessionBuilder for SimulatedBuilder {
    fn builder_type(&self) -> &str {
        URI_SESSION_TYPE
    }

    fn attributes(&self) -> &BuilderAttributes {
        &self.attributes
    }

    fn create_session(&self, request: &SessionRequest) -> Option<Box<dyn MediaSession>> {
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(
            engine = %self.engine,
            session_id = %request.id(),
            live_sessions = live,
            "Simulated session created"
        );
        Some(Box::new(SimulatedSession {
            id: request.id().clone(),
            domain: request.domain().to_string(),
            state: PlayerState::Stopped,
            volume: 100,
            muted: false,
            position_ms: 0,
            length_ms: self.track_length_ms,
            suspended: false,
            events: self.events.clone(),
        }))
    }

    fn destroy_session(&self, session: Box<dyn MediaSession>) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(engine = %self.engine, session_id = %session.id(), "Simulated session destroyed");
    }
}

struct SimulatedSession {
    id: SessionId,
    domain: String,
    state: PlayerState,
    volume: u8,
    muted: bool,
    position_ms: u64,
    length_ms: u64,
    /// 被挂起时暂停输出，但保留播放器状态
    suspended: bool,
    events: SessionEventSender,
}

impl SimulatedSession {
    fn emit(&self, kind: SessionEventKind) {
        if self.events.send(SessionEvent::new(self.id.clone(), kind)).is_err() {
            tracing::debug!(session_id = %self.id, "Session event dropped (worker stopped)");
        }
    }

    fn transition(&mut self, state: PlayerState) {
        if self.state != state {
            self.state = state;
            self.emit(SessionEventKind::StateChanged(state));
        }
    }
}

impl MediaSession for SimulatedSession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    fn set_domain(&mut self, domain: &str) {
        self.domain = domain.to_string();
    }

    fn start(&mut self) {
        if self.state == PlayerState::Stopped {
            self.emit(SessionEventKind::LengthChanged(self.length_ms));
        }
        self.transition(PlayerState::Playing);
    }

    fn pause(&mut self) {
        if self.state == PlayerState::Playing {
            self.transition(PlayerState::Paused);
        }
    }

    fn stop(&mut self) {
        self.position_ms = 0;
        self.transition(PlayerState::Stopped);
    }

    fn suspend(&mut self) {
        self.suspended = true;
    }

    fn resume(&mut self) {
        self.suspended = false;
    }

    fn seek(&mut self, position_ms: u64) {
        self.position_ms = position_ms.min(self.length_ms);
        self.emit(SessionEventKind::PositionChanged(self.position_ms));
    }

    fn player_state(&self) -> PlayerState {
        self.state
    }

    fn length(&self) -> u64 {
        self.length_ms
    }

    fn position(&self) -> u64 {
        self.position_ms
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
        self.emit(SessionEventKind::VolumeChanged(self.volume));
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.emit(SessionEventKind::MutedChanged(muted));
    }
}
