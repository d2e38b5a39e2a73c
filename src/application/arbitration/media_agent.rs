//! Media Agent - 引擎管理与独占设备协调
//!
//! 加载所有引擎并注册其 builder。当超过一个引擎声明独占设备访问时进入
//! wrap 模式：每个会话都包装为 MediaAgentSession，同一时刻只允许一个独占
//! 引擎处于活动状态，同引擎的会话可以共存

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use super::builder_manager::BuilderManager;
use super::media_agent_session::MediaAgentSession;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    media_path, EngineContext, EngineInformation, MediaEngine, StatusPublisherPort,
};
use crate::domain::session::{MediaSession, SessionId, SessionRequest};

struct LoadedEngine {
    engine: Box<dyn MediaEngine>,
    info: EngineInformation,
}

/// 非 wrap 模式直接持有引擎会话，wrap 模式持有装饰器
enum AgentSession {
    Direct(Box<dyn MediaSession>),
    Managed(MediaAgentSession),
}

impl AgentSession {
    fn session(&self) -> &dyn MediaSession {
        match self {
            AgentSession::Direct(s) => s.as_ref(),
            AgentSession::Managed(s) => s,
        }
    }

    fn session_mut(&mut self) -> &mut dyn MediaSession {
        match self {
            AgentSession::Direct(s) => s.as_mut(),
            AgentSession::Managed(s) => s,
        }
    }

    /// 绕过装饰器的挂起标记
    fn engine_session_mut(&mut self) -> &mut dyn MediaSession {
        match self {
            AgentSession::Direct(s) => s.as_mut(),
            AgentSession::Managed(s) => s.engine_session_mut(),
        }
    }

    fn is_suspended(&self) -> bool {
        match self {
            AgentSession::Direct(_) => false,
            AgentSession::Managed(s) => s.is_suspended(),
        }
    }

    fn into_engine_session(self) -> Box<dyn MediaSession> {
        match self {
            AgentSession::Direct(s) => s,
            AgentSession::Managed(s) => s.into_inner(),
        }
    }
}

struct AgentEntry {
    id: SessionId,
    engine: String,
    session: AgentSession,
}

pub struct MediaAgent {
    engines: Vec<LoadedEngine>,
    builders: BuilderManager,
    /// 按创建顺序
    sessions: Vec<AgentEntry>,
    wrap: bool,
    active_engine: Option<String>,
    initialized: bool,
    status: Arc<dyn StatusPublisherPort>,
}

impl MediaAgent {
    pub fn new(builders: BuilderManager, status: Arc<dyn StatusPublisherPort>) -> Self {
        Self {
            engines: Vec::new(),
            builders,
            sessions: Vec::new(),
            wrap: false,
            active_engine: None,
            initialized: false,
            status,
        }
    }

    /// 加载引擎，只在第一次调用时生效
    pub fn initialize(&mut self, engines: Vec<Box<dyn MediaEngine>>, context: EngineContext) {
        if self.initialized {
            tracing::warn!("MediaAgent already initialized, ignoring engines");
            return;
        }
        self.initialized = true;

        for mut engine in engines {
            engine.initialize(context.clone());
            let info = engine.information();
            self.builders.add_builders(&info.name, engine.builders());

            self.status.set_attribute(
                &media_path(&["Engines", &info.name, "Version"]),
                json!(info.version),
            );
            self.status.set_attribute(
                &media_path(&["Engines", &info.name, "IdleTime"]),
                json!(info.idle_time_secs),
            );
            self.status.set_attribute(
                &media_path(&["Engines", &info.name, "ExclusiveDeviceAccess"]),
                json!(info.exclusive_device_access),
            );
            tracing::info!(
                engine = %info.name,
                version = %info.version,
                exclusive = info.exclusive_device_access,
                "Media engine loaded"
            );
            self.engines.push(LoadedEngine { engine, info });
        }

        let exclusive = self
            .engines
            .iter()
            .filter(|e| e.info.exclusive_device_access)
            .count();
        self.wrap = exclusive > 1;
        if self.wrap {
            tracing::info!(exclusive_engines = exclusive, "Session wrapping enabled");
        }
    }

    pub fn is_wrapping(&self) -> bool {
        self.wrap
    }

    pub fn active_engine(&self) -> Option<&str> {
        self.active_engine.as_deref()
    }

    pub fn engines(&self) -> Vec<EngineInformation> {
        self.engines.iter().map(|e| e.info.clone()).collect()
    }

    /// 创建会话，返回所属引擎名；没有 builder 接受时返回 None
    pub fn create_session(&mut self, request: &SessionRequest) -> Option<String> {
        let negotiated = self.builders.create_session(request)?;
        let id = negotiated.session.id().clone();
        let engine = negotiated.engine;

        let session = if self.wrap {
            AgentSession::Managed(MediaAgentSession::new(negotiated.session, engine.clone()))
        } else {
            AgentSession::Direct(negotiated.session)
        };

        self.status.set_attribute(
            &media_path(&["Sessions", id.as_str(), "Engine"]),
            json!(engine),
        );
        tracing::debug!(session_id = %id, engine = %engine, "Agent session created");

        self.sessions.push(AgentEntry {
            id,
            engine: engine.clone(),
            session,
        });
        Some(engine)
    }

    /// 先拆除装饰器，再把引擎会话交还 builder
    pub fn destroy_session(&mut self, id: &SessionId) -> Result<(), ApplicationError> {
        let index = self.index_of(id)?;
        let entry = self.sessions.remove(index);
        let session = entry.session.into_engine_session();
        let result = self.builders.destroy_session(session);

        self.update_sessions();
        result
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.iter().any(|e| &e.id == id)
    }

    pub fn session(&self, id: &SessionId) -> Option<&dyn MediaSession> {
        self.sessions
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.session.session())
    }

    pub fn session_mut(&mut self, id: &SessionId) -> Result<&mut dyn MediaSession, ApplicationError> {
        let index = self.index_of(id)?;
        Ok(self.sessions[index].session.session_mut())
    }

    pub fn engine_of(&self, id: &SessionId) -> Option<&str> {
        self.sessions
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.engine.as_str())
    }

    pub fn start(&mut self, id: &SessionId) -> Result<(), ApplicationError> {
        let index = self.index_of(id)?;
        if matches!(self.sessions[index].session, AgentSession::Managed(_)) {
            self.session_starting(index);
        } else {
            self.sessions[index].session.session_mut().start();
        }
        Ok(())
    }

    /// 上层挂起（wrap 模式下记录单独挂起标记）
    pub fn suspend(&mut self, id: &SessionId) -> Result<(), ApplicationError> {
        self.session_mut(id)?.suspend();
        Ok(())
    }

    pub fn resume(&mut self, id: &SessionId) -> Result<(), ApplicationError> {
        self.session_mut(id)?.resume();
        Ok(())
    }

    /// 会话即将开始：挂起其他引擎的会话，激活本会话的引擎，
    /// 再恢复同引擎且未被单独挂起的会话
    fn session_starting(&mut self, index: usize) {
        let engine = self.sessions[index].engine.clone();
        tracing::debug!(
            session_id = %self.sessions[index].id,
            engine = %engine,
            "Wrapped session starting"
        );

        for (i, entry) in self.sessions.iter_mut().enumerate() {
            if i != index && entry.engine != engine {
                entry.session.engine_session_mut().suspend();
            }
        }

        self.activate_engine(&engine);
        self.sessions[index].session.engine_session_mut().start();

        for (i, entry) in self.sessions.iter_mut().enumerate() {
            if i != index && entry.engine == engine && !entry.session.is_suspended() {
                entry.session.engine_session_mut().resume();
            }
        }
    }

    /// 按当前会话状态重新计算活动引擎（电平触发，可重复调用）
    pub fn update_sessions(&mut self) {
        if !self.wrap {
            return;
        }

        let mut not_suspended: HashMap<&str, usize> = HashMap::new();
        let mut active: HashMap<&str, usize> = HashMap::new();
        for entry in &self.sessions {
            if !entry.session.is_suspended() {
                *not_suspended.entry(entry.engine.as_str()).or_insert(0) += 1;
            }
            if entry.session.session().player_state().is_active() {
                *active.entry(entry.engine.as_str()).or_insert(0) += 1;
            }
        }

        let current = self.active_engine.as_deref();
        let current_not_suspended = current
            .and_then(|e| not_suspended.get(e).copied())
            .unwrap_or(0);
        let current_active = current.and_then(|e| active.get(e).copied()).unwrap_or(0);
        let any_active = active.values().any(|n| *n > 0);

        if current.is_some() && current_not_suspended > 0 && !(current_active == 0 && any_active) {
            return;
        }

        // 优先选择有活动会话的引擎
        let candidate = self
            .engines
            .iter()
            .map(|e| e.info.name.as_str())
            .find(|name| active.get(name).copied().unwrap_or(0) > 0)
            .or_else(|| {
                self.engines
                    .iter()
                    .map(|e| e.info.name.as_str())
                    .find(|name| not_suspended.get(name).copied().unwrap_or(0) > 0)
            })
            .map(|name| name.to_string());

        let candidate = match candidate {
            Some(c) if Some(c.as_str()) != current => c,
            _ => return,
        };

        tracing::info!(
            from = ?self.active_engine,
            to = %candidate,
            "Switching active engine"
        );

        for entry in self.sessions.iter_mut() {
            entry.session.engine_session_mut().suspend();
        }
        self.activate_engine(&candidate);
        for entry in self.sessions.iter_mut() {
            if entry.engine == candidate && !entry.session.is_suspended() {
                entry.session.engine_session_mut().resume();
            }
        }
    }

    fn activate_engine(&mut self, name: &str) {
        if self.active_engine.as_deref() == Some(name) {
            return;
        }

        if let Some(previous) = self.active_engine.take() {
            if let Some(loaded) = self.engines.iter_mut().find(|e| e.info.name == previous) {
                loaded.engine.suspend();
                tracing::debug!(engine = %previous, "Engine suspended");
            }
        }
        if let Some(loaded) = self.engines.iter_mut().find(|e| e.info.name == name) {
            loaded.engine.resume();
        }

        self.active_engine = Some(name.to_string());
        self.status
            .set_attribute(&media_path(&["Engines", "Active"]), json!(name));
    }

    fn index_of(&self, id: &SessionId) -> Result<usize, ApplicationError> {
        self.sessions
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| ApplicationError::not_found("Session", id))
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|e| e.id.clone()).collect()
    }
}
