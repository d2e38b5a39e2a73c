//! 仲裁层单元测试用的替身实现

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use url::Url;

use crate::application::ports::{
    AudioStatePort, BuilderAttributes, ContentLicensePort, EngineContext, EngineInformation,
    MediaEngine, SessionBuilder, StatusPublisherPort, MIME_TYPES_ATTRIBUTE,
    URI_SCHEMES_ATTRIBUTE,
};
use crate::domain::session::{
    MediaSession, PlayerState, SessionId, SessionRequest, URI_SESSION_TYPE,
};

/// 按调用顺序记录的操作日志
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().unwrap().iter().any(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

pub struct MockSession {
    id: SessionId,
    domain: String,
    state: PlayerState,
    volume: u8,
    muted: bool,
    position: u64,
    journal: Journal,
}

impl MockSession {
    pub fn new(id: SessionId, domain: &str, journal: Journal) -> Self {
        Self {
            id,
            domain: domain.to_string(),
            state: PlayerState::Stopped,
            volume: 100,
            muted: false,
            position: 0,
            journal,
        }
    }
}

impl MediaSession for MockSession {
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
        self.journal.push(format!("start:{}", self.id));
        self.state = PlayerState::Playing;
    }

    fn pause(&mut self) {
        self.journal.push(format!("pause:{}", self.id));
        self.state = PlayerState::Paused;
    }

    fn stop(&mut self) {
        self.journal.push(format!("stop:{}", self.id));
        self.state = PlayerState::Stopped;
    }

    fn suspend(&mut self) {
        self.journal.push(format!("suspend:{}", self.id));
    }

    fn resume(&mut self) {
        self.journal.push(format!("resume:{}", self.id));
    }

    fn seek(&mut self, position_ms: u64) {
        self.position = position_ms;
    }

    fn player_state(&self) -> PlayerState {
        self.state
    }

    fn length(&self) -> u64 {
        0
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

pub struct MockBuilder {
    name: String,
    builder_type: String,
    attributes: BuilderAttributes,
    accept: bool,
    journal: Journal,
    created: AtomicUsize,
    destroyed: AtomicUsize,
}

impl MockBuilder {
    pub fn typed(journal: Journal, name: &str, builder_type: &str) -> Self {
        Self {
            name: name.to_string(),
            builder_type: builder_type.to_string(),
            attributes: BuilderAttributes::new(),
            accept: true,
            journal,
            created: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
        }
    }

    pub fn uri(journal: Journal, name: &str, schemes: &[&str], mimes: &[&str]) -> Self {
        let mut builder = Self::typed(journal, name, URI_SESSION_TYPE);
        builder.attributes = BuilderAttributes::new()
            .with(URI_SCHEMES_ATTRIBUTE, schemes.iter().map(|s| s.to_string()).collect())
            .with(MIME_TYPES_ATTRIBUTE, mimes.iter().map(|s| s.to_string()).collect());
        builder
    }

    pub fn refusing(mut self) -> Self {
        self.accept = false;
        self
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl SessionBuilder for MockBuilder {
    fn builder_type(&self) -> &str {
        &self.builder_type
    }

    fn attributes(&self) -> &BuilderAttributes {
        &self.attributes
    }

    fn create_session(&self, request: &SessionRequest) -> Option<Box<dyn MediaSession>> {
        if !self.accept {
            self.journal.push(format!("refuse:{}", self.name));
            return None;
        }
        self.journal.push(format!("create:{}", self.name));
        self.created.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(MockSession::new(
            request.id().clone(),
            request.domain(),
            self.journal.clone(),
        )))
    }

    fn destroy_session(&self, session: Box<dyn MediaSession>) {
        self.journal.push(format!("destroy:{}:{}", self.name, session.id()));
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockEngine {
    name: String,
    exclusive: bool,
    builders: Vec<Arc<MockBuilder>>,
    journal: Journal,
}

impl MockEngine {
    /// 引擎带一个 builder，请求类型与引擎同名，便于把请求定向到指定引擎
    pub fn new(journal: Journal, name: &str, exclusive: bool) -> Self {
        let builder = Arc::new(MockBuilder::typed(journal.clone(), name, name));
        Self {
            name: name.to_string(),
            exclusive,
            builders: vec![builder],
            journal,
        }
    }
}

impl MediaEngine for MockEngine {
    fn initialize(&mut self, _context: EngineContext) {
        self.journal.push(format!("init:{}", self.name));
    }

    fn suspend(&mut self) {
        self.journal.push(format!("engine-suspend:{}", self.name));
    }

    fn resume(&mut self) {
        self.journal.push(format!("engine-resume:{}", self.name));
    }

    fn information(&self) -> EngineInformation {
        EngineInformation {
            name: self.name.clone(),
            version: "1.0".to_string(),
            idle_time_secs: 0,
            exclusive_device_access: self.exclusive,
        }
    }

    fn builders(&self) -> Vec<Arc<dyn SessionBuilder>> {
        self.builders
            .iter()
            .map(|b| b.clone() as Arc<dyn SessionBuilder>)
            .collect()
    }
}

/// 请求定向到与类型同名的 MockEngine
pub fn engine_request(engine: &str, domain: &str) -> SessionRequest {
    SessionRequest::new(
        domain,
        engine,
        crate::domain::session::RequestPayload::Opaque(Value::Null),
    )
    .unwrap()
}

/// 音频状态后端替身，拒绝 `rejected` 中的领域
#[derive(Default)]
pub struct MockAudioState {
    rejected: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockAudioState {
    pub fn reject(&self, domain: &str) {
        self.rejected.lock().unwrap().insert(domain.to_string());
    }

    pub fn allow(&self, domain: &str) {
        self.rejected.lock().unwrap().remove(domain);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AudioStatePort for MockAudioState {
    fn set_domain(&self, domain: &str) -> bool {
        self.calls.lock().unwrap().push(domain.to_string());
        !self.rejected.lock().unwrap().contains(domain)
    }
}

pub struct MockLicense {
    allow: bool,
    active: AtomicI32,
}

impl MockLicense {
    pub fn new(allow: bool) -> Self {
        Self {
            allow,
            active: AtomicI32::new(0),
        }
    }

    pub fn active(&self) -> i32 {
        self.active.load(Ordering::SeqCst)
    }
}

impl ContentLicensePort for MockLicense {
    fn begin_playback(&self, _url: &Url) -> bool {
        if self.allow {
            self.active.fetch_add(1, Ordering::SeqCst);
        }
        self.allow
    }

    fn end_playback(&self, _url: &Url) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// 记录所有写入的状态存储
#[derive(Default)]
pub struct RecordingStatus {
    values: Mutex<HashMap<String, Value>>,
}

impl RecordingStatus {
    pub fn get(&self, path: &str) -> Option<Value> {
        self.values.lock().unwrap().get(path).cloned()
    }
}

impl StatusPublisherPort for RecordingStatus {
    fn set_attribute(&self, path: &str, value: Value) {
        self.values.lock().unwrap().insert(path.to_string(), value);
    }

    fn remove_attribute(&self, path: &str) {
        let prefix = format!("{}/", path);
        self.values
            .lock()
            .unwrap()
            .retain(|k, _| k != path && !k.starts_with(&prefix));
    }
}
