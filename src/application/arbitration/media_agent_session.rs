//! Media Agent Session - wrap 模式下的会话装饰器
//!
//! 记录会话所属引擎和“单独挂起”标记。上层调用 suspend/resume 会改变标记；
//! MediaAgent 在切换引擎时通过 [`MediaAgentSession::engine_session_mut`]
//! 直接操作被包装的会话，不影响标记

use crate::domain::session::{MediaSession, PlayerState, SessionId};

pub struct MediaAgentSession {
    inner: Box<dyn MediaSession>,
    engine: String,
    suspended: bool,
}

impl MediaAgentSession {
    pub fn new(inner: Box<dyn MediaSession>, engine: impl Into<String>) -> Self {
        Self {
            inner,
            engine: engine.into(),
            suspended: false,
        }
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// 是否被上层单独挂起
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn engine_session_mut(&mut self) -> &mut dyn MediaSession {
        self.inner.as_mut()
    }

    pub fn into_inner(self) -> Box<dyn MediaSession> {
        self.inner
    }
}

impl MediaSession for MediaAgentSession {
    fn id(&self) -> &SessionId {
        self.inner.id()
    }

    fn domain(&self) -> &str {
        self.inner.domain()
    }

    fn set_domain(&mut self, domain: &str) {
        self.inner.set_domain(domain);
    }

    fn start(&mut self) {
        self.inner.start();
    }

    fn pause(&mut self) {
        self.inner.pause();
    }

    fn stop(&mut self) {
        self.inner.stop();
    }

    fn suspend(&mut self) {
        self.suspended = true;
        self.inner.suspend();
    }

    fn resume(&mut self) {
        self.suspended = false;
        self.inner.resume();
    }

    fn seek(&mut self, position_ms: u64) {
        self.inner.seek(position_ms);
    }

    fn player_state(&self) -> PlayerState {
        self.inner.player_state()
    }

    fn length(&self) -> u64 {
        self.inner.length()
    }

    fn position(&self) -> u64 {
        self.inner.position()
    }

    fn volume(&self) -> u8 {
        self.inner.volume()
    }

    fn set_volume(&mut self, volume: u8) {
        self.inner.set_volume(volume);
    }

    fn is_muted(&self) -> bool {
        self.inner.is_muted()
    }

    fn set_muted(&mut self, muted: bool) {
        self.inner.set_muted(muted);
    }

    fn into_wrapped(self: Box<Self>) -> Option<Box<dyn MediaSession>> {
        Some(self.inner)
    }
}
