//! Session Context - Media Session Capability
//!
//! 可播放单元的能力接口，引擎实现、装饰器（MediaAgentSession、DrmSession）
//! 都通过该 trait 组合

use serde::Serialize;
use tokio::sync::mpsc;

use super::{PlayerState, SessionId};

/// 媒体会话
///
/// 位置、时长、状态变化通过 [`SessionEventSender`] 异步上报，
/// getter 只返回最近一次已知的值
pub trait MediaSession: Send {
    fn id(&self) -> &SessionId;

    fn domain(&self) -> &str;
    fn set_domain(&mut self, domain: &str);

    fn start(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);

    /// 暂时释放设备，保留播放位置
    fn suspend(&mut self);
    /// 从 suspend 恢复到挂起前的状态
    fn resume(&mut self);

    fn seek(&mut self, position_ms: u64);

    fn player_state(&self) -> PlayerState;
    fn length(&self) -> u64;
    fn position(&self) -> u64;

    fn volume(&self) -> u8;
    fn set_volume(&mut self, volume: u8);

    fn is_muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);

    /// 拆除一层装饰器，返回被包装的会话；引擎会话返回 None
    fn into_wrapped(self: Box<Self>) -> Option<Box<dyn MediaSession>> {
        None
    }
}

/// 会话事件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEvent {
    pub session_id: SessionId,
    pub kind: SessionEventKind,
}

impl SessionEvent {
    pub fn new(session_id: SessionId, kind: SessionEventKind) -> Self {
        Self { session_id, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum SessionEventKind {
    StateChanged(PlayerState),
    PositionChanged(u64),
    LengthChanged(u64),
    VolumeChanged(u8),
    MutedChanged(bool),
}

/// 引擎会话的事件上报通道
pub type SessionEventSender = mpsc::UnboundedSender<SessionEvent>;
pub type SessionEventReceiver = mpsc::UnboundedReceiver<SessionEvent>;
