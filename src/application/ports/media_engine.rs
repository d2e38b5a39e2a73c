//! Media Engine Port - 媒体引擎插件接口
//!
//! 具体引擎（GStreamer 等）不在本仓库范围内，仅通过该接口接入

use std::sync::Arc;

use serde::Serialize;

use super::SessionBuilder;
use crate::domain::session::SessionEventSender;

/// 引擎信息
#[derive(Debug, Clone, Serialize)]
pub struct EngineInformation {
    pub name: String,
    pub version: String,
    /// 空闲多久后引擎可被卸载（秒）
    pub idle_time_secs: u64,
    /// 引擎无法与其他引擎共享音频设备
    pub exclusive_device_access: bool,
}

/// 引擎初始化上下文
#[derive(Clone)]
pub struct EngineContext {
    /// 会话事件（状态、位置、时长）上报通道
    pub session_events: SessionEventSender,
}

impl EngineContext {
    pub fn new(session_events: SessionEventSender) -> Self {
        Self { session_events }
    }
}

/// Media Engine Port
pub trait MediaEngine: Send {
    fn initialize(&mut self, context: EngineContext);

    /// 挂起整个引擎（释放设备）
    fn suspend(&mut self);

    fn resume(&mut self);

    fn information(&self) -> EngineInformation;

    /// 初始化之后可用的 builder 列表
    fn builders(&self) -> Vec<Arc<dyn SessionBuilder>>;
}
