//! qmediad - 媒体会话与音频仲裁服务
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Session Context: 会话请求、播放器状态、MediaSession 能力接口
//! - Audio Context: 音频接口协议、客户端实例
//!
//! 应用层 (application/):
//! - Ports: MediaEngine, SessionBuilder, AudioState, ContentLicense, StatusPublisher
//! - Arbitration: 会话协商、领域优先级、引擎独占、音频接口仲裁
//! - Commands: 控制面命令
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: 控制面 REST API + 状态 WebSocket
//! - IPC: 音频接口 Unix 套接字
//! - Worker: MediaWorker 单线程事件循环
//! - Adapters: 模拟引擎、音频状态、许可
//! - Events: 状态存储

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
