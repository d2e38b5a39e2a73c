//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping               GET   健康检查
//! - /api/status             GET   `/Media` 状态树
//! - /api/status/*path       GET   指定路径下的状态
//! - /api/session/create     POST  创建会话
//! - /api/session/start      POST  启动（需要领域仲裁）
//! - /api/session/pause      POST  暂停
//! - /api/session/stop       POST  停止
//! - /api/session/suspend    POST  挂起
//! - /api/session/resume     POST  恢复
//! - /api/session/destroy    POST  销毁会话
//! - /api/session/seek       POST  跳转位置
//! - /api/session/volume     POST  设置音量
//! - /api/session/mute       POST  静音
//! - /api/session/domain     POST  修改会话领域
//! - /api/session/get        POST  会话详情
//! - /api/session/list       GET   列出所有会话
//! - /api/call               POST  通话开始 / 结束
//! - /ws/status              WS    状态变更流

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/status", get(handlers::status_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/status", get(handlers::get_status))
        .route("/status/*path", get(handlers::get_status_path))
        .nest("/session", session_routes())
        .route("/call", post(handlers::set_call))
}

/// Session 路由
fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_session))
        .route("/start", post(handlers::start_session))
        .route("/pause", post(handlers::pause_session))
        .route("/stop", post(handlers::stop_session))
        .route("/suspend", post(handlers::suspend_session))
        .route("/resume", post(handlers::resume_session))
        .route("/destroy", post(handlers::destroy_session))
        .route("/seek", post(handlers::seek))
        .route("/volume", post(handlers::set_volume))
        .route("/mute", post(handlers::set_muted))
        .route("/domain", post(handlers::set_domain))
        .route("/get", post(handlers::get_session))
        .route("/list", get(handlers::list_sessions))
}
