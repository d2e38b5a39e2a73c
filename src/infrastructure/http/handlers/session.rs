//! Session Handlers
//!
//! 每个 handler 把请求转换为 SessionAction 交给 MediaWorker

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{CreateSessionCommand, SessionAction};
use crate::domain::session::SessionId;
use crate::infrastructure::http::dto::{
    ApiResponse, CreateSessionRequest, CreateSessionResponse, DomainRequest, Empty, MuteRequest,
    SeekRequest, SessionIdRequest, SessionResponse, VolumeRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

type EmptyResult = Result<Json<ApiResponse<Empty>>, ApiError>;

async fn control(state: &AppState, id: SessionId, action: SessionAction) -> EmptyResult {
    state.media.control_session(id, action).await?;
    Ok(Json(ApiResponse::ok()))
}

// ============================================================================
// Create / Destroy
// ============================================================================

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<ApiResponse<CreateSessionResponse>>, ApiError> {
    let cmd = CreateSessionCommand {
        domain: req.domain,
        request_type: req.request_type,
        url: req.url,
    };

    let session_id = state.media.create_session(cmd).await?;
    Ok(Json(ApiResponse::success(CreateSessionResponse { session_id })))
}

pub async fn destroy_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> EmptyResult {
    state.media.destroy_session(req.session_id).await?;
    Ok(Json(ApiResponse::ok()))
}

// ============================================================================
// Playback control
// ============================================================================

pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> EmptyResult {
    control(&state, req.session_id, SessionAction::Start).await
}

pub async fn pause_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> EmptyResult {
    control(&state, req.session_id, SessionAction::Pause).await
}

pub async fn stop_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> EmptyResult {
    control(&state, req.session_id, SessionAction::Stop).await
}

pub async fn suspend_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> EmptyResult {
    control(&state, req.session_id, SessionAction::Suspend).await
}

pub async fn resume_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> EmptyResult {
    control(&state, req.session_id, SessionAction::Resume).await
}

pub async fn seek(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeekRequest>,
) -> EmptyResult {
    control(&state, req.session_id, SessionAction::Seek(req.position_ms)).await
}

pub async fn set_volume(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VolumeRequest>,
) -> EmptyResult {
    control(&state, req.session_id, SessionAction::volume(req.volume)).await
}

pub async fn set_muted(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MuteRequest>,
) -> EmptyResult {
    control(&state, req.session_id, SessionAction::SetMuted(req.muted)).await
}

pub async fn set_domain(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DomainRequest>,
) -> EmptyResult {
    control(&state, req.session_id, SessionAction::SetDomain(req.domain)).await
}

// ============================================================================
// Queries
// ============================================================================

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    let info = state.media.session_info(req.session_id).await?;
    Ok(Json(ApiResponse::success(info.into())))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<SessionResponse>>>, ApiError> {
    let sessions = state.media.list_sessions().await?;
    Ok(Json(ApiResponse::success(
        sessions.into_iter().map(SessionResponse::from).collect(),
    )))
}
