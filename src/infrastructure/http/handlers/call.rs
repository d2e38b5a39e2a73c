//! Call Handler
//!
//! 电话状态来源：进入通话时激活通话领域，挂断时释放

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::{ApiResponse, CallRequest, Empty};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn set_call(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CallRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    tracing::info!(active = req.active, "Call state changed");
    state.media.set_call_active(req.active).await?;
    Ok(Json(ApiResponse::ok()))
}
