//! Status Handlers - 读取状态树

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::application::ports::MEDIA_ROOT;
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::state::AppState;

/// `/Media` 下的完整状态
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(state.status.subtree(MEDIA_ROOT)))
}

/// 指定路径下的状态，路径不存在时返回空对象
pub async fn get_status_path(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Json<ApiResponse<Value>> {
    let path = format!("/{}", path.trim_start_matches('/'));
    Json(ApiResponse::success(state.status.subtree(&path)))
}
