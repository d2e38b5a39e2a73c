//! Application State
//!
//! HTTP 层只持有两个端口：媒体服务句柄与状态存储

use std::sync::Arc;

use crate::application::MediaServerPort;
use crate::infrastructure::events::StatusStore;

/// 应用状态
pub struct AppState {
    pub media: Arc<dyn MediaServerPort>,
    pub status: Arc<StatusStore>,
}

impl AppState {
    pub fn new(media: Arc<dyn MediaServerPort>, status: Arc<StatusStore>) -> Self {
        Self { media, status }
    }
}
