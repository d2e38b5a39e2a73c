//! Worker Layer - 媒体服务事件循环
//!
//! MediaWorker 持有全部仲裁状态；MediaServerHandle 是它的异步入口

mod handle;
mod media_worker;

pub use handle::MediaServerHandle;
pub use media_worker::{MediaWorker, MediaWorkerConfig, ServerCommand};
