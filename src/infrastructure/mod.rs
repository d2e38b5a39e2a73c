//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现以及对外的接入面（HTTP、音频套接字）

pub mod adapters;
pub mod events;
pub mod http;
pub mod ipc;
pub mod worker;

pub use events::{StatusChange, StatusStore};
pub use ipc::{AudioSocketEvent, AudioSocketListener};
pub use worker::{MediaServerHandle, MediaWorker, MediaWorkerConfig};
