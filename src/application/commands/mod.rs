//! Commands - 控制面命令
//!
//! 命令由 MediaWorker 在单线程事件循环中执行

mod session_commands;

pub use session_commands::{CreateSessionCommand, SessionAction};
