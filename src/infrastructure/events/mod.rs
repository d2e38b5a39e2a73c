//! Events - 状态存储与变化广播

mod status_store;

pub use status_store::{StatusChange, StatusStore};
