//! Session Builder Port - 引擎提供的会话工厂
//!
//! builder 由注册它的引擎持有，仲裁层只借用（Arc），从不销毁

use std::collections::HashMap;

use crate::domain::session::{MediaSession, SessionRequest};

/// builder 属性键：支持的 MIME 类型
pub const MIME_TYPES_ATTRIBUTE: &str = "mimeTypes";

/// builder 属性键：支持的 URI scheme
pub const URI_SCHEMES_ATTRIBUTE: &str = "uriSchemes";

/// builder 属性表（键 -> 值列表）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuilderAttributes(HashMap<String, Vec<String>>);

impl BuilderAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.0.insert(key.into(), values);
        self
    }

    pub fn get(&self, key: &str) -> &[String] {
        self.0.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.get(key).iter().any(|v| v.eq_ignore_ascii_case(value))
    }
}

/// Session Builder Port
pub trait SessionBuilder: Send + Sync {
    /// 请求类型标签，用于选择 negotiator 或 builder 列表
    fn builder_type(&self) -> &str;

    fn attributes(&self) -> &BuilderAttributes;

    /// 无法处理该请求时返回 None
    fn create_session(&self, request: &SessionRequest) -> Option<Box<dyn MediaSession>>;

    /// 归还由本 builder 创建的会话
    fn destroy_session(&self, session: Box<dyn MediaSession>);
}
