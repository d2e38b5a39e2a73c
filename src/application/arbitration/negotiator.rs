//! Builder Negotiator - 同类型 builder 之间的协商
//!
//! 某个请求类型注册了 negotiator 时，BuilderManager 把该类型的 builder
//! 与会话创建完全交给它

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::SessionBuilder;
use crate::domain::session::{MediaSession, SessionRequest};

/// 协商结果：会话与创建它的引擎名
pub struct NegotiatedSession {
    pub session: Box<dyn MediaSession>,
    pub engine: String,
}

impl std::fmt::Debug for NegotiatedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NegotiatedSession")
            .field("session", self.session.id())
            .field("engine", &self.engine)
            .finish()
    }
}

pub trait BuilderNegotiator: Send {
    /// 负责的请求类型
    fn negotiator_type(&self) -> &str;

    fn add_builder(&mut self, engine: &str, builder: Arc<dyn SessionBuilder>);

    fn create_session(&mut self, request: &SessionRequest) -> Option<NegotiatedSession>;

    /// 归还会话给创建它的 builder；不是本 negotiator 创建的会话返回错误
    fn destroy_session(&mut self, session: Box<dyn MediaSession>) -> Result<(), ApplicationError>;
}
