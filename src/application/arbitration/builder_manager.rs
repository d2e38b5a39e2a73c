//! Builder Manager - 会话 builder 注册表
//!
//! 每个请求类型要么由一个 negotiator 负责，要么维护一个普通 builder 列表。
//! 普通列表采用粘滞策略：最近一次成功的 builder 移到队首

use std::collections::HashMap;
use std::sync::Arc;

use super::negotiator::{BuilderNegotiator, NegotiatedSession};
use crate::application::error::ApplicationError;
use crate::application::ports::SessionBuilder;
use crate::domain::session::{MediaSession, SessionId, SessionRequest};

struct RegisteredBuilder {
    engine: String,
    builder: Arc<dyn SessionBuilder>,
}

/// 会话由谁创建，销毁时原路返回
enum SessionOrigin {
    Negotiator(String),
    Builder(Arc<dyn SessionBuilder>),
}

#[derive(Default)]
pub struct BuilderManager {
    /// request type -> negotiator
    negotiators: HashMap<String, Box<dyn BuilderNegotiator>>,
    /// request type -> builders（队首优先）
    builders: HashMap<String, Vec<RegisteredBuilder>>,
    /// session id -> 创建者
    active: HashMap<SessionId, SessionOrigin>,
}

impl BuilderManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 negotiator，需在 add_builders 之前调用
    pub fn add_negotiator(&mut self, negotiator: Box<dyn BuilderNegotiator>) {
        let negotiator_type = negotiator.negotiator_type().to_string();
        tracing::debug!(request_type = %negotiator_type, "Negotiator registered");
        self.negotiators.insert(negotiator_type, negotiator);
    }

    pub fn add_builders(&mut self, engine: &str, builders: Vec<Arc<dyn SessionBuilder>>) {
        for builder in builders {
            let builder_type = builder.builder_type().to_string();
            match self.negotiators.get_mut(&builder_type) {
                Some(negotiator) => negotiator.add_builder(engine, builder),
                None => {
                    tracing::debug!(
                        engine = %engine,
                        request_type = %builder_type,
                        "Builder registered"
                    );
                    self.builders
                        .entry(builder_type)
                        .or_default()
                        .push(RegisteredBuilder {
                            engine: engine.to_string(),
                            builder,
                        });
                }
            }
        }
    }

    /// 是否有任何 negotiator / builder 能处理该类型
    pub fn supports(&self, request_type: &str) -> bool {
        self.negotiators.contains_key(request_type)
            || self
                .builders
                .get(request_type)
                .map(|list| !list.is_empty())
                .unwrap_or(false)
    }

    pub fn create_session(&mut self, request: &SessionRequest) -> Option<NegotiatedSession> {
        let request_type = request.request_type();

        if let Some(negotiator) = self.negotiators.get_mut(request_type) {
            let negotiated = negotiator.create_session(request)?;
            self.active.insert(
                negotiated.session.id().clone(),
                SessionOrigin::Negotiator(request_type.to_string()),
            );
            return Some(negotiated);
        }

        let list = self.builders.get_mut(request_type)?;
        let (index, session) = list
            .iter()
            .enumerate()
            .find_map(|(i, entry)| entry.builder.create_session(request).map(|s| (i, s)))?;

        if index > 0 {
            let entry = list.remove(index);
            list.insert(0, entry);
        }
        let winner = &list[0];

        self.active.insert(
            session.id().clone(),
            SessionOrigin::Builder(winner.builder.clone()),
        );
        Some(NegotiatedSession {
            session,
            engine: winner.engine.clone(),
        })
    }

    pub fn destroy_session(&mut self, session: Box<dyn MediaSession>) -> Result<(), ApplicationError> {
        let id = session.id().clone();
        match self.active.remove(&id) {
            Some(SessionOrigin::Builder(builder)) => {
                builder.destroy_session(session);
                Ok(())
            }
            Some(SessionOrigin::Negotiator(request_type)) => self
                .negotiators
                .get_mut(&request_type)
                .ok_or_else(|| ApplicationError::not_found("Negotiator", &request_type))?
                .destroy_session(session),
            None => {
                tracing::error!(session_id = %id, "Destroying session with unknown origin");
                Err(ApplicationError::not_found("Session origin", &id))
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as Map;

    use super::*;
    use crate::application::arbitration::testing::{Journal, MockBuilder};
    use crate::application::arbitration::UriNegotiator;
    use crate::domain::session::RequestPayload;

    fn typed_request(request_type: &str) -> SessionRequest {
        SessionRequest::new("Media", request_type, RequestPayload::Opaque(serde_json::Value::Null))
            .unwrap()
    }

    #[test]
    fn test_sticky_affinity_reorders_builders() {
        let journal = Journal::default();
        let first = Arc::new(MockBuilder::typed(journal.clone(), "b0", "X").refusing());
        let second = Arc::new(MockBuilder::typed(journal.clone(), "b1", "X"));

        let mut manager = BuilderManager::new();
        manager.add_builders("e0", vec![first.clone()]);
        manager.add_builders("e1", vec![second.clone()]);

        let negotiated = manager.create_session(&typed_request("X")).unwrap();
        assert_eq!(negotiated.engine, "e1");
        assert_eq!(journal.entries(), vec!["refuse:b0", "create:b1"]);

        journal.clear();
        let negotiated = manager.create_session(&typed_request("X")).unwrap();
        assert_eq!(negotiated.engine, "e1");
        // b1 已移到队首，不再先尝试 b0
        assert_eq!(journal.entries(), vec!["create:b1"]);
    }

    #[test]
    fn test_no_builder_for_type() {
        let mut manager = BuilderManager::new();
        assert!(!manager.supports("X"));
        assert!(manager.create_session(&typed_request("X")).is_none());
    }

    #[test]
    fn test_all_builders_refuse() {
        let journal = Journal::default();
        let mut manager = BuilderManager::new();
        manager.add_builders(
            "e0",
            vec![Arc::new(MockBuilder::typed(journal.clone(), "b0", "X").refusing())],
        );
        assert!(manager.supports("X"));
        assert!(manager.create_session(&typed_request("X")).is_none());
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn test_destroy_routes_to_creating_builder() {
        let journal = Journal::default();
        let a = Arc::new(MockBuilder::typed(journal.clone(), "a", "X"));
        let b = Arc::new(MockBuilder::typed(journal.clone(), "b", "Y"));
        let mut manager = BuilderManager::new();
        manager.add_builders("e", vec![a.clone(), b.clone()]);

        let negotiated = manager.create_session(&typed_request("Y")).unwrap();
        manager.destroy_session(negotiated.session).unwrap();
        assert_eq!(a.destroyed(), 0);
        assert_eq!(b.destroyed(), 1);
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn test_destroy_untracked_session_is_error() {
        let journal = Journal::default();
        let stray = MockBuilder::typed(journal.clone(), "stray", "X");
        let session = stray.create_session(&typed_request("X")).unwrap();

        let mut manager = BuilderManager::new();
        assert!(manager.destroy_session(session).is_err());
    }

    #[test]
    fn test_negotiator_owns_its_type() {
        let journal = Journal::default();
        let uri = Arc::new(MockBuilder::uri(journal.clone(), "gst", &["file"], &[]));

        let mut manager = BuilderManager::new();
        manager.add_negotiator(Box::new(UriNegotiator::new(Map::new())));
        manager.add_builders("gst", vec![uri.clone()]);

        let request = SessionRequest::for_url("Media", "file:///a.ogg").unwrap();
        let negotiated = manager.create_session(&request).unwrap();
        assert_eq!(negotiated.engine, "gst");

        manager.destroy_session(negotiated.session).unwrap();
        assert_eq!(uri.destroyed(), 1);
    }
}
