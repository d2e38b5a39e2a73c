//! URI Negotiator - 按 URI scheme / MIME 类型选择 builder
//!
//! 候选 builder 按引擎优先级（数字越小越优先）放在有序多重映射中，
//! 依次过滤 scheme 和 MIME 类型，第一个成功创建会话的 builder 胜出

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::drm_session::{DrmSession, DRM_SCHEME};
use super::negotiator::{BuilderNegotiator, NegotiatedSession};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ContentLicensePort, SessionBuilder, MIME_TYPES_ATTRIBUTE, URI_SCHEMES_ATTRIBUTE,
};
use crate::domain::session::{MediaSession, SessionId, SessionRequest, URI_SESSION_TYPE};

/// 无法推断 MIME 类型时的哨兵值，不参与过滤
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// 未配置优先级的引擎排在最后
const UNRANKED_PRIORITY: i32 = i32::MAX;

struct Candidate {
    engine: String,
    builder: Arc<dyn SessionBuilder>,
}

struct ActiveSession {
    builder: Arc<dyn SessionBuilder>,
    drm: bool,
}

pub struct UriNegotiator {
    engine_priorities: HashMap<String, i32>,
    candidates: BTreeMap<i32, Vec<Candidate>>,
    license: Option<Arc<dyn ContentLicensePort>>,
    active: HashMap<SessionId, ActiveSession>,
}

impl UriNegotiator {
    pub fn new(engine_priorities: HashMap<String, i32>) -> Self {
        Self {
            engine_priorities,
            candidates: BTreeMap::new(),
            license: None,
            active: HashMap::new(),
        }
    }

    /// 设置 DRM 授权后端，未设置时 `qtopia://` 内容不做包装
    pub fn with_license(mut self, license: Arc<dyn ContentLicensePort>) -> Self {
        self.license = Some(license);
        self
    }

    fn priority_of(&self, engine: &str) -> i32 {
        self.engine_priorities
            .get(engine)
            .copied()
            .unwrap_or(UNRANKED_PRIORITY)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// 从 URL 路径推断 MIME 类型
pub fn guess_mime_type(path: &str) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(UNKNOWN_MIME_TYPE)
        .to_string()
}

/// 支持 `audio/*` 形式的通配
fn mime_matches(supported: &[String], mime: &str) -> bool {
    supported.iter().any(|s| {
        if let Some(prefix) = s.strip_suffix("/*") {
            mime.split('/').next() == Some(prefix)
        } else {
            s.eq_ignore_ascii_case(mime)
        }
    })
}

impl BuilderNegotiator for UriNegotiator {
    fn negotiator_type(&self) -> &str {
        URI_SESSION_TYPE
    }

    fn add_builder(&mut self, engine: &str, builder: Arc<dyn SessionBuilder>) {
        let priority = self.priority_of(engine);
        tracing::debug!(engine = %engine, priority = priority, "URI builder registered");
        self.candidates.entry(priority).or_default().push(Candidate {
            engine: engine.to_string(),
            builder,
        });
    }

    fn create_session(&mut self, request: &SessionRequest) -> Option<NegotiatedSession> {
        let url = match request.url() {
            Some(url) => url.clone(),
            None => {
                tracing::warn!(session_id = %request.id(), "URI request without url");
                return None;
            }
        };

        let scheme = url.scheme().to_string();
        let mime = guess_mime_type(url.path());
        let filter_mime = mime != UNKNOWN_MIME_TYPE;

        let selected = self
            .candidates
            .values()
            .flatten()
            .filter(|c| c.builder.attributes().contains(URI_SCHEMES_ATTRIBUTE, &scheme))
            .filter(|c| {
                !filter_mime || mime_matches(c.builder.attributes().get(MIME_TYPES_ATTRIBUTE), &mime)
            })
            .find_map(|c| {
                c.builder
                    .create_session(request)
                    .map(|session| (session, c.engine.clone(), c.builder.clone()))
            });

        let (session, engine, builder) = match selected {
            Some(found) => found,
            None => {
                tracing::info!(
                    session_id = %request.id(),
                    scheme = %scheme,
                    mime = %mime,
                    "No URI builder accepted request"
                );
                return None;
            }
        };

        let (session, drm) = match (scheme.as_str(), self.license.as_ref()) {
            (DRM_SCHEME, Some(license)) => {
                let wrapped: Box<dyn MediaSession> =
                    Box::new(DrmSession::new(session, url, license.clone()));
                (wrapped, true)
            }
            _ => (session, false),
        };

        tracing::debug!(
            session_id = %request.id(),
            engine = %engine,
            mime = %mime,
            drm = drm,
            "URI session negotiated"
        );
        self.active
            .insert(session.id().clone(), ActiveSession { builder, drm });

        Some(NegotiatedSession { session, engine })
    }

    fn destroy_session(&mut self, session: Box<dyn MediaSession>) -> Result<(), ApplicationError> {
        let id = session.id().clone();
        let entry = self
            .active
            .remove(&id)
            .ok_or_else(|| ApplicationError::not_found("Negotiated session", &id))?;

        let session = if entry.drm {
            session
                .into_wrapped()
                .ok_or_else(|| ApplicationError::internal(format!("DRM wrapper lost: {}", id)))?
        } else {
            session
        };
        entry.builder.destroy_session(session);
        Ok(())
    }
}
