//! Session Context - Value Objects

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::SessionError;

/// URI 会话请求类型（由 UriNegotiator 处理）
pub const URI_SESSION_TYPE: &str = "com.trolltech.qtopia.uri";

/// 默认领域
pub const MEDIA_DOMAIN: &str = "Media";

/// 会话唯一标识
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 请求负载
///
/// URI 类型的请求携带 URL，其他类型由对应 builder 自行解释
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPayload {
    Uri(Url),
    Opaque(serde_json::Value),
}

/// 会话请求
///
/// 不变量:
/// - 创建后不可修改
/// - domain 与 request_type 非空
#[derive(Debug, Clone)]
pub struct SessionRequest {
    id: SessionId,
    domain: String,
    request_type: String,
    payload: RequestPayload,
}

impl SessionRequest {
    pub fn new(
        domain: impl Into<String>,
        request_type: impl Into<String>,
        payload: RequestPayload,
    ) -> Result<Self, SessionError> {
        let domain = domain.into();
        let request_type = request_type.into();
        if domain.is_empty() {
            return Err(SessionError::InvalidRequest("domain cannot be empty".into()));
        }
        if request_type.is_empty() {
            return Err(SessionError::InvalidRequest(
                "request type cannot be empty".into(),
            ));
        }
        Ok(Self {
            id: SessionId::new(),
            domain,
            request_type,
            payload,
        })
    }

    /// 创建 URI 会话请求
    pub fn for_url(domain: impl Into<String>, url: &str) -> Result<Self, SessionError> {
        let url = Url::parse(url)
            .map_err(|e| SessionError::InvalidRequest(format!("invalid url {}: {}", url, e)))?;
        Self::new(domain, URI_SESSION_TYPE, RequestPayload::Uri(url))
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn request_type(&self) -> &str {
        &self.request_type
    }

    pub fn payload(&self) -> &RequestPayload {
        &self.payload
    }

    pub fn url(&self) -> Option<&Url> {
        match &self.payload {
            RequestPayload::Uri(url) => Some(url),
            RequestPayload::Opaque(_) => None,
        }
    }
}

/// 播放器状态（由引擎上报）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
    Buffering,
    Error,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::Stopped => "stopped",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Buffering => "buffering",
            PlayerState::Error => "error",
        }
    }

    /// Playing 或 Paused 视为占用引擎
    pub fn is_active(&self) -> bool {
        matches!(self, PlayerState::Playing | PlayerState::Paused)
    }

    /// 会话已终止（正常停止或出错）
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlayerState::Stopped | PlayerState::Error)
    }
}

/// 音量范围 0 - 100
pub fn clamp_volume(volume: i32) -> u8 {
    volume.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_request() {
        let request = SessionRequest::for_url("Media", "file:///music/song.mp3").unwrap();
        assert_eq!(request.request_type(), URI_SESSION_TYPE);
        assert_eq!(request.url().unwrap().scheme(), "file");
        assert_eq!(request.domain(), "Media");
    }

    #[test]
    fn test_request_rejects_empty_domain() {
        assert!(SessionRequest::for_url("", "file:///a.wav").is_err());
        assert!(SessionRequest::for_url("Media", "not a url").is_err());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = SessionRequest::for_url("Media", "file:///a.wav").unwrap();
        let b = SessionRequest::for_url("Media", "file:///a.wav").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_player_state_activity() {
        assert!(PlayerState::Playing.is_active());
        assert!(PlayerState::Paused.is_active());
        assert!(!PlayerState::Buffering.is_active());
        assert!(PlayerState::Error.is_terminal());
    }

    #[test]
    fn test_clamp_volume() {
        assert_eq!(clamp_volume(-5), 0);
        assert_eq!(clamp_volume(55), 55);
        assert_eq!(clamp_volume(300), 100);
    }
}
