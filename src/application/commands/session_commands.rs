//! Session Commands - 会话相关命令

use crate::application::error::ApplicationError;
use crate::domain::session::{
    clamp_volume, RequestPayload, SessionRequest, URI_SESSION_TYPE,
};

/// 创建会话命令
#[derive(Debug, Clone)]
pub struct CreateSessionCommand {
    pub domain: String,
    /// 缺省为 URI 会话
    pub request_type: Option<String>,
    pub url: String,
}

impl CreateSessionCommand {
    pub fn new(domain: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            request_type: None,
            url: url.into(),
        }
    }

    /// 转换为不可变的会话请求
    pub fn into_request(self) -> Result<SessionRequest, ApplicationError> {
        let request = match self.request_type.as_deref() {
            None | Some(URI_SESSION_TYPE) => SessionRequest::for_url(self.domain, &self.url)?,
            Some(other) => SessionRequest::new(
                self.domain,
                other,
                RequestPayload::Opaque(serde_json::Value::String(self.url)),
            )?,
        };
        Ok(request)
    }
}

/// 会话控制动作
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    Start,
    Pause,
    Stop,
    Suspend,
    Resume,
    Seek(u64),
    SetVolume(u8),
    SetMuted(bool),
    SetDomain(String),
}

impl SessionAction {
    pub fn volume(volume: i32) -> Self {
        SessionAction::SetVolume(clamp_volume(volume))
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::Start => "start",
            SessionAction::Pause => "pause",
            SessionAction::Stop => "stop",
            SessionAction::Suspend => "suspend",
            SessionAction::Resume => "resume",
            SessionAction::Seek(_) => "seek",
            SessionAction::SetVolume(_) => "set_volume",
            SessionAction::SetMuted(_) => "set_muted",
            SessionAction::SetDomain(_) => "set_domain",
        }
    }
}
