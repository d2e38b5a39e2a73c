//! Arbitration - 会话、领域与音频设备仲裁
//!
//! 组件（自底向上）:
//! - BuilderManager / UriNegotiator: 请求到 builder 的路由
//! - DomainManager / CallMonitor: 领域优先级仲裁
//! - MediaAgent: 引擎独占访问协调
//! - SessionManager: 会话门面，绑定领域激活状态
//! - AudioInterfaceServer: 跨进程音频设备仲裁
//! - MediaServer: 组合根

mod audio_interface;
mod builder_manager;
mod call_monitor;
mod domain_manager;
mod drm_session;
mod media_agent;
mod media_agent_session;
mod media_server;
mod negotiator;
mod session_manager;
mod uri_negotiator;

#[cfg(test)]
pub(crate) mod testing;

pub use audio_interface::{AudioInterfaceServer, Directives};
pub use builder_manager::BuilderManager;
pub use call_monitor::{CallMonitor, DomainControl};
pub use domain_manager::{DomainManager, DomainStatus};
pub use drm_session::{DrmSession, DRM_SCHEME};
pub use media_agent::MediaAgent;
pub use media_agent_session::MediaAgentSession;
pub use media_server::{ArbitrationSettings, MediaServer, MediaServerDeps};
pub use negotiator::{BuilderNegotiator, NegotiatedSession};
pub use session_manager::SessionManager;
pub use uri_negotiator::{guess_mime_type, UriNegotiator, UNKNOWN_MIME_TYPE};
