//! Audio Client Instance
//!
//! 每个连接到音频接口服务的进程对应一个实例，仅存在于服务端内存中

use serde::Serialize;

use crate::domain::session::MEDIA_DOMAIN;

/// mediaserver 自身客户端的优先级
pub const PRIVILEGED_PRIORITY: i32 = 255;

/// 客户端声明此领域时被视为 mediaserver
pub const MEDIA_SERVER_DOMAIN: &str = "MediaServer";

/// 连接标识（按连接顺序递增）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "audio-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Stopped,
    Active,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceType {
    None,
    Play,
    Record,
}

#[derive(Debug, Clone, Serialize)]
pub struct AudioClientInstance {
    pub id: ConnectionId,
    pub state: InstanceState,
    pub kind: InstanceType,
    pub priority: i32,
    pub domain: String,
}

impl AudioClientInstance {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            state: InstanceState::Stopped,
            kind: InstanceType::None,
            priority: 0,
            domain: MEDIA_DOMAIN.to_string(),
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.priority == PRIVILEGED_PRIORITY
    }

    pub fn is_active(&self) -> bool {
        self.state == InstanceState::Active
    }

    /// DOMAIN 命令：MediaServer 强制提升为特权 Media 客户端
    pub fn apply_domain(&mut self, name: &str) {
        if name == MEDIA_SERVER_DOMAIN {
            self.priority = PRIVILEGED_PRIORITY;
            self.domain = MEDIA_DOMAIN.to_string();
        } else {
            self.domain = name.to_string();
        }
    }
}
