//! Audio Interface Protocol
//!
//! 行协议：`--- VERB [arg]...` + 换行，双向相同格式

use thiserror::Error;

/// 行前缀
pub const LINE_PREFIX: &str = "---";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty command line")]
    Empty,

    #[error("missing '---' prefix: {0}")]
    MissingPrefix(String),

    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    #[error("{0} requires an argument")]
    MissingArgument(&'static str),

    #[error("invalid priority: {0}")]
    InvalidPriority(String),
}

/// 客户端 -> 服务端
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Play,
    Record,
    Done,
    Paused,
    Stopped,
    Resumed,
    Domain(String),
    Priority(i32),
}

impl ClientCommand {
    /// 解析一行命令（不含换行符）
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let mut parts = line.split_whitespace();
        if parts.next() != Some(LINE_PREFIX) {
            return Err(ProtocolError::MissingPrefix(line.to_string()));
        }

        let verb = parts.next().ok_or(ProtocolError::Empty)?;
        match verb {
            "PLAY" => Ok(ClientCommand::Play),
            "RECORD" => Ok(ClientCommand::Record),
            "DONE" => Ok(ClientCommand::Done),
            "PAUSED" => Ok(ClientCommand::Paused),
            "STOPPED" => Ok(ClientCommand::Stopped),
            "RESUMED" => Ok(ClientCommand::Resumed),
            "DOMAIN" => {
                let name = parts.next().ok_or(ProtocolError::MissingArgument("DOMAIN"))?;
                Ok(ClientCommand::Domain(name.to_string()))
            }
            "PRIORITY" => {
                let raw = parts
                    .next()
                    .ok_or(ProtocolError::MissingArgument("PRIORITY"))?;
                raw.parse::<i32>()
                    .map(ClientCommand::Priority)
                    .map_err(|_| ProtocolError::InvalidPriority(raw.to_string()))
            }
            other => Err(ProtocolError::UnknownVerb(other.to_string())),
        }
    }

    pub fn to_line(&self) -> String {
        match self {
            ClientCommand::Play => format!("{} PLAY", LINE_PREFIX),
            ClientCommand::Record => format!("{} RECORD", LINE_PREFIX),
            ClientCommand::Done => format!("{} DONE", LINE_PREFIX),
            ClientCommand::Paused => format!("{} PAUSED", LINE_PREFIX),
            ClientCommand::Stopped => format!("{} STOPPED", LINE_PREFIX),
            ClientCommand::Resumed => format!("{} RESUMED", LINE_PREFIX),
            ClientCommand::Domain(name) => format!("{} DOMAIN {}", LINE_PREFIX, name),
            ClientCommand::Priority(p) => format!("{} PRIORITY {}", LINE_PREFIX, p),
        }
    }
}

/// 服务端 -> 客户端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerDirective {
    /// 连接建立
    Active,
    /// 可以使用设备
    Ready,
    /// 让出设备（之后可恢复）
    Pause,
    /// 恢复播放
    Resume,
    /// 强制停止
    StopAll,
    /// 确认 DOMAIN / PRIORITY
    Ack,
}

impl ServerDirective {
    pub fn verb(&self) -> &'static str {
        match self {
            ServerDirective::Active => "ACTIVE",
            ServerDirective::Ready => "READY",
            ServerDirective::Pause => "PAUSE",
            ServerDirective::Resume => "RESUME",
            ServerDirective::StopAll => "STOPALL",
            ServerDirective::Ack => "ACK",
        }
    }

    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut parts = line.split_whitespace();
        if parts.next() != Some(LINE_PREFIX) {
            return Err(ProtocolError::MissingPrefix(line.trim().to_string()));
        }
        match parts.next().ok_or(ProtocolError::Empty)? {
            "ACTIVE" => Ok(ServerDirective::Active),
            "READY" => Ok(ServerDirective::Ready),
            "PAUSE" => Ok(ServerDirective::Pause),
            "RESUME" => Ok(ServerDirective::Resume),
            "STOPALL" => Ok(ServerDirective::StopAll),
            "ACK" => Ok(ServerDirective::Ack),
            other => Err(ProtocolError::UnknownVerb(other.to_string())),
        }
    }

    /// 不含换行符，换行由 LinesCodec 追加
    pub fn to_line(&self) -> String {
        format!("{} {}", LINE_PREFIX, self.verb())
    }
}

impl std::fmt::Display for ServerDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb())
    }
}
