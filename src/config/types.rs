//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 控制面 HTTP 服务配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 音频接口套接字配置
    #[serde(default)]
    pub audio_interface: AudioInterfaceConfig,

    /// 领域优先级
    #[serde(default)]
    pub domains: DomainsConfig,

    /// 引擎配置
    #[serde(default)]
    pub engines: EnginesConfig,

    /// MediaAgent 配置
    #[serde(default)]
    pub agent: AgentConfig,

    /// 电话事件配置
    #[serde(default)]
    pub calls: CallsConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 音频接口配置
#[derive(Debug, Clone, Deserialize)]
pub struct AudioInterfaceConfig {
    /// 是否启用音频接口套接字
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 套接字目录，缺省为系统临时目录
    #[serde(default)]
    pub socket_dir: Option<PathBuf>,

    /// 音频后端是否支持混音
    #[serde(default)]
    pub mixing: bool,

    /// 抢占时强制停止（STOPALL）的独占领域
    #[serde(default = "default_exclusive_domains")]
    pub exclusive_domains: Vec<String>,
}

/// 套接字文件名
pub const AUDIO_SOCKET_NAME: &str = "QAudioServer";

fn default_true() -> bool {
    true
}

fn default_exclusive_domains() -> Vec<String> {
    vec!["Ring".to_string(), "RingTone".to_string(), "Phone".to_string()]
}

impl Default for AudioInterfaceConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            socket_dir: None,
            mixing: false,
            exclusive_domains: default_exclusive_domains(),
        }
    }
}

impl AudioInterfaceConfig {
    /// `<socket_dir>/QAudioServer`
    pub fn socket_path(&self) -> PathBuf {
        self.socket_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(AUDIO_SOCKET_NAME)
    }
}

/// 领域配置
#[derive(Debug, Clone, Deserialize)]
pub struct DomainsConfig {
    /// 领域 -> 优先级（数字越小越优先）；为空时不做抢占判断
    #[serde(default = "default_domain_priorities")]
    pub priorities: HashMap<String, i32>,
}

fn default_domain_priorities() -> HashMap<String, i32> {
    [("Phone", 0), ("RingTone", 1), ("Alarm", 2), ("Media", 5)]
        .into_iter()
        .map(|(name, priority)| (name.to_string(), priority))
        .collect()
}

impl Default for DomainsConfig {
    fn default() -> Self {
        Self {
            priorities: default_domain_priorities(),
        }
    }
}

/// 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct EnginesConfig {
    /// 引擎名 -> 优先级（URI 协商使用，数字越小越优先）
    #[serde(default)]
    pub priorities: HashMap<String, i32>,

    /// 模拟引擎列表
    #[serde(default = "default_simulated_engines")]
    pub simulated: Vec<SimulatedEngineConfig>,
}

impl Default for EnginesConfig {
    fn default() -> Self {
        Self {
            priorities: HashMap::new(),
            simulated: default_simulated_engines(),
        }
    }
}

/// 模拟引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedEngineConfig {
    pub name: String,

    #[serde(default = "default_engine_version")]
    pub version: String,

    /// 是否独占音频设备
    #[serde(default)]
    pub exclusive: bool,

    /// 支持的 URI scheme
    #[serde(default = "default_uri_schemes")]
    pub uri_schemes: Vec<String>,

    /// 支持的 MIME 类型（支持 `audio/*`）
    #[serde(default = "default_mime_types")]
    pub mime_types: Vec<String>,

    #[serde(default)]
    pub idle_time_secs: u64,

    /// 模拟的媒体时长（毫秒）
    #[serde(default = "default_track_length")]
    pub track_length_ms: u64,
}

fn default_engine_version() -> String {
    "1.0".to_string()
}

fn default_uri_schemes() -> Vec<String> {
    vec!["file".to_string(), "http".to_string(), "qtopia".to_string()]
}

fn default_mime_types() -> Vec<String> {
    vec!["audio/*".to_string()]
}

fn default_track_length() -> u64 {
    180_000
}

fn default_simulated_engines() -> Vec<SimulatedEngineConfig> {
    vec![SimulatedEngineConfig {
        name: "simulated".to_string(),
        version: default_engine_version(),
        exclusive: true,
        uri_schemes: default_uri_schemes(),
        mime_types: default_mime_types(),
        idle_time_secs: 0,
        track_length_ms: default_track_length(),
    }]
}

/// MediaAgent 配置
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// update_sessions 轮询间隔（毫秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    1000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

/// 电话事件配置
#[derive(Debug, Clone, Deserialize)]
pub struct CallsConfig {
    /// 通话期间激活的领域
    #[serde(default = "default_call_domain")]
    pub domain: String,
}

fn default_call_domain() -> String {
    "Phone".to_string()
}

impl Default for CallsConfig {
    fn default() -> Self {
        Self {
            domain: default_call_domain(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
