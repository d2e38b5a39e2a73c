//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `QMEDIAD_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `QMEDIAD_SERVER__PORT=8080`
/// - `QMEDIAD_AUDIO_INTERFACE__SOCKET_DIR=/run/qmediad`
/// - `QMEDIAD_AUDIO_INTERFACE__MIXING=true`
/// - `QMEDIAD_CALLS__DOMAIN=Phone`
///
/// 领域 / 引擎优先级表是 map，键名区分大小写，请在配置文件中设置
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 标量默认值；表结构的默认值由 serde 提供
    builder = builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 5070)?
        .set_default("audio_interface.enabled", true)?
        .set_default("audio_interface.mixing", false)?
        .set_default("agent.poll_interval_ms", 1000)?
        .set_default("calls.domain", "Phone")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    builder = builder.add_source(
        Environment::with_prefix("QMEDIAD")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.agent.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Agent poll interval cannot be 0".to_string(),
        ));
    }

    if config.calls.domain.is_empty() {
        return Err(ConfigError::ValidationError(
            "Call domain cannot be empty".to_string(),
        ));
    }

    // 电话领域必须出现在优先级表中，否则通话无法抢占
    if !config.domains.priorities.is_empty()
        && !config.domains.priorities.contains_key(&config.calls.domain)
    {
        return Err(ConfigError::ValidationError(format!(
            "Call domain '{}' has no configured priority",
            config.calls.domain
        )));
    }

    let mut names = std::collections::HashSet::new();
    for engine in &config.engines.simulated {
        if engine.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "Engine name cannot be empty".to_string(),
            ));
        }
        if !names.insert(engine.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Duplicate engine name: {}",
                engine.name
            )));
        }
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Control API: {}", config.server.addr());
    if config.audio_interface.enabled {
        tracing::info!("Audio Socket: {:?}", config.audio_interface.socket_path());
    }
    tracing::info!("Audio Mixing: {}", config.audio_interface.mixing);
    tracing::info!("Exclusive Domains: {:?}", config.audio_interface.exclusive_domains);
    tracing::info!("Domain Priorities: {:?}", config.domains.priorities);
    tracing::info!(
        "Engines: {:?}",
        config
            .engines
            .simulated
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
    );
    tracing::info!("Agent Poll Interval: {}ms", config.agent.poll_interval_ms);
    tracing::info!("Call Domain: {}", config.calls.domain);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_unprioritized_call_domain() {
        let mut config = AppConfig::default();
        config.calls.domain = "Voip".to_string();
        assert!(validate_config(&config).is_err());

        config.domains.priorities.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_duplicate_engine() {
        let mut config = AppConfig::default();
        let engine = config.engines.simulated[0].clone();
        config.engines.simulated.push(engine);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[audio_interface]
mixing = true

[domains.priorities]
Media = 3
Phone = 0

[[engines.simulated]]
name = "gst"
exclusive = true
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.audio_interface.mixing);
        assert!(config
            .domains
            .priorities
            .iter()
            .any(|(name, priority)| name.eq_ignore_ascii_case("media") && *priority == 3));
        assert_eq!(config.engines.simulated[0].name, "gst");
        assert_eq!(config.engines.simulated[0].mime_types, vec!["audio/*"]);
        assert_eq!(config.agent.poll_interval_ms, 1000);
    }
}
