//! qmediad - 媒体会话与音频仲裁服务
//!
//! 组装顺序：配置 -> 日志 -> 状态存储与适配器 -> MediaWorker -> 音频套接字 -> HTTP

use std::sync::Arc;
use std::time::Duration;

use qmediad::application::ports::{MediaEngine, StatusPublisherPort};
use qmediad::application::{ArbitrationSettings, MediaServerDeps};
use qmediad::config::{load_config, print_config, AppConfig, LogConfig};
use qmediad::infrastructure::adapters::{
    InMemoryAudioState, PassThroughLicense, SimulatedEngine, SimulatedEngineSettings,
};
use qmediad::infrastructure::events::StatusStore;
use qmediad::infrastructure::http::{AppState, HttpServer};
use qmediad::infrastructure::ipc::AudioSocketListener;
use qmediad::infrastructure::worker::{MediaServerHandle, MediaWorker, MediaWorkerConfig};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "qmediad starting");
    print_config(&config);

    let status = StatusStore::new().arc();
    let engines = build_engines(&config);
    let deps = MediaServerDeps {
        engines,
        audio_state: Arc::new(InMemoryAudioState::new()),
        license: Arc::new(PassThroughLicense::new()),
        status: status.clone() as Arc<dyn StatusPublisherPort>,
    };

    // 创建 MediaWorker
    let worker_config = MediaWorkerConfig {
        poll_interval: Duration::from_millis(config.agent.poll_interval_ms),
        ..Default::default()
    };
    let (command_tx, command_rx) = mpsc::channel(worker_config.command_capacity);
    let (audio_tx, audio_rx) = mpsc::unbounded_channel();
    let worker = MediaWorker::new(
        worker_config,
        arbitration_settings(&config),
        deps,
        command_rx,
        audio_rx,
    );
    let worker_task = tokio::spawn(worker.run());
    let handle = MediaServerHandle::new(command_tx);

    // 音频接口套接字
    if config.audio_interface.enabled {
        let listener = AudioSocketListener::bind(config.audio_interface.socket_path(), audio_tx)?;
        tokio::spawn(listener.run());
    } else {
        tracing::info!("Audio interface socket disabled");
        drop(audio_tx);
    }

    // 创建 HTTP 服务器
    let state = AppState::new(Arc::new(handle.clone()), status);
    let server = HttpServer::new(config.server.addr(), state);
    server.run_with_shutdown(shutdown_signal()).await?;

    handle.shutdown().await;
    if let Err(e) = worker_task.await {
        tracing::error!(error = %e, "MediaWorker task failed");
    }

    tracing::info!("qmediad stopped");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},qmediad={},tower_http=debug", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_engines(config: &AppConfig) -> Vec<Box<dyn MediaEngine>> {
    config
        .engines
        .simulated
        .iter()
        .map(|engine| {
            let settings = SimulatedEngineSettings {
                name: engine.name.clone(),
                version: engine.version.clone(),
                exclusive: engine.exclusive,
                uri_schemes: engine.uri_schemes.clone(),
                mime_types: engine.mime_types.clone(),
                idle_time_secs: engine.idle_time_secs,
                track_length_ms: engine.track_length_ms,
            };
            Box::new(SimulatedEngine::new(settings)) as Box<dyn MediaEngine>
        })
        .collect()
}

fn arbitration_settings(config: &AppConfig) -> ArbitrationSettings {
    ArbitrationSettings {
        domain_priorities: config.domains.priorities.clone(),
        engine_priorities: config.engines.priorities.clone(),
        call_domain: config.calls.domain.clone(),
        audio_mixing: config.audio_interface.mixing,
        exclusive_domains: config.audio_interface.exclusive_domains.clone(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
