//! Media Worker - 单一事件循环
//!
//! 持有 MediaServer，所有输入（控制命令、引擎会话事件、音频套接字事件、
//! 轮询定时器）都在同一个 `tokio::select!` 循环中串行处理

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::application::arbitration::{
    ArbitrationSettings, Directives, MediaServer, MediaServerDeps,
};
use crate::application::commands::{CreateSessionCommand, SessionAction};
use crate::application::error::ApplicationError;
use crate::application::ports::{EngineContext, SessionInfo};
use crate::domain::audio::{ConnectionId, ServerDirective};
use crate::domain::session::{SessionEvent, SessionEventReceiver, SessionId};
use crate::infrastructure::ipc::AudioSocketEvent;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct MediaWorkerConfig {
    /// update_sessions 轮询间隔
    pub poll_interval: Duration,
    /// 控制命令队列容量
    pub command_capacity: usize,
}

impl Default for MediaWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            command_capacity: 256,
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T, ApplicationError>>;

/// 发送给 MediaWorker 的控制命令
#[derive(Debug)]
pub enum ServerCommand {
    CreateSession {
        cmd: CreateSessionCommand,
        reply: Reply<SessionId>,
    },
    Control {
        id: SessionId,
        action: SessionAction,
        reply: Reply<()>,
    },
    DestroySession {
        id: SessionId,
        reply: Reply<()>,
    },
    SessionInfo {
        id: SessionId,
        reply: Reply<SessionInfo>,
    },
    ListSessions {
        reply: Reply<Vec<SessionInfo>>,
    },
    SetCallActive {
        active: bool,
        reply: Reply<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

pub struct MediaWorker {
    config: MediaWorkerConfig,
    server: MediaServer,
    commands: mpsc::Receiver<ServerCommand>,
    session_events: SessionEventReceiver,
    audio_events: mpsc::UnboundedReceiver<AudioSocketEvent>,
    writers: HashMap<ConnectionId, mpsc::UnboundedSender<ServerDirective>>,
}

impl MediaWorker {
    pub fn new(
        config: MediaWorkerConfig,
        settings: ArbitrationSettings,
        deps: MediaServerDeps,
        commands: mpsc::Receiver<ServerCommand>,
        audio_events: mpsc::UnboundedReceiver<AudioSocketEvent>,
    ) -> Self {
        let (event_tx, session_events) = mpsc::unbounded_channel();
        let server = MediaServer::new(settings, deps, EngineContext::new(event_tx));
        Self {
            config,
            server,
            commands,
            session_events,
            audio_events,
            writers: HashMap::new(),
        }
    }

    /// 启动事件循环，命令通道关闭或收到 Shutdown 时退出
    pub async fn run(mut self) {
        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "MediaWorker started"
        );

        let mut poll = tokio::time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut audio_open = true;
        let mut shutdown_reply = None;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(ServerCommand::Shutdown { reply }) => {
                        shutdown_reply = Some(reply);
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.session_events.recv() => self.handle_session_event(event),
                event = self.audio_events.recv(), if audio_open => match event {
                    Some(event) => self.handle_audio_event(event),
                    None => audio_open = false,
                },
                _ = poll.tick() => self.server.poll(),
            }
        }

        self.server.shutdown();
        self.writers.clear();
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
        tracing::info!("MediaWorker stopped");
    }

    fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::CreateSession { cmd, reply } => {
                let _ = reply.send(self.server.create_session(cmd));
            }
            ServerCommand::Control { id, action, reply } => {
                let _ = reply.send(self.server.control_session(&id, action));
            }
            ServerCommand::DestroySession { id, reply } => {
                let _ = reply.send(self.server.destroy_session(&id));
            }
            ServerCommand::SessionInfo { id, reply } => {
                let _ = reply.send(self.server.session_info(&id));
            }
            ServerCommand::ListSessions { reply } => {
                let _ = reply.send(Ok(self.server.list_sessions()));
            }
            ServerCommand::SetCallActive { active, reply } => {
                self.server.set_call_active(active);
                let _ = reply.send(Ok(()));
            }
            ServerCommand::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn handle_session_event(&mut self, event: SessionEvent) {
        tracing::trace!(session_id = %event.session_id, kind = ?event.kind, "Session event");
        self.server.session_event(event);
    }

    fn handle_audio_event(&mut self, event: AudioSocketEvent) {
        let directives = match event {
            AudioSocketEvent::Connected { id, writer } => {
                self.writers.insert(id, writer);
                self.server.audio_connected(id)
            }
            AudioSocketEvent::Line { id, line } => self.server.audio_line(id, &line),
            AudioSocketEvent::Disconnected { id } => {
                self.writers.remove(&id);
                self.server.audio_disconnected(id)
            }
        };
        self.dispatch(directives);
    }

    fn dispatch(&mut self, directives: Directives) {
        for (id, directive) in directives {
            let delivered = self
                .writers
                .get(&id)
                .map(|writer| writer.send(directive).is_ok())
                .unwrap_or(false);
            if !delivered {
                tracing::debug!(
                    connection = %id,
                    directive = directive.verb(),
                    "Directive for closed audio connection dropped"
                );
            }
        }
    }
}
