//! Audio Socket Listener
//!
//! `<socket_dir>/QAudioServer` 上的 Unix 套接字前端。每个连接一个读任务和一个
//! 写任务；所有仲裁决定由 MediaWorker 做出，这里只转发行和指令

use std::io;
use std::path::{Path, PathBuf};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};

use crate::domain::audio::{ConnectionId, ServerDirective};

/// 单行最大长度，超出的行被丢弃
const MAX_LINE_LENGTH: usize = 1024;

/// 发送到 MediaWorker 的套接字事件
#[derive(Debug)]
pub enum AudioSocketEvent {
    Connected {
        id: ConnectionId,
        writer: mpsc::UnboundedSender<ServerDirective>,
    },
    Line {
        id: ConnectionId,
        line: String,
    },
    Disconnected {
        id: ConnectionId,
    },
}

pub struct AudioSocketListener {
    path: PathBuf,
    listener: UnixListener,
    events: mpsc::UnboundedSender<AudioSocketEvent>,
}

impl AudioSocketListener {
    /// 绑定套接字；遗留的套接字文件会被删除
    pub fn bind(
        path: impl AsRef<Path>,
        events: mpsc::UnboundedSender<AudioSocketEvent>,
    ) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed stale audio socket"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let listener = UnixListener::bind(&path)?;
        tracing::info!(path = %path.display(), "Audio interface socket listening");
        Ok(Self {
            path,
            listener,
            events,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 接受连接直到 MediaWorker 停止
    pub async fn run(self) {
        let mut next_id: u64 = 1;
        loop {
            let stream = match self.listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept audio client");
                    continue;
                }
            };
            if self.events.is_closed() {
                break;
            }

            let id = ConnectionId::new(next_id);
            next_id += 1;
            tokio::spawn(serve_connection(stream, id, self.events.clone()));
        }

        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!(error = %e, "Failed to remove audio socket");
        }
        tracing::info!("Audio interface socket stopped");
    }
}

async fn serve_connection(
    stream: UnixStream,
    id: ConnectionId,
    events: mpsc::UnboundedSender<AudioSocketEvent>,
) {
    let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let (mut sink, mut lines) = framed.split();
    let (writer, mut directives) = mpsc::unbounded_channel::<ServerDirective>();

    if events
        .send(AudioSocketEvent::Connected { id, writer })
        .is_err()
    {
        return;
    }
    tracing::debug!(connection = %id, "Audio socket connection opened");

    // 指令写出任务
    let write_task = tokio::spawn(async move {
        while let Some(directive) = directives.recv().await {
            if let Err(e) = sink.send(directive.to_line()).await {
                tracing::debug!(connection = %id, error = %e, "Failed to write directive");
                break;
            }
        }
    });

    // 行读取任务
    let read_events = events.clone();
    let read_task = tokio::spawn(async move {
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) => {
                    if read_events.send(AudioSocketEvent::Line { id, line }).is_err() {
                        break;
                    }
                }
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    tracing::warn!(connection = %id, "Oversized audio protocol line dropped");
                }
                Err(LinesCodecError::Io(e)) => {
                    tracing::debug!(connection = %id, error = %e, "Audio socket read error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = read_task => {}
        _ = write_task => {}
    }

    let _ = events.send(AudioSocketEvent::Disconnected { id });
    tracing::debug!(connection = %id, "Audio socket connection closed");
}
