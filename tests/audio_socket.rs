//! 音频接口端到端测试：真实 Unix 套接字 + MediaWorker

use std::sync::Arc;
use std::time::Duration;

use qmediad::application::ports::StatusPublisherPort;
use qmediad::application::{ArbitrationSettings, MediaServerDeps};
use qmediad::infrastructure::adapters::{InMemoryAudioState, PassThroughLicense};
use qmediad::infrastructure::events::StatusStore;
use qmediad::infrastructure::ipc::AudioSocketListener;
use qmediad::infrastructure::worker::{MediaServerHandle, MediaWorker, MediaWorkerConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio::time::timeout;

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(path: &std::path::Path) -> Self {
        let stream = UnixStream::connect(path).await.unwrap();
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        };
        assert_eq!(client.expect().await, "--- ACTIVE");
        client
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn expect(&mut self) -> String {
        timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("timed out waiting for directive")
            .unwrap()
            .expect("connection closed")
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    path: std::path::PathBuf,
    status: Arc<StatusStore>,
    handle: MediaServerHandle,
}

fn start() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("QAudioServer");
    let status = StatusStore::new().arc();

    let deps = MediaServerDeps {
        engines: Vec::new(),
        audio_state: Arc::new(InMemoryAudioState::new()),
        license: Arc::new(PassThroughLicense::new()),
        status: status.clone() as Arc<dyn StatusPublisherPort>,
    };
    let settings = ArbitrationSettings {
        audio_mixing: false,
        exclusive_domains: vec!["RingTone".to_string(), "Phone".to_string()],
        ..Default::default()
    };

    let (command_tx, command_rx) = mpsc::channel(16);
    let (audio_tx, audio_rx) = mpsc::unbounded_channel();
    let listener = AudioSocketListener::bind(&path, audio_tx).unwrap();
    tokio::spawn(listener.run());
    let worker = MediaWorker::new(
        MediaWorkerConfig::default(),
        settings,
        deps,
        command_rx,
        audio_rx,
    );
    tokio::spawn(worker.run());

    Harness {
        _dir: dir,
        path,
        status,
        handle: MediaServerHandle::new(command_tx),
    }
}

#[tokio::test]
async fn test_second_player_pauses_first_and_done_resumes_it() {
    let harness = start();

    let mut first = Client::connect(&harness.path).await;
    first.send("--- PLAY").await;
    assert_eq!(first.expect().await, "--- READY");

    let mut second = Client::connect(&harness.path).await;
    second.send("--- PLAY").await;
    assert_eq!(first.expect().await, "--- PAUSE");

    first.send("--- PAUSED").await;
    assert_eq!(second.expect().await, "--- READY");

    second.send("--- DONE").await;
    assert_eq!(first.expect().await, "--- RESUME");

    harness.handle.shutdown().await;
}

#[tokio::test]
async fn test_disconnect_releases_device() {
    let harness = start();

    let mut first = Client::connect(&harness.path).await;
    first.send("--- PLAY").await;
    assert_eq!(first.expect().await, "--- READY");

    let mut second = Client::connect(&harness.path).await;
    second.send("--- PLAY").await;
    assert_eq!(first.expect().await, "--- PAUSE");
    first.send("--- PAUSED").await;
    assert_eq!(second.expect().await, "--- READY");

    drop(second);
    assert_eq!(first.expect().await, "--- RESUME");
    let instances = harness.status.value("/Media/Audio/Instances").unwrap();
    assert_eq!(instances.as_array().map(Vec::len), Some(1));

    harness.handle.shutdown().await;
}

#[tokio::test]
async fn test_domain_change_is_acknowledged() {
    let harness = start();

    let mut client = Client::connect(&harness.path).await;
    client.send("--- DOMAIN RingTone").await;
    assert_eq!(client.expect().await, "--- ACK");
    client.send("--- PRIORITY 3").await;
    assert_eq!(client.expect().await, "--- ACK");

    harness.handle.shutdown().await;
}
