//! IPC - 音频接口本地套接字

mod audio_socket;

pub use audio_socket::{AudioSocketEvent, AudioSocketListener};
