//! Audio State Adapter

mod in_memory_audio_state;

pub use in_memory_audio_state::InMemoryAudioState;
