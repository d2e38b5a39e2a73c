//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod audio_state;
pub mod engine;
pub mod license;

pub use audio_state::*;
pub use engine::*;
pub use license::*;
