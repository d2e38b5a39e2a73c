//! Engine Adapter - 媒体引擎实现

mod simulated_engine;

pub use simulated_engine::{SimulatedEngine, SimulatedEngineSettings};
