//! In-Memory Audio State - 音频状态后端
//!
//! 接受所有领域切换，除非该领域被标记为不可用（例如设备被占用）

use std::sync::RwLock;

use dashmap::DashSet;

use crate::application::ports::AudioStatePort;

pub struct InMemoryAudioState {
    unavailable: DashSet<String>,
    current: RwLock<Option<String>>,
}

impl InMemoryAudioState {
    pub fn new() -> Self {
        Self {
            unavailable: DashSet::new(),
            current: RwLock::new(None),
        }
    }

    pub fn set_available(&self, domain: &str, available: bool) {
        if available {
            self.unavailable.remove(domain);
        } else {
            self.unavailable.insert(domain.to_string());
        }
    }

    /// 最近一次成功切换到的领域
    pub fn current_domain(&self) -> Option<String> {
        self.current.read().ok().and_then(|c| c.clone())
    }
}

impl Default for InMemoryAudioState {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioStatePort for InMemoryAudioState {
    fn set_domain(&self, domain: &str) -> bool {
        if self.unavailable.contains(domain) {
            tracing::debug!(domain = %domain, "Audio state switch refused");
            return false;
        }
        if let Ok(mut current) = self.current.write() {
            *current = Some(domain.to_string());
        }
        tracing::debug!(domain = %domain, "Audio state switched");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_domain_is_refused() {
        let state = InMemoryAudioState::new();
        assert!(state.set_domain("Media"));
        state.set_available("Phone", false);
        assert!(!state.set_domain("Phone"));
        assert_eq!(state.current_domain().as_deref(), Some("Media"));

        state.set_available("Phone", true);
        assert!(state.set_domain("Phone"));
        assert_eq!(state.current_domain().as_deref(), Some("Phone"));
    }
}
