//! Domain Manager - 音频领域优先级仲裁
//!
//! 同一时刻最多一个活动领域。被抢占但仍被会话引用的领域进入非活动集合，
//! 活动领域释放后按优先级（数字越小越优先）恢复其中之一。
//!
//! 不变量:
//! - 引用计数为 0 的领域既不活动也不在非活动集合中
//! - 活动领域的引用计数 >= 1

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::application::ports::{media_path, AudioStatePort, StatusPublisherPort};

/// 领域状态变化事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainStatus {
    pub active: Option<String>,
    pub inactive: Vec<String>,
}

impl DomainStatus {
    pub fn is_active(&self, domain: &str) -> bool {
        self.active.as_deref() == Some(domain)
    }
}

pub struct DomainManager {
    priorities: HashMap<String, i32>,
    backend: Arc<dyn AudioStatePort>,
    status: Arc<dyn StatusPublisherPort>,
    active: Option<String>,
    inactive: BTreeSet<String>,
    refcounts: HashMap<String, u32>,
    /// 尚未分发的状态变化
    pending: VecDeque<DomainStatus>,
}

impl DomainManager {
    pub fn new(
        priorities: HashMap<String, i32>,
        backend: Arc<dyn AudioStatePort>,
        status: Arc<dyn StatusPublisherPort>,
    ) -> Self {
        if priorities.is_empty() {
            tracing::warn!("No domain priorities configured, preemption disabled");
        } else {
            tracing::info!(domains = priorities.len(), "Domain priority table loaded");
        }
        status.set_attribute(&media_path(&["Domains", "Priorities"]), json!(priorities));

        let manager = Self {
            priorities,
            backend,
            status,
            active: None,
            inactive: BTreeSet::new(),
            refcounts: HashMap::new(),
            pending: VecDeque::new(),
        };
        manager.publish();
        manager
    }

    pub fn activate_domain(&mut self, name: &str) -> bool {
        if self.active.as_deref() == Some(name) {
            *self.refcounts.entry(name.to_string()).or_insert(0) += 1;
            return true;
        }

        if self.priorities.is_empty() {
            return self.backend.set_domain(name);
        }

        let priority = match self.priorities.get(name) {
            Some(p) => *p,
            None => {
                tracing::warn!(domain = %name, "Activation of unknown domain refused");
                return false;
            }
        };

        if let Some(active) = &self.active {
            let active_priority = self.priority_of(active);
            if active_priority < priority {
                tracing::debug!(
                    domain = %name,
                    active = %active,
                    "Higher priority domain active, activation refused"
                );
                return false;
            }
        }

        if !self.backend.set_domain(name) {
            tracing::warn!(domain = %name, "Audio state backend refused domain switch");
            return false;
        }

        if let Some(previous) = self.active.take() {
            self.inactive.insert(previous);
        }
        self.inactive.remove(name);
        self.active = Some(name.to_string());
        *self.refcounts.entry(name.to_string()).or_insert(0) += 1;

        tracing::info!(domain = %name, "Domain activated");
        self.emit_status_change();
        true
    }

    pub fn deactivate_domain(&mut self, name: &str) {
        let count = match self.refcounts.get_mut(name) {
            Some(count) => count,
            None => {
                tracing::debug!(domain = %name, "Deactivating untracked domain");
                return;
            }
        };

        *count -= 1;
        if *count > 0 {
            return;
        }

        self.refcounts.remove(name);
        let was_inactive = self.inactive.remove(name);

        if self.active.as_deref() == Some(name) {
            self.active = None;
            tracing::info!(domain = %name, "Domain deactivated");
            self.reactivate_inactive();
            self.emit_status_change();
        } else if was_inactive {
            self.emit_status_change();
        }
    }

    /// 恢复优先级最高的非活动领域（其引用计数已由持有的会话计入）
    fn reactivate_inactive(&mut self) {
        let next = self
            .inactive
            .iter()
            .min_by_key(|d| self.priority_of(d))
            .cloned();

        if let Some(next) = next {
            if self.backend.set_domain(&next) {
                self.inactive.remove(&next);
                tracing::info!(domain = %next, "Inactive domain reactivated");
                self.active = Some(next);
            } else {
                tracing::warn!(domain = %next, "Audio state backend refused reactivation");
            }
        }
    }

    fn priority_of(&self, domain: &str) -> i32 {
        self.priorities.get(domain).copied().unwrap_or(i32::MAX)
    }

    fn emit_status_change(&mut self) {
        let status = self.snapshot();
        self.publish();
        self.pending.push_back(status);
    }

    fn publish(&self) {
        self.status.set_attribute(
            &media_path(&["Domains", "Active"]),
            json!(self.active),
        );
        self.status.set_attribute(
            &media_path(&["Domains", "Inactive"]),
            json!(self.inactive.iter().collect::<Vec<_>>()),
        );
    }

    /// 取出尚未分发的状态变化（按发生顺序）
    pub fn take_status_changes(&mut self) -> Vec<DomainStatus> {
        self.pending.drain(..).collect()
    }

    pub fn snapshot(&self) -> DomainStatus {
        DomainStatus {
            active: self.active.clone(),
            inactive: self.inactive.iter().cloned().collect(),
        }
    }

    pub fn active_domain(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.as_deref() == Some(name)
    }

    pub fn refcount(&self, name: &str) -> u32 {
        self.refcounts.get(name).copied().unwrap_or(0)
    }

    pub fn has_priorities(&self) -> bool {
        !self.priorities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::arbitration::testing::{MockAudioState, RecordingStatus};

    fn manager_with(pairs: &[(&str, i32)]) -> (DomainManager, Arc<MockAudioState>, Arc<RecordingStatus>) {
        let backend = Arc::new(MockAudioState::default());
        let status = Arc::new(RecordingStatus::default());
        let priorities = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        let manager = DomainManager::new(priorities, backend.clone(), status.clone());
        (manager, backend, status)
    }

    fn assert_invariants(manager: &DomainManager) {
        if let Some(active) = manager.active_domain() {
            assert!(manager.refcount(active) >= 1);
            assert!(!manager.snapshot().inactive.contains(&active.to_string()));
        }
        for domain in manager.snapshot().inactive {
            assert!(manager.refcount(&domain) >= 1);
        }
    }

    #[test]
    fn test_ringtone_preempts_media_and_restores_it() {
        let (mut manager, _, status) = manager_with(&[("Media", 5), ("RingTone", 1)]);

        assert!(manager.activate_domain("Media"));
        assert!(manager.is_active("Media"));

        assert!(manager.activate_domain("RingTone"));
        assert!(manager.is_active("RingTone"));
        assert_eq!(manager.snapshot().inactive, vec!["Media".to_string()]);
        assert_invariants(&manager);

        manager.deactivate_domain("RingTone");
        assert!(manager.is_active("Media"));
        assert!(manager.snapshot().inactive.is_empty());
        assert_eq!(manager.refcount("Media"), 1);
        assert_invariants(&manager);

        assert_eq!(
            status.get("/Media/Domains/Active"),
            Some(serde_json::json!("Media"))
        );
        assert_eq!(manager.take_status_changes().len(), 3);
    }

    #[test]
    fn test_lower_priority_cannot_preempt() {
        let (mut manager, backend, _) = manager_with(&[("Media", 5), ("RingTone", 1)]);
        assert!(manager.activate_domain("RingTone"));
        assert!(!manager.activate_domain("Media"));
        assert!(manager.is_active("RingTone"));
        assert_eq!(manager.refcount("Media"), 0);
        assert_eq!(backend.calls(), vec!["RingTone"]);
    }

    #[test]
    fn test_equal_priority_switches() {
        let (mut manager, _, _) = manager_with(&[("Media", 5), ("Other", 5)]);
        assert!(manager.activate_domain("Media"));
        assert!(manager.activate_domain("Other"));
        assert!(manager.is_active("Other"));
        assert!(manager.activate_domain("Media"));
        assert!(manager.is_active("Media"));
        assert_eq!(manager.snapshot().inactive, vec!["Other".to_string()]);
        assert_eq!(manager.refcount("Media"), 2);
        assert_invariants(&manager);
    }

    #[test]
    fn test_refcount_keeps_domain_active() {
        let (mut manager, _, _) = manager_with(&[("Media", 5)]);
        assert!(manager.activate_domain("Media"));
        assert!(manager.activate_domain("Media"));
        assert_eq!(manager.refcount("Media"), 2);

        manager.deactivate_domain("Media");
        assert!(manager.is_active("Media"));

        manager.deactivate_domain("Media");
        assert_eq!(manager.active_domain(), None);
        assert_eq!(manager.refcount("Media"), 0);
    }

    #[test]
    fn test_unknown_domain_refused() {
        let (mut manager, backend, _) = manager_with(&[("Media", 5)]);
        assert!(!manager.activate_domain("Alarm"));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_backend_refusal_has_no_side_effects() {
        let (mut manager, backend, _) = manager_with(&[("Media", 5), ("Phone", 0)]);
        assert!(manager.activate_domain("Media"));
        manager.take_status_changes();

        backend.reject("Phone");
        assert!(!manager.activate_domain("Phone"));
        assert!(manager.is_active("Media"));
        assert!(manager.snapshot().inactive.is_empty());
        assert!(manager.take_status_changes().is_empty());
    }

    #[test]
    fn test_no_priority_table_delegates_to_backend() {
        let (mut manager, backend, _) = manager_with(&[]);
        assert!(manager.activate_domain("Anything"));
        backend.reject("Refused");
        assert!(!manager.activate_domain("Refused"));
        assert!(manager.take_status_changes().is_empty());
        manager.deactivate_domain("Anything");
    }

    #[test]
    fn test_inactive_domain_release_emits_change() {
        let (mut manager, _, _) = manager_with(&[("Media", 5), ("Phone", 0)]);
        assert!(manager.activate_domain("Media"));
        assert!(manager.activate_domain("Phone"));
        manager.take_status_changes();

        manager.deactivate_domain("Media");
        let changes = manager.take_status_changes();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].is_active("Phone"));
        assert!(changes[0].inactive.is_empty());

        manager.deactivate_domain("Phone");
        let changes = manager.take_status_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].active, None);
    }

    #[test]
    fn test_reactivation_picks_highest_priority_inactive() {
        let (mut manager, _, _) =
            manager_with(&[("Media", 5), ("RingTone", 2), ("Phone", 0), ("Alarm", 3)]);
        assert!(manager.activate_domain("Media"));
        assert!(manager.activate_domain("Alarm"));
        assert!(manager.activate_domain("RingTone"));
        assert!(manager.activate_domain("Phone"));

        manager.deactivate_domain("Phone");
        assert!(manager.is_active("RingTone"));
        manager.deactivate_domain("RingTone");
        assert!(manager.is_active("Alarm"));
        manager.deactivate_domain("Alarm");
        assert!(manager.is_active("Media"));
        assert_invariants(&manager);
    }
}
