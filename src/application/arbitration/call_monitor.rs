//! Call Monitor - 电话事件到领域激活的适配
//!
//! 通话开始时激活电话领域，结束时释放；重复上报同一状态不产生动作

use std::sync::Arc;

use serde_json::json;

use crate::application::ports::{media_path, StatusPublisherPort};

/// 领域激活入口（由 SessionManager 实现，激活后同步分发状态变化）
pub trait DomainControl {
    fn activate_domain(&mut self, name: &str) -> bool;
    fn deactivate_domain(&mut self, name: &str);
}

pub struct CallMonitor {
    call_domain: String,
    call_active: bool,
    /// 激活是否成功；失败时结束通话不需要释放
    holds_domain: bool,
    status: Arc<dyn StatusPublisherPort>,
}

impl CallMonitor {
    pub fn new(call_domain: impl Into<String>, status: Arc<dyn StatusPublisherPort>) -> Self {
        let monitor = Self {
            call_domain: call_domain.into(),
            call_active: false,
            holds_domain: false,
            status,
        };
        monitor.publish();
        monitor
    }

    pub fn set_call_active(&mut self, active: bool, domains: &mut dyn DomainControl) {
        if active == self.call_active {
            return;
        }
        self.call_active = active;

        if active {
            self.holds_domain = domains.activate_domain(&self.call_domain);
            tracing::info!(
                domain = %self.call_domain,
                activated = self.holds_domain,
                "Call started"
            );
        } else {
            if self.holds_domain {
                domains.deactivate_domain(&self.call_domain);
                self.holds_domain = false;
            }
            tracing::info!(domain = %self.call_domain, "Call ended");
        }
        self.publish();
    }

    pub fn is_call_active(&self) -> bool {
        self.call_active
    }

    pub fn call_domain(&self) -> &str {
        &self.call_domain
    }

    fn publish(&self) {
        self.status
            .set_attribute(&media_path(&["Calls", "Active"]), json!(self.call_active));
    }
}
