//! Audio Interface Server - 跨进程音频设备仲裁
//!
//! 纯状态机：输入为连接事件和客户端命令，输出为需要发送给各连接的指令。
//! 套接字读写由 infrastructure 层完成。
//!
//! 规则概要:
//! - 设备空闲时 PLAY/RECORD 直接授予（READY）
//! - 否则当前活动实例收到 PAUSE 或 STOPALL，请求方在所有活动实例让出
//!   （PAUSED/STOPPED）之后才收到 READY
//! - 授予进行中到达的 PLAY/RECORD 按 FIFO 排队，授予完成后依次重放
//! - 混音后端上同领域、非独占的播放可以并存

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use serde_json::json;

use crate::application::ports::{media_path, StatusPublisherPort};
use crate::domain::audio::{
    AudioClientInstance, ClientCommand, ConnectionId, InstanceState, InstanceType,
    ServerDirective,
};

/// 发送给各连接的指令（按产生顺序）
pub type Directives = Vec<(ConnectionId, ServerDirective)>;

/// 等待活动实例让出设备的授予请求
struct PendingGrant {
    requester: ConnectionId,
    kind: InstanceType,
    waiting: HashSet<ConnectionId>,
}

pub struct AudioInterfaceServer {
    mixing: bool,
    exclusive_domains: HashSet<String>,
    /// 按连接顺序
    instances: Vec<AudioClientInstance>,
    /// 被暂停的实例，最近暂停的在末尾
    paused_order: Vec<ConnectionId>,
    pending: Option<PendingGrant>,
    /// 被要求让出、但请求方已撤回的实例；它们让出后需要被唤回
    orphaned: HashSet<ConnectionId>,
    queued: VecDeque<(ConnectionId, ClientCommand)>,
    status: Arc<dyn StatusPublisherPort>,
}

impl AudioInterfaceServer {
    pub fn new(
        mixing: bool,
        exclusive_domains: impl IntoIterator<Item = String>,
        status: Arc<dyn StatusPublisherPort>,
    ) -> Self {
        let server = Self {
            mixing,
            exclusive_domains: exclusive_domains.into_iter().collect(),
            instances: Vec::new(),
            paused_order: Vec::new(),
            pending: None,
            orphaned: HashSet::new(),
            queued: VecDeque::new(),
            status,
        };
        server.publish();
        server
    }

    pub fn connect(&mut self, id: ConnectionId) -> Directives {
        if self.instance(id).is_some() {
            tracing::warn!(connection = %id, "Duplicate audio client connection ignored");
            return Vec::new();
        }
        tracing::debug!(connection = %id, "Audio client connected");
        self.instances.push(AudioClientInstance::new(id));
        self.publish();
        vec![(id, ServerDirective::Active)]
    }

    /// 原始行输入；格式错误的行记录后丢弃，连接保持
    pub fn handle_line(&mut self, id: ConnectionId, line: &str) -> Directives {
        match ClientCommand::parse(line) {
            Ok(command) => self.handle_command(id, command),
            Err(e) => {
                tracing::warn!(connection = %id, line = %line, error = %e, "Malformed audio protocol line dropped");
                Vec::new()
            }
        }
    }

    pub fn handle_command(&mut self, id: ConnectionId, command: ClientCommand) -> Directives {
        if self.instance(id).is_none() {
            tracing::warn!(connection = %id, command = ?command, "Command from unknown audio client");
            return Vec::new();
        }
        tracing::debug!(connection = %id, command = ?command, "Audio command");

        let mut out = Vec::new();
        match command {
            ClientCommand::Play | ClientCommand::Record => {
                if let Some(pending) = &self.pending {
                    if pending.requester != id {
                        tracing::debug!(connection = %id, "Grant in progress, request queued");
                        self.queued.push_back((id, command));
                    }
                } else {
                    let kind = if command == ClientCommand::Play {
                        InstanceType::Play
                    } else {
                        InstanceType::Record
                    };
                    self.request_device(id, kind, &mut out);
                }
            }
            ClientCommand::Paused => {
                self.set_state(id, InstanceState::Paused);
                self.mark_paused(id);
                self.yielded(id, &mut out);
                self.recall_orphan(id, &mut out);
            }
            ClientCommand::Stopped => {
                self.set_state(id, InstanceState::Stopped);
                self.unmark_paused(id);
                self.yielded(id, &mut out);
                self.orphaned.remove(&id);
                if self.pending.is_none() {
                    self.reinstate(id, &mut out);
                }
            }
            ClientCommand::Resumed => {
                self.orphaned.remove(&id);
                self.set_state(id, InstanceState::Active);
                self.unmark_paused(id);
            }
            ClientCommand::Done => self.release(id, &mut out),
            ClientCommand::Domain(name) => {
                if let Some(instance) = self.instance_mut(id) {
                    instance.apply_domain(&name);
                }
                out.push((id, ServerDirective::Ack));
            }
            ClientCommand::Priority(priority) => {
                if let Some(instance) = self.instance_mut(id) {
                    instance.priority = priority;
                }
                out.push((id, ServerDirective::Ack));
            }
        }

        self.publish();
        out
    }

    /// 断开连接等同于 DONE，随后移除实例
    pub fn disconnect(&mut self, id: ConnectionId) -> Directives {
        if self.instance(id).is_none() {
            return Vec::new();
        }
        tracing::debug!(connection = %id, "Audio client disconnected");

        self.queued.retain(|(queued, _)| *queued != id);
        self.orphaned.remove(&id);
        let mut out = Vec::new();
        self.release(id, &mut out);
        self.instances.retain(|i| i.id != id);

        out.retain(|(target, _)| *target != id);
        self.publish();
        out
    }

    fn request_device(&mut self, id: ConnectionId, kind: InstanceType, out: &mut Directives) {
        if let Some(instance) = self.instance_mut(id) {
            instance.kind = kind;
        }
        let Some(requester) = self.instance(id).cloned() else {
            return;
        };

        let incumbents: Vec<AudioClientInstance> = self
            .instances
            .iter()
            .filter(|i| i.id != id && i.is_active())
            .cloned()
            .collect();

        if incumbents.is_empty() || self.can_mix(&requester, &incumbents) {
            self.grant(id, kind, out);
            return;
        }

        let requester_exclusive = self.exclusive_domains.contains(&requester.domain);
        let mut waiting = HashSet::new();
        for incumbent in &incumbents {
            let directive = match kind {
                InstanceType::Record if incumbent.is_privileged() => ServerDirective::Pause,
                InstanceType::Record => ServerDirective::StopAll,
                _ if incumbent.is_privileged()
                    || requester.is_privileged()
                    || !requester_exclusive =>
                {
                    ServerDirective::Pause
                }
                _ => ServerDirective::StopAll,
            };
            tracing::info!(
                connection = %incumbent.id,
                requester = %id,
                directive = directive.verb(),
                "Audio client asked to yield"
            );
            out.push((incumbent.id, directive));
            waiting.insert(incumbent.id);
        }

        self.pending = Some(PendingGrant {
            requester: id,
            kind,
            waiting,
        });
    }

    /// 混音后端上同领域的非独占播放可以并存
    fn can_mix(&self, requester: &AudioClientInstance, incumbents: &[AudioClientInstance]) -> bool {
        self.mixing
            && requester.kind == InstanceType::Play
            && !self.exclusive_domains.contains(&requester.domain)
            && incumbents
                .iter()
                .all(|i| i.kind == InstanceType::Play && i.domain == requester.domain)
    }

    fn grant(&mut self, id: ConnectionId, kind: InstanceType, out: &mut Directives) {
        if let Some(instance) = self.instance_mut(id) {
            instance.state = InstanceState::Active;
            instance.kind = kind;
        }
        self.unmark_paused(id);
        tracing::info!(connection = %id, kind = ?kind, "Audio device granted");
        out.push((id, ServerDirective::Ready));
    }

    /// 实例让出设备（PAUSED / STOPPED / DONE / 断开）
    fn yielded(&mut self, id: ConnectionId, out: &mut Directives) {
        let complete = match self.pending.as_mut() {
            Some(pending) => {
                pending.waiting.remove(&id);
                pending.waiting.is_empty()
            }
            None => return,
        };
        if !complete {
            return;
        }

        if let Some(pending) = self.pending.take() {
            if self.instance(pending.requester).is_some() {
                self.grant(pending.requester, pending.kind, out);
            }
        }
        self.replay_queued(out);
    }

    fn replay_queued(&mut self, out: &mut Directives) {
        while self.pending.is_none() {
            let Some((id, command)) = self.queued.pop_front() else {
                break;
            };
            let kind = if command == ClientCommand::Record {
                InstanceType::Record
            } else {
                InstanceType::Play
            };
            tracing::debug!(connection = %id, "Replaying queued audio request");
            self.request_device(id, kind, out);
        }
    }

    /// DONE：停止并放弃请求，然后恢复被暂停的实例
    fn release(&mut self, id: ConnectionId, out: &mut Directives) {
        if let Some(instance) = self.instance_mut(id) {
            instance.state = InstanceState::Stopped;
            instance.kind = InstanceType::None;
        }
        self.unmark_paused(id);

        if self.pending.as_ref().map(|p| p.requester) == Some(id) {
            tracing::debug!(connection = %id, "Pending grant withdrawn");
            // 已让出的实例由下面的恢复逻辑处理，尚未应答的记为 orphaned
            if let Some(pending) = self.pending.take() {
                self.orphaned.extend(pending.waiting);
            }
            self.replay_queued(out);
        } else {
            self.yielded(id, out);
        }

        if self.pending.is_some() || self.instances.iter().any(|i| i.is_active()) {
            return;
        }

        if self.mixing {
            let paused: Vec<ConnectionId> = self.paused_order.clone();
            for paused_id in paused {
                self.resume(paused_id, out);
            }
        } else if let Some(next) = self.priority_resolver(id) {
            self.resume(next, out);
        }
    }

    /// 为已撤回的授予而暂停的实例：设备空闲（或可与当前播放混音）时立即恢复
    fn recall_orphan(&mut self, id: ConnectionId, out: &mut Directives) {
        if !self.orphaned.remove(&id) || self.pending.is_some() {
            return;
        }
        let Some(instance) = self.instance(id).cloned() else {
            return;
        };
        let active: Vec<AudioClientInstance> = self
            .instances
            .iter()
            .filter(|i| i.id != id && i.is_active())
            .cloned()
            .collect();
        if active.is_empty() || self.can_mix(&instance, &active) {
            self.resume(id, out);
        }
    }

    /// 特权实例优先，否则最近被暂停的实例
    fn priority_resolver(&self, sender: ConnectionId) -> Option<ConnectionId> {
        let privileged = self.paused_order.iter().rev().find(|paused| {
            **paused != sender
                && self
                    .instance(**paused)
                    .map(|i| i.is_privileged())
                    .unwrap_or(false)
        });
        privileged
            .or_else(|| self.paused_order.iter().rev().find(|p| **p != sender))
            .copied()
    }

    /// STOPPED 之后：设备空闲则让最近暂停的实例重新获得设备，
    /// 否则（无可恢复实例）唤回特权实例
    fn reinstate(&mut self, sender: ConnectionId, out: &mut Directives) {
        if self.instances.iter().any(|i| i.is_active()) {
            return;
        }

        if let Some(last) = self.paused_order.iter().rev().find(|p| **p != sender).copied() {
            let kind = self
                .instance(last)
                .map(|i| i.kind)
                .unwrap_or(InstanceType::Play);
            self.grant(last, kind, out);
            return;
        }

        let privileged = self
            .instances
            .iter()
            .find(|i| i.id != sender && i.is_privileged() && i.kind != InstanceType::None)
            .map(|i| i.id);
        if let Some(id) = privileged {
            self.resume(id, out);
        }
    }

    fn resume(&mut self, id: ConnectionId, out: &mut Directives) {
        self.set_state(id, InstanceState::Active);
        self.unmark_paused(id);
        tracing::info!(connection = %id, "Audio client resumed");
        out.push((id, ServerDirective::Resume));
    }

    fn set_state(&mut self, id: ConnectionId, state: InstanceState) {
        if let Some(instance) = self.instance_mut(id) {
            instance.state = state;
        }
    }

    fn mark_paused(&mut self, id: ConnectionId) {
        self.unmark_paused(id);
        self.paused_order.push(id);
    }

    fn unmark_paused(&mut self, id: ConnectionId) {
        self.paused_order.retain(|p| *p != id);
    }

    pub fn instance(&self, id: ConnectionId) -> Option<&AudioClientInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    fn instance_mut(&mut self, id: ConnectionId) -> Option<&mut AudioClientInstance> {
        self.instances.iter_mut().find(|i| i.id == id)
    }

    pub fn active_instances(&self) -> Vec<ConnectionId> {
        self.instances
            .iter()
            .filter(|i| i.is_active())
            .map(|i| i.id)
            .collect()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn is_mixing(&self) -> bool {
        self.mixing
    }

    fn publish(&self) {
        self.status.set_attribute(
            &media_path(&["Audio", "Instances"]),
            json!(self.instances),
        );
        self.status.set_attribute(
            &media_path(&["Audio", "Active"]),
            json!(self
                .active_instances()
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::arbitration::testing::RecordingStatus;

    const A: ConnectionId = ConnectionId::new(1);
    const B: ConnectionId = ConnectionId::new(2);
    const C: ConnectionId = ConnectionId::new(3);

    fn server(mixing: bool) -> AudioInterfaceServer {
        let exclusive = ["Ring", "RingTone", "Phone"].iter().map(|s| s.to_string());
        let mut server =
            AudioInterfaceServer::new(mixing, exclusive, Arc::new(RecordingStatus::default()));
        for id in [A, B, C] {
            assert_eq!(server.connect(id), vec![(id, ServerDirective::Active)]);
        }
        server
    }

    fn send(server: &mut AudioInterfaceServer, id: ConnectionId, line: &str) -> Directives {
        let out = server.handle_line(id, line);
        if !server.is_mixing() {
            assert!(server.active_instances().len() <= 1, "two active instances after {}", line);
        }
        out
    }

    #[test]
    fn test_idle_play_is_granted() {
        let mut server = server(false);
        assert_eq!(send(&mut server, A, "--- PLAY"), vec![(A, ServerDirective::Ready)]);
        assert_eq!(server.active_instances(), vec![A]);
    }

    #[test]
    fn test_same_domain_playback_mixes() {
        let mut server = server(true);
        send(&mut server, A, "--- PLAY");
        assert_eq!(send(&mut server, B, "--- PLAY"), vec![(B, ServerDirective::Ready)]);
        assert_eq!(server.active_instances(), vec![A, B]);
    }

    #[test]
    fn test_non_mixing_play_waits_for_pause() {
        let mut server = server(false);
        send(&mut server, A, "--- PLAY");

        assert_eq!(send(&mut server, B, "--- PLAY"), vec![(A, ServerDirective::Pause)]);
        assert_eq!(server.active_instances(), vec![A]);

        assert_eq!(send(&mut server, A, "--- PAUSED"), vec![(B, ServerDirective::Ready)]);
        assert_eq!(server.active_instances(), vec![B]);

        assert_eq!(send(&mut server, B, "--- DONE"), vec![(A, ServerDirective::Resume)]);
        assert_eq!(server.active_instances(), vec![A]);
    }

    #[test]
    fn test_privileged_incumbent_is_never_stopped() {
        let mut server = server(false);
        assert_eq!(send(&mut server, A, "--- DOMAIN MediaServer"), vec![(A, ServerDirective::Ack)]);
        send(&mut server, A, "--- PLAY");

        send(&mut server, B, "--- DOMAIN RingTone");
        assert_eq!(send(&mut server, B, "--- PLAY"), vec![(A, ServerDirective::Pause)]);
        assert!(!server.instance(B).unwrap().is_active());
        assert_eq!(server.active_instances(), vec![A]);

        // 特权实例自行让出后 B 才获得设备
        assert_eq!(send(&mut server, A, "--- PAUSED"), vec![(B, ServerDirective::Ready)]);
        assert_eq!(server.active_instances(), vec![B]);
    }

    #[test]
    fn test_privileged_requester_pauses_incumbent() {
        let mut server = server(false);
        send(&mut server, A, "--- DOMAIN Phone");
        send(&mut server, A, "--- PLAY");

        send(&mut server, B, "--- DOMAIN MediaServer");
        assert_eq!(send(&mut server, B, "--- PLAY"), vec![(A, ServerDirective::Pause)]);
    }

    #[test]
    fn test_exclusive_domain_stops_incumbent() {
        let mut server = server(true);
        send(&mut server, A, "--- PLAY");
        send(&mut server, B, "--- DOMAIN RingTone");

        assert_eq!(send(&mut server, B, "--- PLAY"), vec![(A, ServerDirective::StopAll)]);
        assert_eq!(send(&mut server, A, "--- STOPPED"), vec![(B, ServerDirective::Ready)]);

        assert!(send(&mut server, B, "--- DONE").is_empty());
        assert!(server.active_instances().is_empty());
    }

    #[test]
    fn test_record_is_exclusive_even_when_mixing() {
        let mut server = server(true);
        send(&mut server, A, "--- PLAY");
        send(&mut server, B, "--- DOMAIN MediaServer");
        send(&mut server, B, "--- PLAY");
        assert_eq!(server.active_instances(), vec![A, B]);

        let out = send(&mut server, C, "--- RECORD");
        assert_eq!(
            out,
            vec![(A, ServerDirective::StopAll), (B, ServerDirective::Pause)]
        );
        send(&mut server, A, "--- STOPPED");
        assert_eq!(send(&mut server, B, "--- PAUSED"), vec![(C, ServerDirective::Ready)]);
        assert_eq!(server.instance(C).unwrap().kind, InstanceType::Record);
    }

    #[test]
    fn test_requests_during_grant_are_queued() {
        let mut server = server(false);
        send(&mut server, A, "--- PLAY");
        send(&mut server, B, "--- PLAY");
        assert!(send(&mut server, C, "--- PLAY").is_empty());

        let out = send(&mut server, A, "--- PAUSED");
        assert_eq!(out, vec![(B, ServerDirective::Ready), (B, ServerDirective::Pause)]);

        assert_eq!(send(&mut server, B, "--- PAUSED"), vec![(C, ServerDirective::Ready)]);

        // 特权者不在，恢复最近被暂停的 B
        assert_eq!(send(&mut server, C, "--- DONE"), vec![(B, ServerDirective::Resume)]);
    }

    #[test]
    fn test_done_prefers_privileged_paused_instance() {
        let mut server = server(false);
        send(&mut server, A, "--- DOMAIN MediaServer");
        send(&mut server, A, "--- PLAY");
        send(&mut server, B, "--- PLAY");
        send(&mut server, A, "--- PAUSED");
        send(&mut server, C, "--- PLAY");
        send(&mut server, B, "--- PAUSED");

        assert_eq!(send(&mut server, C, "--- DONE"), vec![(A, ServerDirective::Resume)]);
    }

    #[test]
    fn test_stopped_reinstates_last_paused() {
        let mut server = server(false);
        send(&mut server, A, "--- PLAY");
        send(&mut server, B, "--- PLAY");
        send(&mut server, A, "--- PAUSED");

        assert_eq!(send(&mut server, B, "--- STOPPED"), vec![(A, ServerDirective::Ready)]);
        assert_eq!(server.active_instances(), vec![A]);
    }

    #[test]
    fn test_disconnect_of_waiting_incumbent_grants_requester() {
        let mut server = server(false);
        send(&mut server, A, "--- PLAY");
        send(&mut server, B, "--- PLAY");

        assert_eq!(server.disconnect(A), vec![(B, ServerDirective::Ready)]);
        assert_eq!(server.instance_count(), 2);
        assert!(server.instance(A).is_none());
    }

    #[test]
    fn test_withdrawn_grant_resumes_late_yielder() {
        let mut server = server(false);
        send(&mut server, A, "--- PLAY");
        assert_eq!(send(&mut server, B, "--- PLAY"), vec![(A, ServerDirective::Pause)]);

        assert!(server.disconnect(B).is_empty());
        assert_eq!(send(&mut server, A, "--- PAUSED"), vec![(A, ServerDirective::Resume)]);
        assert_eq!(server.active_instances(), vec![A]);
    }

    #[test]
    fn test_done_before_answer_resumes_late_yielder() {
        let mut server = server(false);
        send(&mut server, A, "--- PLAY");
        send(&mut server, B, "--- PLAY");

        assert!(send(&mut server, B, "--- DONE").is_empty());
        assert_eq!(send(&mut server, A, "--- PAUSED"), vec![(A, ServerDirective::Resume)]);
        assert_eq!(server.active_instances(), vec![A]);
    }

    #[test]
    fn test_late_yielder_waits_when_device_taken() {
        let mut server = server(false);
        send(&mut server, A, "--- PLAY");
        send(&mut server, B, "--- PLAY");
        send(&mut server, C, "--- PLAY");

        // C 的请求在 B 撤回后重放，A 的 PAUSED 完成 C 的授予
        assert_eq!(server.disconnect(B), vec![(A, ServerDirective::Pause)]);
        assert_eq!(send(&mut server, A, "--- PAUSED"), vec![(C, ServerDirective::Ready)]);
        assert_eq!(server.active_instances(), vec![C]);

        assert_eq!(send(&mut server, C, "--- DONE"), vec![(A, ServerDirective::Resume)]);
    }

    #[test]
    fn test_mixing_done_resumes_every_paused_instance() {
        let mut server = server(true);
        send(&mut server, A, "--- PLAY");
        assert_eq!(send(&mut server, B, "--- PLAY"), vec![(B, ServerDirective::Ready)]);

        send(&mut server, C, "--- DOMAIN Alarm");
        assert_eq!(
            send(&mut server, C, "--- PLAY"),
            vec![(A, ServerDirective::Pause), (B, ServerDirective::Pause)]
        );
        assert!(send(&mut server, A, "--- PAUSED").is_empty());
        assert_eq!(send(&mut server, B, "--- PAUSED"), vec![(C, ServerDirective::Ready)]);
        assert_eq!(server.active_instances(), vec![C]);

        let resumed = send(&mut server, C, "--- DONE");
        assert_eq!(resumed.len(), 2);
        assert!(resumed.contains(&(A, ServerDirective::Resume)));
        assert!(resumed.contains(&(B, ServerDirective::Resume)));
        assert_eq!(server.active_instances(), vec![A, B]);
    }

    #[test]
    fn test_malformed_lines_are_dropped() {
        let mut server = server(false);
        assert!(send(&mut server, A, "PLAY").is_empty());
        assert!(send(&mut server, A, "--- JUMP").is_empty());
        assert!(send(&mut server, A, "--- PRIORITY high").is_empty());
        assert_eq!(send(&mut server, A, "--- PRIORITY 7"), vec![(A, ServerDirective::Ack)]);
        assert_eq!(server.instance(A).unwrap().priority, 7);
        assert_eq!(send(&mut server, A, "--- PLAY"), vec![(A, ServerDirective::Ready)]);
    }
}
