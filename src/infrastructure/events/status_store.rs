//! Status Store Implementation
//!
//! 分层属性存储（`/Media/...`），写入时广播变化，供 HTTP / WebSocket 读取

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::application::ports::StatusPublisherPort;

/// 属性变化事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusChange {
    Set { path: String, value: Value },
    Removed { path: String },
}

impl StatusChange {
    pub fn path(&self) -> &str {
        match self {
            StatusChange::Set { path, .. } | StatusChange::Removed { path } => path,
        }
    }
}

pub struct StatusStore {
    values: DashMap<String, Value>,
    changes: broadcast::Sender<StatusChange>,
}

impl StatusStore {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            values: DashMap::new(),
            changes: tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.changes.subscribe()
    }

    pub fn value(&self, path: &str) -> Option<Value> {
        self.values.get(&normalize(path)).map(|v| v.value().clone())
    }

    /// 以嵌套 JSON 对象返回 `prefix` 下的所有属性
    pub fn subtree(&self, prefix: &str) -> Value {
        let prefix = normalize(prefix);
        if let Some(leaf) = self.values.get(&prefix) {
            return leaf.value().clone();
        }

        let mut entries: Vec<(String, Value)> = self
            .values
            .iter()
            .filter_map(|entry| {
                let rest = relative(entry.key(), &prefix)?;
                Some((rest.to_string(), entry.value().clone()))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut root = Map::new();
        for (path, value) in entries {
            insert_nested(&mut root, &path, value);
        }
        Value::Object(root)
    }

    fn broadcast(&self, change: StatusChange) {
        if let Err(e) = self.changes.send(change) {
            tracing::trace!(error = %e, "Status change dropped (no subscribers)");
        }
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPublisherPort for StatusStore {
    fn set_attribute(&self, path: &str, value: Value) {
        let path = normalize(path);
        let changed = self
            .values
            .insert(path.clone(), value.clone())
            .map(|old| old != value)
            .unwrap_or(true);
        if changed {
            self.broadcast(StatusChange::Set { path, value });
        }
    }

    fn remove_attribute(&self, path: &str) {
        let path = normalize(path);
        let removed: Vec<String> = self
            .values
            .iter()
            .filter(|entry| entry.key() == &path || relative(entry.key(), &path).is_some())
            .map(|entry| entry.key().clone())
            .collect();

        for key in removed {
            self.values.remove(&key);
            self.broadcast(StatusChange::Removed { path: key });
        }
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}

/// `path` 相对 `prefix` 的部分（不在其下时返回 None）
fn relative<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix == "/" {
        return path.strip_prefix('/');
    }
    path.strip_prefix(prefix)?.strip_prefix('/')
}

fn insert_nested(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut parts = path.split('/').peekable();
    let mut node = root;
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            node.insert(part.to_string(), value);
            return;
        }
        let child = node
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        node = match child.as_object_mut() {
            Some(map) => map,
            None => return,
        };
    }
}
