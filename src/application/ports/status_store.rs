//! Status Publisher Port - 状态发布
//!
//! 层级属性存储（如 `/Media/Domains/Active`），观察者按路径订阅变化

use serde_json::Value;

/// 状态根路径
pub const MEDIA_ROOT: &str = "/Media";

/// Status Publisher Port
pub trait StatusPublisherPort: Send + Sync {
    fn set_attribute(&self, path: &str, value: Value);

    /// 删除路径及其所有子路径
    fn remove_attribute(&self, path: &str);
}

/// 拼接 `/Media/...` 路径
pub fn media_path(segments: &[&str]) -> String {
    let mut path = String::from(MEDIA_ROOT);
    for segment in segments {
        path.push('/');
        path.push_str(segment.trim_matches('/'));
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_path() {
        assert_eq!(media_path(&["Domains", "Active"]), "/Media/Domains/Active");
        assert_eq!(media_path(&["Sessions", "/abc/", "State"]), "/Media/Sessions/abc/State");
        assert_eq!(media_path(&[]), "/Media");
    }
}
