//! Audio State Port - 系统音频状态管理
//!
//! DomainManager 在切换活动领域前先向后端提交，后端拒绝则切换失败

/// Audio State Port
pub trait AudioStatePort: Send + Sync {
    /// 切换音频路由到指定领域，返回是否成功
    fn set_domain(&self, domain: &str) -> bool;
}
