//! Content License Port - DRM 授权
//!
//! `qtopia://` 内容在播放前需要取得授权，停止后释放

use url::Url;

/// Content License Port
pub trait ContentLicensePort: Send + Sync {
    /// 开始播放前调用，返回 false 表示没有授权
    fn begin_playback(&self, url: &Url) -> bool;

    fn end_playback(&self, url: &Url);
}
