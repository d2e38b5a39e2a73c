//! DRM Session - `qtopia://` 受保护内容的会话装饰器
//!
//! 开始播放前向 ContentLicensePort 申请授权，没有授权则不启动；
//! 停止或销毁时释放授权

use std::sync::Arc;

use url::Url;

use crate::application::ports::ContentLicensePort;
use crate::domain::session::{MediaSession, PlayerState, SessionId};

/// 受保护内容使用的 scheme
pub const DRM_SCHEME: &str = "qtopia";

pub struct DrmSession {
    inner: Box<dyn MediaSession>,
    url: Url,
    license: Arc<dyn ContentLicensePort>,
    licensed: bool,
}

impl DrmSession {
    pub fn new(inner: Box<dyn MediaSession>, url: Url, license: Arc<dyn ContentLicensePort>) -> Self {
        Self {
            inner,
            url,
            license,
            licensed: false,
        }
    }

    fn release_license(&mut self) {
        if self.licensed {
            self.license.end_playback(&self.url);
            self.licensed = false;
        }
    }
}

impl MediaSession for DrmSession {
    fn id(&self) -> &SessionId {
        self.inner.id()
    }

    fn domain(&self) -> &str {
        self.inner.domain()
    }

    fn set_domain(&mut self, domain: &str) {
        self.inner.set_domain(domain);
    }

    fn start(&mut self) {
        if !self.licensed {
            if !self.license.begin_playback(&self.url) {
                tracing::warn!(
                    session_id = %self.inner.id(),
                    url = %self.url,
                    "No license for protected content, not starting"
                );
                return;
            }
            self.licensed = true;
        }
        self.inner.start();
    }

    fn pause(&mut self) {
        self.inner.pause();
    }

    fn stop(&mut self) {
        self.inner.stop();
        self.release_license();
    }

    fn suspend(&mut self) {
        self.inner.suspend();
    }

    fn resume(&mut self) {
        self.inner.resume();
    }

    fn seek(&mut self, position_ms: u64) {
        self.inner.seek(position_ms);
    }

    fn player_state(&self) -> PlayerState {
        self.inner.player_state()
    }

    fn length(&self) -> u64 {
        self.inner.length()
    }

    fn position(&self) -> u64 {
        self.inner.position()
    }

    fn volume(&self) -> u8 {
        self.inner.volume()
    }

    fn set_volume(&mut self, volume: u8) {
        self.inner.set_volume(volume);
    }

    fn is_muted(&self) -> bool {
        self.inner.is_muted()
    }

    fn set_muted(&mut self, muted: bool) {
        self.inner.set_muted(muted);
    }

    fn into_wrapped(mut self: Box<Self>) -> Option<Box<dyn MediaSession>> {
        self.release_license();
        let this = *self;
        Some(this.inner)
    }
}
