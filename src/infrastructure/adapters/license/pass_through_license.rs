//! Pass-through Content License
//!
//! 对所有受保护内容直接放行，只记录当前正在播放的数量

use std::sync::atomic::{AtomicUsize, Ordering};

use url::Url;

use crate::application::ports::ContentLicensePort;

#[derive(Default)]
pub struct PassThroughLicense {
    active: AtomicUsize,
}

impl PassThroughLicense {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_playbacks(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl ContentLicensePort for PassThroughLicense {
    fn begin_playback(&self, url: &Url) -> bool {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(url = %url, active, "License granted");
        true
    }

    fn end_playback(&self, url: &Url) {
        let _ = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        tracing::debug!(url = %url, "License released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_active_playbacks() {
        let license = PassThroughLicense::new();
        let url = Url::parse("qtopia:///drm/track.mp3").unwrap();

        assert!(license.begin_playback(&url));
        assert_eq!(license.active_playbacks(), 1);
        license.end_playback(&url);
        license.end_playback(&url);
        assert_eq!(license.active_playbacks(), 0);
    }
}
