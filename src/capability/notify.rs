//! User notification contract
//!
//! All user-facing feedback (toasts, overlays, status banners) goes through
//! one interface with a fixed configuration shape. Loading notices stay up
//! until dismissed; everything else auto-hides after a duration.

use uuid::Uuid;

/// Default auto-hide duration for transient notices
pub const DEFAULT_NOTICE_MS: u64 = 8_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
    Loading,
}

/// One user-facing notice
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub kind: NoticeKind,
    pub auto_hide: bool,
    pub duration_ms: u64,
}

impl Notice {
    fn new(kind: NoticeKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            kind,
            auto_hide: kind != NoticeKind::Loading,
            duration_ms: DEFAULT_NOTICE_MS,
        }
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, title, body)
    }

    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, title, body)
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NoticeKind::Warning, title, body)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, title, body)
    }

    pub fn loading(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NoticeKind::Loading, title, body)
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Opaque handle to a shown notice, used to dismiss loading states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoticeHandle(pub Uuid);

impl NoticeHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NoticeHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Rendering collaborator for notices
pub trait Notifier: Send + Sync {
    /// Show a notice and return a handle for later dismissal.
    fn show(&self, notice: Notice) -> NoticeHandle;

    /// Dismiss a notice immediately. Unknown handles are ignored.
    fn dismiss(&self, handle: NoticeHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_notices_auto_hide() {
        let notice = Notice::info("Voice Command", "Heard: \"read\"");
        assert_eq!(notice.kind, NoticeKind::Info);
        assert!(notice.auto_hide);
        assert_eq!(notice.duration_ms, DEFAULT_NOTICE_MS);
    }

    #[test]
    fn test_loading_notice_stays_up() {
        let notice = Notice::loading("Translation", "Translating page content...");
        assert_eq!(notice.kind, NoticeKind::Loading);
        assert!(!notice.auto_hide);
    }

    #[test]
    fn test_duration_override() {
        let notice = Notice::info("t", "b").with_duration_ms(3_000);
        assert_eq!(notice.duration_ms, 3_000);
    }

    #[test]
    fn test_handles_are_unique() {
        assert_ne!(NoticeHandle::new(), NoticeHandle::new());
    }
}
