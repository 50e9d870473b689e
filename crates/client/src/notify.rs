//! User-facing notification feed.
//!
//! The SDK never renders UI; it emits [`Notice`] values on a process-wide
//! broadcast feed and lets the embedding application (or the CLI) display
//! them. Emission never blocks and never fails - notices published with no
//! subscriber are simply dropped.

use tokio::sync::broadcast;

const FEED_CAPACITY: usize = 64;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient, user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Handle for publishing and subscribing to the notification feed.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Subscribe to the feed. Each receiver sees notices published after it
    /// subscribed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(NoticeLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(NoticeLevel::Error, message.into());
    }

    fn publish(&self, level: NoticeLevel, message: String) {
        tracing::debug!(?level, %message, "notice");
        let _ = self.tx.send(Notice { level, message });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_receive_notices_in_order() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.success("Item added to cart");
        notifier.error("Access denied.");

        assert_eq!(
            rx.try_recv().expect("first notice"),
            Notice {
                level: NoticeLevel::Success,
                message: "Item added to cart".to_string()
            }
        );
        assert_eq!(
            rx.try_recv().expect("second notice").level,
            NoticeLevel::Error
        );
    }

    #[test]
    fn test_publishing_without_subscribers_does_not_fail() {
        let notifier = Notifier::new();
        notifier.error("nobody listening");
    }
}
