//! Transient status lines.

use std::time::{Duration, Instant};

/// How long a status line stays visible.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

/// A status line that reads as cleared once its display time is over.
///
/// The lifetime is fixed at creation and does not depend on whether the
/// operation it reports on is still running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    text: String,
    shown_at: Instant,
    ttl: Duration,
}

impl StatusMessage {
    /// Show `text` from now, for [`STATUS_TTL`].
    pub fn new(text: impl Into<String>) -> Self {
        Self::shown_at(text, Instant::now(), STATUS_TTL)
    }

    #[must_use]
    pub fn shown_at(text: impl Into<String>, shown_at: Instant, ttl: Duration) -> Self {
        Self {
            text: text.into(),
            shown_at,
            ttl,
        }
    }

    /// The text if still visible at `now`.
    #[must_use]
    pub fn text_at(&self, now: Instant) -> Option<&str> {
        (now.saturating_duration_since(self.shown_at) < self.ttl).then_some(self.text.as_str())
    }

    /// The text if still visible.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.text_at(Instant::now())
    }

    /// The text regardless of expiry.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clears_after_ttl() {
        let start = Instant::now();
        let message = StatusMessage::shown_at("Synced 3 leads", start, STATUS_TTL);

        assert_eq!(message.text_at(start), Some("Synced 3 leads"));
        assert_eq!(
            message.text_at(start + Duration::from_millis(2999)),
            Some("Synced 3 leads")
        );
        assert_eq!(message.text_at(start + STATUS_TTL), None);
        assert_eq!(message.text(), "Synced 3 leads");
    }

    #[test]
    fn test_fresh_message_is_visible() {
        assert_eq!(StatusMessage::new("Failed: x").current(), Some("Failed: x"));
    }
}
