//! Access key display
//!
//! A generated key is shown to the local user for a limited window so it can
//! be read out to the caller. Hiding it is purely cosmetic: the broker keeps
//! the key valid until it is consumed or replaced.

use std::time::Duration;

use tokio::time::Instant;

/// Last generated key and when it was issued
#[derive(Debug)]
pub struct AccessKeyDisplay {
    window: Duration,
    current: Option<(String, Instant)>,
}

impl AccessKeyDisplay {
    /// Create an empty display with the given visibility window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            current: None,
        }
    }

    /// Show a freshly generated key, replacing any previous one
    pub fn show(&mut self, key: impl Into<String>) {
        self.current = Some((key.into(), Instant::now()));
    }

    /// The key, while it is still within its display window
    pub fn visible(&self) -> Option<&str> {
        match &self.current {
            Some((key, shown)) if shown.elapsed() < self.window => Some(key.as_str()),
            _ => None,
        }
    }

    /// Time left before the key is hidden
    pub fn remaining(&self) -> Option<Duration> {
        self.current
            .as_ref()
            .map(|(_, shown)| self.window.saturating_sub(shown.elapsed()))
            .filter(|left| !left.is_zero())
    }

    /// Hide the key now
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Display window
    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_key_hidden_after_window() {
        let mut display = AccessKeyDisplay::new(Duration::from_secs(120));
        assert_eq!(display.visible(), None);

        display.show("482913");
        assert_eq!(display.visible(), Some("482913"));

        tokio::time::advance(Duration::from_secs(119)).await;
        assert_eq!(display.visible(), Some("482913"));
        assert_eq!(display.remaining(), Some(Duration::from_secs(1)));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(display.visible(), None);
        assert_eq!(display.remaining(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_key_restarts_window() {
        let mut display = AccessKeyDisplay::new(Duration::from_secs(10));
        display.show("111111");
        tokio::time::advance(Duration::from_secs(8)).await;

        display.show("222222");
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(display.visible(), Some("222222"));
    }

    #[test]
    fn test_clear() {
        let mut display = AccessKeyDisplay::new(Duration::from_secs(10));
        display.show("123456");
        display.clear();
        assert_eq!(display.visible(), None);
    }
}
