//! Rolling request/token window

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Dispatch events within the last `window`
///
/// Owned by the scheduling loop alone.
#[derive(Debug)]
pub(crate) struct RollingWindow {
    window: Duration,
    events: VecDeque<(Instant, u64)>,
    tokens: u64,
}

impl RollingWindow {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            events: VecDeque::new(),
            tokens: 0,
        }
    }

    /// Forget events at least `window` old
    pub(crate) fn prune(&mut self, now: Instant) {
        while let Some(&(at, cost)) = self.events.front() {
            if now.duration_since(at) < self.window {
                break;
            }
            self.events.pop_front();
            self.tokens -= cost;
        }
    }

    pub(crate) fn record(&mut self, now: Instant, cost: u64) {
        self.events.push_back((now, cost));
        self.tokens += cost;
    }

    pub(crate) fn requests(&self) -> u64 {
        self.events.len() as u64
    }

    pub(crate) fn tokens(&self) -> u64 {
        self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_prune_drops_expired_events() {
        let mut window = RollingWindow::new(Duration::from_secs(60));
        let start = Instant::now();

        window.record(start, 100);
        window.record(start + Duration::from_secs(30), 50);
        assert_eq!(window.requests(), 2);
        assert_eq!(window.tokens(), 150);

        window.prune(start + Duration::from_secs(59));
        assert_eq!(window.requests(), 2);

        // Exactly one window old is expired
        window.prune(start + Duration::from_secs(60));
        assert_eq!(window.requests(), 1);
        assert_eq!(window.tokens(), 50);

        window.prune(start + Duration::from_secs(120));
        assert_eq!(window.requests(), 0);
        assert_eq!(window.tokens(), 0);
    }
}
