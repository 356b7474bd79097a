//! Shared per-category refresh timer
//!
//! Records the last successful display for one ad category and computes
//! the cooldown remaining before the category may show again. One timer is
//! shared by `Arc` across every unit of its category, so a successful show
//! on any unit delays all of its siblings: the provider's pacing limit
//! applies to the category as a whole.
//!
//! Built on `tokio::time::Instant` so cooldown behavior is testable under
//! paused time.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Cooldown bookkeeping for one ad category.
///
/// Stored as the instant the cooldown expires; `mark_shown` pushes it
/// `interval` into the future, `with_warmup` pre-seeds it so the first
/// show of the category is artificially delayed.
#[derive(Debug)]
pub struct RefreshTimer {
    interval: Duration,
    cooldown_until: Mutex<Option<Instant>>,
}

impl RefreshTimer {
    /// An interval of zero means unlimited, the timer is always ready.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cooldown_until: Mutex::new(None),
        }
    }

    /// Pre-seed the timer so the first show is artificially delayed by
    /// `warmup`. A warmup longer than the interval is clamped to the
    /// interval; a zero interval cannot carry a warmup.
    pub fn with_warmup(interval: Duration, warmup: Duration) -> Self {
        let until = if !interval.is_zero() && !warmup.is_zero() {
            Some(Instant::now() + warmup.min(interval))
        } else {
            None
        };
        Self {
            interval,
            cooldown_until: Mutex::new(until),
        }
    }

    /// Configured minimum time between successful displays.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Remaining cooldown; zero when unlimited or never shown.
    pub async fn remaining(&self) -> Duration {
        if self.interval.is_zero() {
            return Duration::ZERO;
        }
        match *self.cooldown_until.lock().await {
            Some(until) => until.saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }

    /// True when the category may show again.
    pub async fn is_ready(&self) -> bool {
        self.remaining().await.is_zero()
    }

    /// Record a successful display, restarting the cooldown. Visible to
    /// every unit sharing this timer.
    pub async fn mark_shown(&self) {
        *self.cooldown_until.lock().await = Some(Instant::now() + self.interval);
    }
}
