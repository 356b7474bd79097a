//! Deferred load scheduling
//!
//! A failed or consumed unit does not retry inline; it spawns a task that
//! sleeps out the delay and then re-enters `load()`. The fresh call passes
//! through the same guards as any other, so a retry scheduled before the
//! unit retired or exhausted its budget is harmlessly refused when it
//! finally fires.

use crate::unit::StatefulUnit;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Spawn a deferred `load()` for `unit` after `delay`.
///
/// The returned handle lets the owner cancel a pending attempt when a
/// newer one supersedes it.
pub fn schedule_load(unit: Arc<StatefulUnit>, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(error) = unit.load().await {
            // load() already charged the budget and rescheduled if that
            // was warranted; here the attempt just did not go through.
            debug!(
                placement_id = %unit.placement_id(),
                category = unit.category().name(),
                %error,
                "deferred load did not complete"
            );
        }
    })
}
