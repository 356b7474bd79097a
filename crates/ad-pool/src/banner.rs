//! Banner ad unit
//!
//! Banners have no load phase: the provider fetches and displays in one
//! call, and the unit only tracks whether a banner is currently on screen.
//! The lifecycle collapses to `None` and `Playing`. Showing while already
//! playing is allowed and refreshes the creative, subject to the same
//! shared cooldown as a first show.

use crate::classify::classify_failure;
use crate::config::CategorySettings;
use crate::error::{Error, Result};
use crate::timer::RefreshTimer;
use crate::unit::{ErrorBudget, LifecycleState};
use provider::{AdProvider, ErrorClassification};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

struct BannerInner {
    state: LifecycleState,
    budget: ErrorBudget,
}

/// A banner slot bound to one placement.
pub struct BannerUnit {
    placement_id: String,
    settings: CategorySettings,
    timer: Arc<RefreshTimer>,
    provider: Arc<dyn AdProvider>,
    inner: Mutex<BannerInner>,
}

impl BannerUnit {
    pub fn new(
        placement_id: impl Into<String>,
        settings: CategorySettings,
        timer: Arc<RefreshTimer>,
        provider: Arc<dyn AdProvider>,
    ) -> Self {
        Self {
            placement_id: placement_id.into(),
            settings,
            timer,
            provider,
            inner: Mutex::new(BannerInner {
                state: LifecycleState::None,
                budget: ErrorBudget::new(),
            }),
        }
    }

    pub fn placement_id(&self) -> &str {
        &self.placement_id
    }

    pub async fn state(&self) -> LifecycleState {
        self.inner.lock().await.state
    }

    pub async fn budget(&self) -> ErrorBudget {
        self.inner.lock().await.budget
    }

    pub async fn is_showing(&self) -> bool {
        self.inner.lock().await.state == LifecycleState::Playing
    }

    /// Fetch and display the banner, or refresh the one already showing.
    ///
    /// The on-screen state only changes when the provider succeeds, so a
    /// failed refresh leaves the current banner up.
    pub async fn show(&self) -> Result<()> {
        {
            let inner = self.inner.lock().await;
            if inner.budget.is_exhausted(self.settings.max_load_errors) {
                debug!(placement_id = %self.placement_id, "banner show refused, error budget exhausted");
                return Err(Error::ErrorBudgetExhausted);
            }
            let remaining = self.timer.remaining().await;
            if !remaining.is_zero() {
                debug!(
                    placement_id = %self.placement_id,
                    remaining_secs = remaining.as_secs_f64(),
                    "banner show refused, cooldown active"
                );
                return Err(Error::CooldownActive {
                    remaining_secs: remaining.as_secs_f64(),
                });
            }
        }

        match self.provider.load_and_show_banner(&self.placement_id).await {
            Ok(()) => {
                {
                    let mut inner = self.inner.lock().await;
                    inner.state = LifecycleState::Playing;
                    inner.budget.reset();
                }
                self.timer.mark_shown().await;
                metrics::counter!(
                    "ad_shows_total",
                    "category" => "banner",
                    "outcome" => "success"
                )
                .increment(1);
                info!(placement_id = %self.placement_id, "banner showing");
                Ok(())
            }
            Err(failure) => {
                let class = classify_failure(&failure);
                metrics::counter!(
                    "ad_shows_total",
                    "category" => "banner",
                    "outcome" => match class {
                        ErrorClassification::RateLimited => "rate_limited",
                        ErrorClassification::NoFill => "no_fill",
                        ErrorClassification::Recoverable => "error",
                    }
                )
                .increment(1);
                let mut inner = self.inner.lock().await;
                match class {
                    ErrorClassification::RateLimited => {
                        debug!(placement_id = %self.placement_id, "banner show rate limited");
                    }
                    ErrorClassification::NoFill => {
                        warn!(
                            placement_id = %self.placement_id,
                            "no fill for banner placement, retiring unit"
                        );
                        inner.budget.retire();
                    }
                    ErrorClassification::Recoverable => {
                        inner.budget.record_failure();
                        warn!(
                            placement_id = %self.placement_id,
                            errors = ?inner.budget.error_count(),
                            error = %failure,
                            "banner show failed"
                        );
                    }
                }
                drop(inner);
                Err(Error::Provider(failure))
            }
        }
    }

    /// Take the banner off screen. Only valid while one is showing; a
    /// provider failure leaves the on-screen state intact.
    pub async fn hide(&self) -> Result<()> {
        {
            let inner = self.inner.lock().await;
            if inner.state != LifecycleState::Playing {
                debug!(placement_id = %self.placement_id, "hide refused, no banner showing");
                return Err(Error::NotPlaying);
            }
        }

        match self.provider.hide_banner().await {
            Ok(()) => {
                self.inner.lock().await.state = LifecycleState::None;
                info!(placement_id = %self.placement_id, "banner hidden");
                Ok(())
            }
            Err(failure) => {
                warn!(
                    placement_id = %self.placement_id,
                    error = %failure,
                    "banner hide failed"
                );
                Err(Error::Provider(failure))
            }
        }
    }
}
