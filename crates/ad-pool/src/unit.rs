//! Stateful ad unit lifecycle state machine
//!
//! One unit tracks a single loadable-then-showable slot for an interstitial
//! or rewarded-video placement. The unit owns its opaque provider resource
//! from creation until a show cycle consumes it, and its `state` field is
//! the only mutation guard: entering `Loading`/`Playing` before suspending
//! on the provider prevents any other call path from starting a conflicting
//! operation on the same unit.
//!
//! Transitions:
//! - load: None → New (resource created) → Loading → Loaded
//! - show: Loaded → Playing → None (resource consumed, timer marked)
//! - recoverable load failure → New, budget charged, deferred retry
//! - rate-limited show failure → Loaded, resource preserved
//! - no-fill → `ErrorBudget::Retired`, permanently inert

use crate::classify::classify_failure;
use crate::config::CategorySettings;
use crate::error::{Error, Result};
use crate::retry;
use crate::timer::RefreshTimer;
use provider::{AdCategory, AdProvider, AdResource, ErrorClassification, ProviderFailure};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle phase of an ad unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No resource; the slot is empty.
    None,
    /// Resource acquisition requested or complete, load not yet started.
    New,
    /// Provider load in flight.
    Loading,
    /// Content fetched, ready to show.
    Loaded,
    /// Provider show in flight.
    Playing,
}

impl LifecycleState {
    /// State label for logging and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::None => "none",
            LifecycleState::New => "new",
            LifecycleState::Loading => "loading",
            LifecycleState::Loaded => "loaded",
            LifecycleState::Playing => "playing",
        }
    }
}

/// Consecutive-failure budget with an explicit terminal state.
///
/// `Retired` is sticky: once a no-fill failure retires a unit it never
/// comes back, regardless of the numeric counter or the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorBudget {
    Active { errors: u32 },
    Retired,
}

impl ErrorBudget {
    pub fn new() -> Self {
        ErrorBudget::Active { errors: 0 }
    }

    /// True when further load/show attempts must be refused.
    /// `max_errors` of zero means the numeric budget is unlimited.
    pub fn is_exhausted(&self, max_errors: u32) -> bool {
        match *self {
            ErrorBudget::Retired => true,
            ErrorBudget::Active { errors } => max_errors > 0 && errors >= max_errors,
        }
    }

    /// Charge one recoverable failure. No effect once retired.
    pub fn record_failure(&mut self) {
        if let ErrorBudget::Active { errors } = self {
            *errors += 1;
        }
    }

    /// Reset the counter after a success. Retired stays retired.
    pub fn reset(&mut self) {
        if let ErrorBudget::Active { errors } = self {
            *errors = 0;
        }
    }

    /// Permanently disable the unit.
    pub fn retire(&mut self) {
        *self = ErrorBudget::Retired;
    }

    /// Recoverable-failure count; `None` once retired.
    pub fn error_count(&self) -> Option<u32> {
        match *self {
            ErrorBudget::Active { errors } => Some(errors),
            ErrorBudget::Retired => None,
        }
    }
}

impl Default for ErrorBudget {
    fn default() -> Self {
        Self::new()
    }
}

struct UnitInner {
    state: LifecycleState,
    resource: Option<Arc<dyn AdResource>>,
    budget: ErrorBudget,
    retry: Option<JoinHandle<()>>,
}

/// What a load() call must do after passing the state guard.
enum LoadPlan {
    Create,
    Reuse(Arc<dyn AdResource>),
}

/// A stateful ad slot (interstitial or rewarded video).
///
/// Long-lived: created once via the pool's add operation and never
/// destroyed, cycling through its lifecycle for the process lifetime or
/// until retired.
pub struct StatefulUnit {
    placement_id: String,
    category: AdCategory,
    settings: CategorySettings,
    retry_delay: Duration,
    timer: Arc<RefreshTimer>,
    provider: Arc<dyn AdProvider>,
    inner: Mutex<UnitInner>,
}

impl StatefulUnit {
    pub fn new(
        placement_id: impl Into<String>,
        category: AdCategory,
        settings: CategorySettings,
        retry_delay: Duration,
        timer: Arc<RefreshTimer>,
        provider: Arc<dyn AdProvider>,
    ) -> Self {
        Self {
            placement_id: placement_id.into(),
            category,
            settings,
            retry_delay,
            timer,
            provider,
            inner: Mutex::new(UnitInner {
                state: LifecycleState::None,
                resource: None,
                budget: ErrorBudget::new(),
                retry: None,
            }),
        }
    }

    pub fn placement_id(&self) -> &str {
        &self.placement_id
    }

    pub fn category(&self) -> AdCategory {
        self.category
    }

    pub async fn state(&self) -> LifecycleState {
        self.inner.lock().await.state
    }

    pub async fn budget(&self) -> ErrorBudget {
        self.inner.lock().await.budget
    }

    /// Loaded and holding a resource, so eligible for selection. The shared
    /// timer is checked by the pool, not here.
    pub async fn is_ready(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.state == LifecycleState::Loaded && inner.resource.is_some()
    }

    /// Drive the unit toward `Loaded`: acquire the provider resource on the
    /// first call, then fetch content.
    ///
    /// Rejected synchronously when the budget is exhausted or a load is
    /// already in flight. Provider failures are charged locally (budget,
    /// rollback, deferred retry) and rethrown.
    pub async fn load(self: &Arc<Self>) -> Result<()> {
        let plan = {
            let mut inner = self.inner.lock().await;
            if inner.budget.is_exhausted(self.settings.max_load_errors) {
                debug!(
                    placement_id = %self.placement_id,
                    category = self.category.name(),
                    "load refused, error budget exhausted"
                );
                return Err(Error::ErrorBudgetExhausted);
            }
            match (inner.state, inner.resource.clone()) {
                (LifecycleState::None, _) => {
                    inner.state = LifecycleState::New;
                    LoadPlan::Create
                }
                (LifecycleState::New, Some(resource)) => {
                    // Transition inside the guard's critical section so a
                    // contending load cannot also pass it.
                    inner.state = LifecycleState::Loading;
                    LoadPlan::Reuse(resource)
                }
                // New without a resource means another call is mid-creation
                (state, _) => {
                    debug!(
                        placement_id = %self.placement_id,
                        state = state.name(),
                        "load rejected by state guard"
                    );
                    return Err(Error::InvalidStateForLoad { state: state.name() });
                }
            }
        };

        let resource = match plan {
            LoadPlan::Create => {
                info!(
                    placement_id = %self.placement_id,
                    category = self.category.name(),
                    "acquiring ad resource"
                );
                match self
                    .provider
                    .create_resource(self.category, &self.placement_id)
                    .await
                {
                    Ok(resource) => {
                        let mut inner = self.inner.lock().await;
                        inner.resource = Some(Arc::clone(&resource));
                        inner.state = LifecycleState::Loading;
                        resource
                    }
                    Err(failure) => return self.fail_load(failure).await,
                }
            }
            LoadPlan::Reuse(resource) => resource,
        };

        debug!(placement_id = %self.placement_id, "loading ad");

        match resource.load().await {
            Ok(()) => {
                let mut inner = self.inner.lock().await;
                inner.state = LifecycleState::Loaded;
                inner.budget.reset();
                metrics::counter!(
                    "ad_loads_total",
                    "category" => self.category.name(),
                    "outcome" => "success"
                )
                .increment(1);
                info!(
                    placement_id = %self.placement_id,
                    category = self.category.name(),
                    "ad loaded"
                );
                Ok(())
            }
            Err(failure) => self.fail_load(failure).await,
        }
    }

    /// Display the loaded ad. Rejected synchronously when the budget is
    /// exhausted, the unit is not loaded, or the shared cooldown is active.
    pub async fn show(self: &Arc<Self>) -> Result<()> {
        let resource = {
            let mut inner = self.inner.lock().await;
            if inner.budget.is_exhausted(self.settings.max_load_errors) {
                debug!(placement_id = %self.placement_id, "show refused, error budget exhausted");
                return Err(Error::ErrorBudgetExhausted);
            }
            let resource = match (inner.state, inner.resource.clone()) {
                (LifecycleState::Loaded, Some(resource)) => resource,
                (state, _) => {
                    debug!(
                        placement_id = %self.placement_id,
                        state = state.name(),
                        "show rejected by state guard"
                    );
                    return Err(Error::InvalidStateForShow { state: state.name() });
                }
            };
            let remaining = self.timer.remaining().await;
            if !remaining.is_zero() {
                debug!(
                    placement_id = %self.placement_id,
                    remaining_secs = remaining.as_secs_f64(),
                    "show refused, cooldown active"
                );
                return Err(Error::CooldownActive {
                    remaining_secs: remaining.as_secs_f64(),
                });
            }
            inner.state = LifecycleState::Playing;
            resource
        };

        info!(
            placement_id = %self.placement_id,
            category = self.category.name(),
            "showing ad"
        );

        match resource.show().await {
            Ok(()) => {
                {
                    let mut inner = self.inner.lock().await;
                    inner.resource = None;
                    inner.state = LifecycleState::None;
                }
                self.timer.mark_shown().await;
                metrics::counter!(
                    "ad_shows_total",
                    "category" => self.category.name(),
                    "outcome" => "success"
                )
                .increment(1);
                info!(placement_id = %self.placement_id, "ad shown, resource consumed");
                if self.settings.auto_reload_on_show {
                    self.schedule_reload().await;
                }
                Ok(())
            }
            Err(failure) => self.fail_show(failure).await,
        }
    }

    /// Local recovery for a failed load (or resource creation), then
    /// rethrow.
    async fn fail_load(self: &Arc<Self>, failure: ProviderFailure) -> Result<()> {
        let class = classify_failure(&failure);
        metrics::counter!(
            "ad_loads_total",
            "category" => self.category.name(),
            "outcome" => outcome_label(class)
        )
        .increment(1);

        let mut inner = self.inner.lock().await;
        match class {
            ErrorClassification::NoFill => {
                warn!(
                    placement_id = %self.placement_id,
                    category = self.category.name(),
                    "no fill for placement, retiring unit"
                );
                inner.budget.retire();
                // A unit that never acquired its resource falls back to
                // empty; one retired mid-load keeps the handle it owns.
                if inner.resource.is_none() {
                    inner.state = LifecycleState::None;
                }
            }
            _ => {
                inner.budget.record_failure();
                inner.state = if inner.resource.is_some() {
                    LifecycleState::New
                } else {
                    LifecycleState::None
                };
                warn!(
                    placement_id = %self.placement_id,
                    errors = ?inner.budget.error_count(),
                    error = %failure,
                    "ad load failed, deferred retry scheduled"
                );
                let handle = retry::schedule_load(Arc::clone(self), self.retry_delay);
                if let Some(previous) = inner.retry.replace(handle) {
                    previous.abort();
                }
            }
        }
        drop(inner);
        Err(Error::Provider(failure))
    }

    /// Local recovery for a failed show, then rethrow.
    async fn fail_show(self: &Arc<Self>, failure: ProviderFailure) -> Result<()> {
        let class = classify_failure(&failure);
        metrics::counter!(
            "ad_shows_total",
            "category" => self.category.name(),
            "outcome" => outcome_label(class)
        )
        .increment(1);

        match class {
            ErrorClassification::RateLimited => {
                // Pacing rejection: the resource is still intact, so roll
                // back and let the caller retry once the timer allows.
                let mut inner = self.inner.lock().await;
                inner.state = LifecycleState::Loaded;
                debug!(
                    placement_id = %self.placement_id,
                    "show rate limited, rolled back to loaded"
                );
            }
            _ => {
                let mut inner = self.inner.lock().await;
                inner.resource = None;
                inner.state = LifecycleState::None;
                warn!(
                    placement_id = %self.placement_id,
                    error = %failure,
                    "ad show failed, resource discarded"
                );
                drop(inner);
                if self.settings.auto_reload_on_show {
                    self.schedule_reload().await;
                }
            }
        }
        Err(Error::Provider(failure))
    }

    async fn schedule_reload(self: &Arc<Self>) {
        debug!(placement_id = %self.placement_id, "scheduling reload");
        let handle = retry::schedule_load(Arc::clone(self), self.retry_delay);
        let mut inner = self.inner.lock().await;
        if let Some(previous) = inner.retry.replace(handle) {
            previous.abort();
        }
    }
}

fn outcome_label(class: ErrorClassification) -> &'static str {
    match class {
        ErrorClassification::RateLimited => "rate_limited",
        ErrorClassification::NoFill => "no_fill",
        ErrorClassification::Recoverable => "error",
    }
}
