//! Error types for ad lifecycle operations

use provider::ProviderFailure;

/// Errors from unit, pool and manager operations.
///
/// State-guard, budget and cooldown violations are reported synchronously
/// and never retried automatically. `Provider` failures may additionally
/// trigger local recovery (counter increment, rollback, scheduled retry)
/// before being rethrown.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("too many ad instances: {category} pool already holds {capacity}")]
    CapacityExceeded {
        category: &'static str,
        capacity: usize,
    },

    #[error("not ready for load: unit is {state}")]
    InvalidStateForLoad { state: &'static str },

    #[error("not ready for play: unit is {state}")]
    InvalidStateForShow { state: &'static str },

    #[error("banner is not showing")]
    NotPlaying,

    #[error("cooldown active: {remaining_secs:.1}s until the category may show again")]
    CooldownActive { remaining_secs: f64 },

    #[error("too many errors: unit is out of error budget")]
    ErrorBudgetExhausted,

    #[error("no ready ad instance for category {0}")]
    NoReadyInstance(&'static str),

    #[error("operation not supported by the provider: {0}")]
    CapabilityUnsupported(&'static str),

    #[error(transparent)]
    Provider(#[from] ProviderFailure),
}

/// Result alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;
