//! Provider abstraction for the remote ad network
//!
//! Defines the `AdProvider` and `AdResource` traits that decouple the ad
//! lifecycle policy from any concrete SDK. NullProvider implements the
//! contract for platforms with no ad inventory; real providers implement
//! the same trait on top of their network SDK.

pub mod null;

pub use null::NullProvider;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Ad format class. Each category carries its own rate limit, error budget
/// and instance cap; the set is fixed and never extended at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdCategory {
    Interstitial,
    RewardedVideo,
    Banner,
}

impl AdCategory {
    /// Category label for logging and health reporting.
    pub fn name(&self) -> &'static str {
        match self {
            AdCategory::Interstitial => "interstitial",
            AdCategory::RewardedVideo => "rewarded_video",
            AdCategory::Banner => "banner",
        }
    }
}

/// Classification of provider failures to determine budget/retry strategy.
///
/// The lifecycle layer uses this to drive unit state transitions:
/// - RateLimited leaves the unit intact so the caller can retry after the
///   cooldown elapses (no budget consumed)
/// - NoFill retires the unit permanently
/// - Recoverable counts against the unit's error budget and schedules a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    /// Pacing rejection, shown too soon after the previous display
    RateLimited,
    /// No inventory for this placement, permanent for the identifier
    NoFill,
    /// Anything else: network hiccups, SDK errors, timeouts
    Recoverable,
}

/// Failure code for pacing rejections.
pub const CODE_RATE_LIMITED: &str = "RATE_LIMITED";
/// Failure code for out-of-inventory placements.
pub const CODE_NO_FILL: &str = "ADS_NO_FILL";
/// Failure code reported when the client SDK lacks the requested operation.
pub const CODE_UNSUPPORTED_OPERATION: &str = "CLIENT_UNSUPPORTED_OPERATION";

/// Operation identifier the capability query must list for banner support.
pub const OP_LOAD_AND_SHOW_BANNER: &str = "load_and_show_banner";

/// Opaque failure surfaced by a provider operation.
///
/// `code` is the provider's own classification string; the lifecycle layer
/// reclassifies it into an [`ErrorClassification`] without interpreting
/// anything else about the payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("provider failure [{code}]: {message}")]
pub struct ProviderFailure {
    pub code: String,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Result alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderFailure>;

/// A provider-side ad resource with a load-then-show cycle.
///
/// The resource is exclusively owned by one ad unit from creation until a
/// show cycle completes; `show` consumes the underlying inventory on any
/// terminal outcome, after which the owner discards the handle.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn AdResource>`).
pub trait AdResource: Send + Sync {
    /// Fetch the ad content so a later `show` can display it instantly.
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Display the loaded ad. Suspends until the user dismisses it.
    fn show(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

impl std::fmt::Debug for dyn AdResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdResource")
    }
}

/// Abstraction over a remote ad network SDK.
///
/// Stateful formats (interstitial, rewarded video) go through
/// `create_resource` and the [`AdResource`] cycle. Banners are a single
/// atomic fetch-and-display call with a separate hide operation.
pub trait AdProvider: Send + Sync {
    /// Identifier for logging and diagnostics (e.g. "simulated", "null")
    fn id(&self) -> &str;

    /// Acquire the opaque resource handle for one placement.
    fn create_resource<'a>(
        &'a self,
        category: AdCategory,
        placement_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<dyn AdResource>>> + Send + 'a>>;

    /// Fetch and display a banner in one call. May be invoked repeatedly
    /// for the same placement to refresh the creative.
    fn load_and_show_banner<'a>(
        &'a self,
        placement_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Remove the currently displayed banner.
    fn hide_banner(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Operation identifiers this client supports. Queried once per process
    /// to decide banner availability.
    fn supported_operations(&self) -> Vec<String>;
}
