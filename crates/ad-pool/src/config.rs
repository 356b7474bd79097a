//! Lifecycle settings
//!
//! Every field is required at construction time; there are no implicit
//! defaults. The recommended values live here as named constants so the
//! calling layer supplies them explicitly.

use provider::AdCategory;
use std::time::Duration;

/// Maximum units per category pool.
pub const MAX_UNITS_PER_CATEGORY: usize = 3;

/// Provider pacing limit for interstitials is 30 s; the extra 10 s absorbs
/// network skew between our clock and the provider's.
pub const INTERSTITIAL_REFRESH_INTERVAL: Duration = Duration::from_secs(40);
/// Banner pacing limit, same 10 s slack as interstitials.
pub const BANNER_REFRESH_INTERVAL: Duration = Duration::from_secs(40);
/// Rewarded video has no pacing limit.
pub const REWARDED_VIDEO_REFRESH_INTERVAL: Duration = Duration::ZERO;

/// Consecutive recoverable failures tolerated before a unit is exhausted.
pub const MAX_INTERSTITIAL_ERRORS: u32 = 3;
pub const MAX_REWARDED_VIDEO_ERRORS: u32 = 3;
pub const MAX_BANNER_ERRORS: u32 = 1;

/// Whether a consumed unit schedules its own next load.
pub const AUTO_RELOAD_ON_SHOW: bool = true;

/// Spacing between load() starts within one `load_all` pass, so startup
/// does not burst simultaneous creation calls at the provider.
pub const LOAD_SPACING: Duration = Duration::from_millis(100);

/// Delay before a failed or consumed unit retries its load.
pub const RETRY_DELAY: Duration = Duration::from_millis(500);

/// No artificial delay before the first show of a category.
pub const NO_WARMUP: Duration = Duration::ZERO;

/// Per-category lifecycle settings, shared by every unit in the pool.
#[derive(Debug, Clone, Copy)]
pub struct CategorySettings {
    /// Minimum time between two successful displays. Zero = unlimited.
    pub refresh_interval: Duration,
    /// Artificial cooldown before the very first display. Zero = none.
    pub warmup: Duration,
    /// Error budget per unit. Zero = unlimited.
    pub max_load_errors: u32,
    /// Schedule a reload once a show consumes the unit's resource.
    pub auto_reload_on_show: bool,
}

/// Complete settings for an [`crate::AdManager`].
#[derive(Debug, Clone, Copy)]
pub struct ManagerSettings {
    pub interstitial: CategorySettings,
    pub rewarded_video: CategorySettings,
    pub banner: CategorySettings,
    /// Instance cap per category pool.
    pub capacity: usize,
    /// Spacing between load() starts in `load_all`.
    pub load_spacing: Duration,
    /// Delay before deferred retry/reload attempts.
    pub retry_delay: Duration,
}

impl ManagerSettings {
    /// The recommended production configuration, assembled from the named
    /// constants above.
    pub fn recommended() -> Self {
        Self {
            interstitial: CategorySettings {
                refresh_interval: INTERSTITIAL_REFRESH_INTERVAL,
                warmup: NO_WARMUP,
                max_load_errors: MAX_INTERSTITIAL_ERRORS,
                auto_reload_on_show: AUTO_RELOAD_ON_SHOW,
            },
            rewarded_video: CategorySettings {
                refresh_interval: REWARDED_VIDEO_REFRESH_INTERVAL,
                warmup: NO_WARMUP,
                max_load_errors: MAX_REWARDED_VIDEO_ERRORS,
                auto_reload_on_show: AUTO_RELOAD_ON_SHOW,
            },
            banner: CategorySettings {
                refresh_interval: BANNER_REFRESH_INTERVAL,
                warmup: NO_WARMUP,
                max_load_errors: MAX_BANNER_ERRORS,
                auto_reload_on_show: AUTO_RELOAD_ON_SHOW,
            },
            capacity: MAX_UNITS_PER_CATEGORY,
            load_spacing: LOAD_SPACING,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Settings for one category.
    pub fn category(&self, category: AdCategory) -> &CategorySettings {
        match category {
            AdCategory::Interstitial => &self.interstitial,
            AdCategory::RewardedVideo => &self.rewarded_video,
            AdCategory::Banner => &self.banner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommended_matches_named_constants() {
        let settings = ManagerSettings::recommended();
        assert_eq!(
            settings.interstitial.refresh_interval,
            INTERSTITIAL_REFRESH_INTERVAL
        );
        assert_eq!(
            settings.rewarded_video.refresh_interval,
            Duration::ZERO,
            "rewarded video must be unlimited"
        );
        assert_eq!(settings.banner.max_load_errors, MAX_BANNER_ERRORS);
        assert_eq!(settings.capacity, MAX_UNITS_PER_CATEGORY);
        assert_eq!(settings.load_spacing, LOAD_SPACING);
        assert_eq!(settings.retry_delay, RETRY_DELAY);
    }

    #[test]
    fn category_lookup_maps_each_category() {
        let settings = ManagerSettings::recommended();
        assert_eq!(
            settings.category(AdCategory::Interstitial).max_load_errors,
            MAX_INTERSTITIAL_ERRORS
        );
        assert_eq!(
            settings.category(AdCategory::RewardedVideo).max_load_errors,
            MAX_REWARDED_VIDEO_ERRORS
        );
        assert_eq!(
            settings.category(AdCategory::Banner).max_load_errors,
            MAX_BANNER_ERRORS
        );
    }
}
