//! Top-level ad manager
//!
//! One manager per provider session. It owns the three category pools,
//! wires each to its shared refresh timer, and exposes the host-facing
//! surface: register placements, preload, query readiness, show, and
//! snapshot health. Banner operations are additionally gated on the
//! provider's advertised capability, checked once and memoized.

use crate::banner::BannerUnit;
use crate::config::ManagerSettings;
use crate::error::{Error, Result};
use crate::pool::AdPool;
use crate::timer::RefreshTimer;
use crate::unit::StatefulUnit;
use provider::{AdCategory, AdProvider, OP_LOAD_AND_SHOW_BANNER};
use serde_json::json;
use std::sync::{Arc, OnceLock};
use tracing::info;

pub struct AdManager {
    provider: Arc<dyn AdProvider>,
    settings: ManagerSettings,
    interstitials: Arc<AdPool<StatefulUnit>>,
    rewarded: Arc<AdPool<StatefulUnit>>,
    banners: Arc<AdPool<BannerUnit>>,
    banner_supported: OnceLock<bool>,
}

impl AdManager {
    pub fn new(provider: Arc<dyn AdProvider>, settings: ManagerSettings) -> Self {
        Self {
            interstitials: pool_for(&settings, AdCategory::Interstitial),
            rewarded: pool_for(&settings, AdCategory::RewardedVideo),
            banners: pool_for(&settings, AdCategory::Banner),
            provider,
            settings,
            banner_supported: OnceLock::new(),
        }
    }

    pub fn provider(&self) -> &Arc<dyn AdProvider> {
        &self.provider
    }

    fn stateful_unit(&self, category: AdCategory, placement_id: &str) -> StatefulUnit {
        let pool = match category {
            AdCategory::Interstitial => &self.interstitials,
            AdCategory::RewardedVideo => &self.rewarded,
            AdCategory::Banner => unreachable!("banner placements use BannerUnit"),
        };
        StatefulUnit::new(
            placement_id,
            category,
            *self.settings.category(category),
            self.settings.retry_delay,
            Arc::clone(pool.timer()),
            Arc::clone(&self.provider),
        )
    }

    /// Register `count` interstitial slots for a placement. Returns the
    /// pool size after the add; registration order is the show priority
    /// order. Refused without mutating the pool when the batch would exceed
    /// the category capacity.
    pub async fn add_interstitial(&self, placement_id: &str, count: usize) -> Result<usize> {
        let total = self
            .interstitials
            .push_batch(count, || {
                self.stateful_unit(AdCategory::Interstitial, placement_id)
            })
            .await?;
        info!(placement_id, count, total, "registered interstitial placement");
        Ok(total)
    }

    /// Register `count` rewarded-video slots for a placement.
    pub async fn add_rewarded_video(&self, placement_id: &str, count: usize) -> Result<usize> {
        let total = self
            .rewarded
            .push_batch(count, || {
                self.stateful_unit(AdCategory::RewardedVideo, placement_id)
            })
            .await?;
        info!(placement_id, count, total, "registered rewarded video placement");
        Ok(total)
    }

    /// Register a banner placement.
    pub async fn add_banner(&self, placement_id: &str) -> Result<usize> {
        let unit = BannerUnit::new(
            placement_id,
            *self.settings.category(AdCategory::Banner),
            Arc::clone(self.banners.timer()),
            Arc::clone(&self.provider),
        );
        let total = self.banners.push(unit).await?;
        info!(placement_id, total, "registered banner placement");
        Ok(total)
    }

    /// Start preloading every registered stateful unit. Fire-and-forget:
    /// loads proceed in the background and individual failures recover
    /// through each unit's retry path.
    pub fn load_all(&self) {
        self.interstitials.load_all(self.settings.load_spacing);
        self.rewarded.load_all(self.settings.load_spacing);
    }

    pub async fn is_interstitial_ready(&self) -> bool {
        self.interstitials.is_ready().await
    }

    pub async fn is_rewarded_video_ready(&self) -> bool {
        self.rewarded.is_ready().await
    }

    /// Show the first ready interstitial.
    pub async fn show_interstitial(&self) -> Result<()> {
        self.interstitials.show().await
    }

    /// Show the first ready rewarded video.
    pub async fn show_rewarded_video(&self) -> Result<()> {
        self.rewarded.show().await
    }

    /// Whether the provider's capability list includes `op`.
    pub fn supports(&self, op: &str) -> bool {
        self.provider.supported_operations().iter().any(|o| o == op)
    }

    /// Whether the provider supports banner ads. Queried once and cached
    /// for the life of the manager.
    pub fn is_banner_supported(&self) -> bool {
        *self
            .banner_supported
            .get_or_init(|| self.supports(OP_LOAD_AND_SHOW_BANNER))
    }

    /// Show (or refresh) the primary banner.
    pub async fn show_banner(&self) -> Result<()> {
        if !self.is_banner_supported() {
            return Err(Error::CapabilityUnsupported(OP_LOAD_AND_SHOW_BANNER));
        }
        self.banners.show().await
    }

    /// Hide the primary banner.
    pub async fn hide_banner(&self) -> Result<()> {
        if !self.is_banner_supported() {
            return Err(Error::CapabilityUnsupported(OP_LOAD_AND_SHOW_BANNER));
        }
        self.banners.hide().await
    }

    /// Point-in-time diagnostic snapshot across all pools.
    pub async fn health(&self) -> serde_json::Value {
        json!({
            "provider": self.provider.id(),
            "banner_supported": self.is_banner_supported(),
            "interstitial": self.interstitials.health().await,
            "rewarded_video": self.rewarded.health().await,
            "banner": self.banners.health().await,
        })
    }
}

/// Build one category's pool wired to a fresh shared timer.
fn pool_for<U>(settings: &ManagerSettings, category: AdCategory) -> Arc<AdPool<U>> {
    let per_category = settings.category(category);
    let timer = Arc::new(RefreshTimer::with_warmup(
        per_category.refresh_interval,
        per_category.warmup,
    ));
    Arc::new(AdPool::new(category, settings.capacity, timer))
}
