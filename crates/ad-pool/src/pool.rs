//! Per-category unit pools
//!
//! A pool owns every unit of one category plus the category's shared
//! refresh timer. Registration order is priority order: show always scans
//! from the front and takes the first eligible unit, so earlier placements
//! are preferred and later ones act as fallbacks.

use crate::banner::BannerUnit;
use crate::error::{Error, Result};
use crate::timer::RefreshTimer;
use crate::unit::{ErrorBudget, StatefulUnit};
use provider::AdCategory;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Fixed-capacity, insertion-ordered pool of ad units for one category.
pub struct AdPool<U> {
    category: AdCategory,
    capacity: usize,
    timer: Arc<RefreshTimer>,
    units: RwLock<Vec<Arc<U>>>,
}

impl<U> AdPool<U> {
    pub fn new(category: AdCategory, capacity: usize, timer: Arc<RefreshTimer>) -> Self {
        Self {
            category,
            capacity,
            timer,
            units: RwLock::new(Vec::new()),
        }
    }

    pub fn category(&self) -> AdCategory {
        self.category
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The category's shared refresh timer.
    pub fn timer(&self) -> &Arc<RefreshTimer> {
        &self.timer
    }

    pub async fn len(&self) -> usize {
        self.units.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.units.read().await.is_empty()
    }

    pub async fn units(&self) -> Vec<Arc<U>> {
        self.units.read().await.clone()
    }

    /// Register a unit at the back of the priority order. Returns the new
    /// pool size, or refuses once the pool is at capacity.
    pub async fn push(&self, unit: U) -> Result<usize> {
        let mut units = self.units.write().await;
        if units.len() >= self.capacity {
            return Err(Error::CapacityExceeded {
                category: self.category.name(),
                capacity: self.capacity,
            });
        }
        units.push(Arc::new(unit));
        Ok(units.len())
    }

    /// Register `count` units built by `make` at the back of the priority
    /// order. All-or-nothing: refused without mutating the pool when the
    /// batch would exceed capacity. Returns the new pool size.
    pub async fn push_batch(&self, count: usize, mut make: impl FnMut() -> U) -> Result<usize> {
        let mut units = self.units.write().await;
        if units.len() + count > self.capacity {
            return Err(Error::CapacityExceeded {
                category: self.category.name(),
                capacity: self.capacity,
            });
        }
        for _ in 0..count {
            units.push(Arc::new(make()));
        }
        Ok(units.len())
    }
}

impl AdPool<StatefulUnit> {
    /// Kick off a load for every unit, spaced `spacing` apart so startup
    /// does not burst simultaneous creation calls at the provider. Each
    /// load runs in its own task; individual failures recover through the
    /// unit's own retry path.
    pub fn load_all(self: &Arc<Self>, spacing: Duration) -> JoinHandle<()> {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let units = pool.units().await;
            info!(
                category = pool.category.name(),
                units = units.len(),
                "preloading pool"
            );
            for (index, unit) in units.into_iter().enumerate() {
                if index > 0 {
                    tokio::time::sleep(spacing).await;
                }
                tokio::spawn(async move {
                    if let Err(error) = unit.load().await {
                        debug!(
                            placement_id = %unit.placement_id(),
                            %error,
                            "preload did not complete"
                        );
                    }
                });
            }
        })
    }

    /// True when the category can show right now: the shared cooldown has
    /// elapsed and at least one unit is loaded.
    pub async fn is_ready(&self) -> bool {
        if !self.timer.is_ready().await {
            return false;
        }
        for unit in self.units.read().await.iter() {
            if unit.is_ready().await {
                return true;
            }
        }
        false
    }

    /// Show through the first loaded unit in priority order.
    pub async fn show(&self) -> Result<()> {
        let remaining = self.timer.remaining().await;
        if !remaining.is_zero() {
            return Err(Error::CooldownActive {
                remaining_secs: remaining.as_secs_f64(),
            });
        }
        let units = self.units().await;
        for unit in &units {
            if unit.is_ready().await {
                return unit.show().await;
            }
        }
        Err(Error::NoReadyInstance(self.category.name()))
    }

    /// Point-in-time diagnostic snapshot of the pool.
    pub async fn health(&self) -> serde_json::Value {
        let units = self.units().await;
        let mut entries = Vec::with_capacity(units.len());
        for unit in &units {
            entries.push(json!({
                "placement_id": unit.placement_id(),
                "state": unit.state().await.name(),
                "budget": budget_json(unit.budget().await),
            }));
        }
        json!({
            "category": self.category.name(),
            "capacity": self.capacity,
            "cooldown_secs": self.timer.remaining().await.as_secs_f64(),
            "units": entries,
        })
    }
}

impl AdPool<BannerUnit> {
    fn primary(units: &[Arc<BannerUnit>], category: AdCategory) -> Result<&Arc<BannerUnit>> {
        units
            .first()
            .ok_or(Error::NoReadyInstance(category.name()))
    }

    /// Show (or refresh) the primary banner.
    pub async fn show(&self) -> Result<()> {
        let units = self.units().await;
        Self::primary(&units, self.category)?.show().await
    }

    /// Hide the primary banner.
    pub async fn hide(&self) -> Result<()> {
        let units = self.units().await;
        Self::primary(&units, self.category)?.hide().await
    }

    pub async fn health(&self) -> serde_json::Value {
        let units = self.units().await;
        let mut entries = Vec::with_capacity(units.len());
        for unit in &units {
            entries.push(json!({
                "placement_id": unit.placement_id(),
                "state": unit.state().await.name(),
                "budget": budget_json(unit.budget().await),
            }));
        }
        json!({
            "category": self.category.name(),
            "capacity": self.capacity,
            "cooldown_secs": self.timer.remaining().await.as_secs_f64(),
            "units": entries,
        })
    }
}

fn budget_json(budget: ErrorBudget) -> serde_json::Value {
    match budget {
        ErrorBudget::Active { errors } => json!({ "errors": errors }),
        ErrorBudget::Retired => json!({ "retired": true }),
    }
}
