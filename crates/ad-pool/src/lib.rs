//! Ad slot lifecycle management
//!
//! Manages pools of rate-limited, asynchronously loaded ad slots
//! (interstitial, rewarded video, banner) on top of an abstract provider
//! SDK: preload into a ready state, display on demand, and recover from
//! failures within a bounded error budget. Each category shares one
//! refresh timer so the provider's pacing limit applies to the category
//! as a whole, not per slot.
//!
//! Unit lifecycle (stateful formats):
//! 1. Host registers placements via `AdManager::add_*` → unit starts idle
//! 2. `AdManager::load_all` fans out spaced preloads → unit acquires its
//!    resource and loads toward `Loaded`
//! 3. `AdManager::show_*` picks the first loaded, cooldown-satisfied unit
//! 4. A successful show consumes the resource, marks the shared timer and
//!    optionally schedules the next load
//! 5. Recoverable failures count against the budget and retry after a
//!    delay; a no-fill failure retires the unit permanently

pub mod banner;
pub mod classify;
pub mod config;
pub mod error;
pub mod manager;
pub mod pool;
pub mod retry;
pub mod timer;
pub mod unit;

#[cfg(test)]
pub(crate) mod testutil;

pub use banner::BannerUnit;
pub use classify::{classify_code, classify_failure};
pub use config::{CategorySettings, ManagerSettings};
pub use error::{Error, Result};
pub use manager::AdManager;
pub use pool::AdPool;
pub use retry::schedule_load;
pub use timer::RefreshTimer;
pub use unit::{ErrorBudget, LifecycleState, StatefulUnit};
