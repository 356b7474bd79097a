//! Ad Host
//!
//! Single-binary demo host that:
//! 1. Registers configured placements with the ad manager
//! 2. Preloads every stateful unit against a simulated provider
//! 3. Shows ads on a fixed cadence, riding out cooldowns and failures
//! 4. Logs periodic health snapshots until shutdown

mod config;
mod sim;

use ad_pool::{AdManager, Error as AdError};
use anyhow::{Context, Result};
use provider::AdProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::sim::SimProvider;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting ad-host");

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    let config = if config_path.exists() {
        info!(path = %config_path.display(), "loading configuration");
        Config::load(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else if cli_config_path.is_some() || std::env::var_os("CONFIG_PATH").is_some() {
        anyhow::bail!("config file not found: {}", config_path.display());
    } else {
        info!("no config file found, using defaults");
        Config::default()
    };

    info!(
        interstitials = config.placements.interstitial.len(),
        rewarded_videos = config.placements.rewarded_video.len(),
        banners = config.placements.banner.len(),
        failure_rate = config.provider.failure_rate,
        no_fill_rate = config.provider.no_fill_rate,
        "configuration loaded"
    );

    let provider: Arc<dyn AdProvider> = Arc::new(SimProvider::from_config(&config.provider));
    let manager = AdManager::new(provider, config.manager_settings());

    for placement in &config.placements.interstitial {
        manager.add_interstitial(placement, 1).await?;
    }
    for placement in &config.placements.rewarded_video {
        manager.add_rewarded_video(placement, 1).await?;
    }
    for placement in &config.placements.banner {
        manager.add_banner(placement).await?;
    }

    manager.load_all();
    info!("preloading started");

    if manager.is_banner_supported() && !config.placements.banner.is_empty() {
        if let Err(error) = manager.show_banner().await {
            warn!(%error, "initial banner show failed");
        }
    }

    let mut show_tick = tokio::time::interval(Duration::from_secs(config.host.show_interval_secs));
    let mut health_tick =
        tokio::time::interval(Duration::from_secs(config.host.health_interval_secs));
    // Don't attempt a show before anything had a chance to load.
    show_tick.reset();
    health_tick.reset();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = show_tick.tick() => {
                attempt_show(&manager).await;
            }
            _ = health_tick.tick() => {
                info!(health = %manager.health().await, "health snapshot");
            }
            _ = &mut shutdown => break,
        }
    }

    if manager.is_banner_supported() && !config.placements.banner.is_empty() {
        if let Err(error) = manager.hide_banner().await {
            warn!(%error, "banner hide on shutdown failed");
        }
    }

    info!("shutdown complete");
    Ok(())
}

/// Show whichever category is ready, preferring interstitials. Cooldowns
/// and missing inventory are expected here, not failures.
async fn attempt_show(manager: &AdManager) {
    let result = if manager.is_interstitial_ready().await {
        manager.show_interstitial().await
    } else if manager.is_rewarded_video_ready().await {
        manager.show_rewarded_video().await
    } else {
        info!("no ad ready this tick");
        return;
    };

    match result {
        Ok(()) => {}
        Err(AdError::CooldownActive { remaining_secs }) => {
            info!(remaining_secs, "show deferred by cooldown");
        }
        Err(AdError::NoReadyInstance(category)) => {
            info!(category, "no loaded instance to show");
        }
        Err(error) => {
            warn!(%error, "show attempt failed");
        }
    }
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
