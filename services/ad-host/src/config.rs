//! Configuration types and loading
//!
//! Config precedence: CLI args > CONFIG_PATH env var > default path. Every
//! lifecycle knob defaults to the recommended values from `ad-pool`, so a
//! minimal config only has to list placements.

use ad_pool::{CategorySettings, ManagerSettings};
use ad_pool::config as defaults;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub placements: PlacementsConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub host: HostConfig,
}

/// Simulated provider behavior
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    /// Probability in [0, 1] that any provider call fails recoverably.
    #[serde(default)]
    pub failure_rate: f64,
    /// Probability in [0, 1] that a load reports no fill.
    #[serde(default)]
    pub no_fill_rate: f64,
    /// Simulated provider latency per call.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Whether the simulated provider advertises banner support.
    #[serde(default = "default_true")]
    pub banner_supported: bool,
}

/// Placement ids to register per category
#[derive(Debug, Default, Deserialize)]
pub struct PlacementsConfig {
    #[serde(default)]
    pub interstitial: Vec<String>,
    #[serde(default)]
    pub rewarded_video: Vec<String>,
    #[serde(default)]
    pub banner: Vec<String>,
}

/// Lifecycle tuning, defaulting to the recommended values
#[derive(Debug, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_interstitial_refresh_secs")]
    pub interstitial_refresh_secs: u64,
    #[serde(default)]
    pub rewarded_video_refresh_secs: u64,
    #[serde(default = "default_banner_refresh_secs")]
    pub banner_refresh_secs: u64,
    #[serde(default = "default_max_interstitial_errors")]
    pub max_interstitial_errors: u32,
    #[serde(default = "default_max_rewarded_video_errors")]
    pub max_rewarded_video_errors: u32,
    #[serde(default = "default_max_banner_errors")]
    pub max_banner_errors: u32,
    #[serde(default = "default_true")]
    pub auto_reload_on_show: bool,
    #[serde(default = "default_load_spacing_ms")]
    pub load_spacing_ms: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Demo loop pacing
#[derive(Debug, Deserialize)]
pub struct HostConfig {
    /// How often the host attempts to show an ad.
    #[serde(default = "default_show_interval_secs")]
    pub show_interval_secs: u64,
    /// How often the health snapshot is logged.
    #[serde(default = "default_health_interval_secs")]
    pub health_interval_secs: u64,
}

fn default_latency_ms() -> u64 {
    50
}

fn default_true() -> bool {
    true
}

fn default_capacity() -> usize {
    defaults::MAX_UNITS_PER_CATEGORY
}

fn default_interstitial_refresh_secs() -> u64 {
    defaults::INTERSTITIAL_REFRESH_INTERVAL.as_secs()
}

fn default_banner_refresh_secs() -> u64 {
    defaults::BANNER_REFRESH_INTERVAL.as_secs()
}

fn default_max_interstitial_errors() -> u32 {
    defaults::MAX_INTERSTITIAL_ERRORS
}

fn default_max_rewarded_video_errors() -> u32 {
    defaults::MAX_REWARDED_VIDEO_ERRORS
}

fn default_max_banner_errors() -> u32 {
    defaults::MAX_BANNER_ERRORS
}

fn default_load_spacing_ms() -> u64 {
    defaults::LOAD_SPACING.as_millis() as u64
}

fn default_retry_delay_ms() -> u64 {
    defaults::RETRY_DELAY.as_millis() as u64
}

fn default_show_interval_secs() -> u64 {
    5
}

fn default_health_interval_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.0,
            no_fill_rate: 0.0,
            latency_ms: default_latency_ms(),
            banner_supported: true,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            interstitial_refresh_secs: default_interstitial_refresh_secs(),
            rewarded_video_refresh_secs: 0,
            banner_refresh_secs: default_banner_refresh_secs(),
            max_interstitial_errors: default_max_interstitial_errors(),
            max_rewarded_video_errors: default_max_rewarded_video_errors(),
            max_banner_errors: default_max_banner_errors(),
            auto_reload_on_show: true,
            load_spacing_ms: default_load_spacing_ms(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            show_interval_secs: default_show_interval_secs(),
            health_interval_secs: default_health_interval_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        for (name, rate) in [
            ("failure_rate", self.provider.failure_rate),
            ("no_fill_rate", self.provider.no_fill_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(common::Error::Config(format!(
                    "{name} must be within [0, 1], got: {rate}"
                )));
            }
        }
        if self.provider.failure_rate + self.provider.no_fill_rate > 1.0 {
            return Err(common::Error::Config(
                "failure_rate + no_fill_rate must not exceed 1".into(),
            ));
        }
        if self.lifecycle.capacity == 0 {
            return Err(common::Error::Config(
                "capacity must be greater than 0".into(),
            ));
        }
        if self.host.show_interval_secs == 0 {
            return Err(common::Error::Config(
                "show_interval_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("ad-host.toml")
    }

    /// Lifecycle settings for the ad manager.
    pub fn manager_settings(&self) -> ManagerSettings {
        let lifecycle = &self.lifecycle;
        let category = |refresh_secs: u64, max_errors: u32| CategorySettings {
            refresh_interval: Duration::from_secs(refresh_secs),
            warmup: defaults::NO_WARMUP,
            max_load_errors: max_errors,
            auto_reload_on_show: lifecycle.auto_reload_on_show,
        };
        ManagerSettings {
            interstitial: category(
                lifecycle.interstitial_refresh_secs,
                lifecycle.max_interstitial_errors,
            ),
            rewarded_video: category(
                lifecycle.rewarded_video_refresh_secs,
                lifecycle.max_rewarded_video_errors,
            ),
            banner: category(lifecycle.banner_refresh_secs, lifecycle.max_banner_errors),
            capacity: lifecycle.capacity,
            load_spacing: Duration::from_millis(lifecycle.load_spacing_ms),
            retry_delay: Duration::from_millis(lifecycle.retry_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn valid_toml() -> &'static str {
        r#"
[provider]
failure_rate = 0.1
no_fill_rate = 0.05

[placements]
interstitial = ["interstitial-main", "interstitial-backup"]
rewarded_video = ["rewarded-main"]
banner = ["banner-bottom"]

[lifecycle]
interstitial_refresh_secs = 20
"#
    }

    fn write_config(dir_name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(dir_name);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let path = write_config("ad-host-test-valid", valid_toml());

        let config = Config::load(&path).unwrap();
        assert_eq!(config.provider.failure_rate, 0.1);
        assert_eq!(config.placements.interstitial.len(), 2);
        assert_eq!(config.placements.rewarded_video, vec!["rewarded-main"]);
        assert_eq!(config.lifecycle.interstitial_refresh_secs, 20);
        // Unset fields take the recommended defaults.
        assert_eq!(config.lifecycle.capacity, 3);
        assert_eq!(config.lifecycle.max_banner_errors, 1);
        assert!(config.lifecycle.auto_reload_on_show);
        assert_eq!(config.host.show_interval_secs, 5);

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let path = write_config("ad-host-test-invalid", "not valid {{{{ toml");
        let result = Config::load(&path);
        assert!(result.is_err());
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let path = write_config("ad-host-test-empty", "");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.provider.failure_rate, 0.0);
        assert!(config.provider.banner_supported);
        assert!(config.placements.interstitial.is_empty());
        assert_eq!(config.lifecycle.rewarded_video_refresh_secs, 0);

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_out_of_range_failure_rate_rejected() {
        let path = write_config(
            "ad-host-test-bad-rate",
            "[provider]\nfailure_rate = 1.5\n",
        );
        let result = Config::load(&path);
        assert!(result.is_err());
        let err = format!("{}", result.unwrap_err());
        assert!(err.contains("failure_rate"), "got: {err}");
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_combined_rates_above_one_rejected() {
        let path = write_config(
            "ad-host-test-rate-sum",
            "[provider]\nfailure_rate = 0.7\nno_fill_rate = 0.7\n",
        );
        let result = Config::load(&path);
        assert!(result.is_err());
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let path = write_config("ad-host-test-zero-cap", "[lifecycle]\ncapacity = 0\n");
        let result = Config::load(&path);
        assert!(result.is_err(), "capacity = 0 must be rejected");
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_resolve_path_cli_arg() {
        let path = Config::resolve_path(Some("/custom/path.toml"));
        assert_eq!(path, PathBuf::from("/custom/path.toml"));
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/path.toml") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("/env/path.toml"));
        unsafe { remove_env("CONFIG_PATH") };
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CONFIG_PATH") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("ad-host.toml"));
    }

    #[test]
    fn test_resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/should-lose.toml") };
        let path = Config::resolve_path(Some("/cli/wins.toml"));
        assert_eq!(
            path,
            PathBuf::from("/cli/wins.toml"),
            "CLI arg must take precedence over CONFIG_PATH env var"
        );
        unsafe { remove_env("CONFIG_PATH") };
    }

    #[test]
    fn test_manager_settings_mapping() {
        let path = write_config("ad-host-test-settings", valid_toml());
        let config = Config::load(&path).unwrap();

        let settings = config.manager_settings();
        assert_eq!(
            settings.interstitial.refresh_interval,
            Duration::from_secs(20)
        );
        assert_eq!(settings.rewarded_video.refresh_interval, Duration::ZERO);
        assert_eq!(settings.banner.max_load_errors, 1);
        assert_eq!(settings.capacity, 3);
        assert_eq!(settings.load_spacing, Duration::from_millis(100));
        assert_eq!(settings.retry_delay, Duration::from_millis(500));

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
