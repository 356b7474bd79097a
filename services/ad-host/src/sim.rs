//! Simulated ad provider
//!
//! Stands in for a real provider SDK: every call sleeps a configured
//! latency and then fails with a configured probability. Load-side calls
//! can report no fill; show-side failures are split between pacing
//! rejections and ordinary errors so every recovery path in the lifecycle
//! gets exercised.

use crate::config::ProviderConfig;
use provider::{
    AdCategory, AdProvider, AdResource, CODE_NO_FILL, CODE_RATE_LIMITED,
    OP_LOAD_AND_SHOW_BANNER, ProviderFailure, Result,
};
use rand::RngExt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

const CODE_SIMULATED: &str = "SIMULATED_FAILURE";

#[derive(Clone)]
pub struct SimProvider {
    failure_rate: f64,
    no_fill_rate: f64,
    latency: Duration,
    banner_supported: bool,
}

impl SimProvider {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            failure_rate: config.failure_rate,
            no_fill_rate: config.no_fill_rate,
            latency: Duration::from_millis(config.latency_ms),
            banner_supported: config.banner_supported,
        }
    }

    async fn load_outcome(&self, op: &'static str) -> Result<()> {
        tokio::time::sleep(self.latency).await;
        let roll = rand::rng().random::<f64>();
        trace!(op, roll, "simulated provider call");
        if roll < self.no_fill_rate {
            Err(ProviderFailure::new(CODE_NO_FILL, "no inventory available"))
        } else if roll < self.no_fill_rate + self.failure_rate {
            Err(ProviderFailure::new(CODE_SIMULATED, "simulated failure"))
        } else {
            Ok(())
        }
    }

    async fn show_outcome(&self, op: &'static str) -> Result<()> {
        tokio::time::sleep(self.latency).await;
        let mut rng = rand::rng();
        let roll = rng.random::<f64>();
        trace!(op, roll, "simulated provider call");
        if roll >= self.failure_rate {
            return Ok(());
        }
        if rng.random::<bool>() {
            Err(ProviderFailure::new(CODE_RATE_LIMITED, "pacing rejection"))
        } else {
            Err(ProviderFailure::new(CODE_SIMULATED, "simulated failure"))
        }
    }
}

struct SimResource {
    provider: SimProvider,
}

impl AdResource for SimResource {
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.provider.load_outcome("load"))
    }

    fn show(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.provider.show_outcome("show"))
    }
}

impl AdProvider for SimProvider {
    fn id(&self) -> &str {
        "simulated"
    }

    fn create_resource<'a>(
        &'a self,
        _category: AdCategory,
        _placement_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<dyn AdResource>>> + Send + 'a>> {
        Box::pin(async move {
            self.load_outcome("create").await?;
            Ok(Arc::new(SimResource {
                provider: self.clone(),
            }) as Arc<dyn AdResource>)
        })
    }

    fn load_and_show_banner<'a>(
        &'a self,
        _placement_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.show_outcome("load_and_show_banner"))
    }

    fn hide_banner(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.show_outcome("hide_banner"))
    }

    fn supported_operations(&self) -> Vec<String> {
        if self.banner_supported {
            vec![OP_LOAD_AND_SHOW_BANNER.to_string()]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(failure_rate: f64, no_fill_rate: f64) -> SimProvider {
        SimProvider {
            failure_rate,
            no_fill_rate,
            latency: Duration::ZERO,
            banner_supported: true,
        }
    }

    #[tokio::test]
    async fn zero_rates_always_succeed() {
        let provider = sim(0.0, 0.0);
        let resource = provider
            .create_resource(AdCategory::Interstitial, "p1")
            .await
            .unwrap();
        resource.load().await.unwrap();
        resource.show().await.unwrap();
        provider.load_and_show_banner("b1").await.unwrap();
    }

    #[tokio::test]
    async fn full_no_fill_rate_reports_no_fill() {
        let provider = sim(0.0, 1.0);
        let err = provider
            .create_resource(AdCategory::Interstitial, "p1")
            .await
            .unwrap_err();
        assert_eq!(err.code, CODE_NO_FILL);
    }

    #[tokio::test]
    async fn full_failure_rate_fails_shows() {
        let provider = sim(1.0, 0.0);
        let err = provider.load_and_show_banner("b1").await.unwrap_err();
        assert!(err.code == CODE_RATE_LIMITED || err.code == CODE_SIMULATED);
    }

    #[test]
    fn banner_capability_follows_config() {
        assert!(
            sim(0.0, 0.0)
                .supported_operations()
                .contains(&OP_LOAD_AND_SHOW_BANNER.to_string())
        );
        let mut no_banner = sim(0.0, 0.0);
        no_banner.banner_supported = false;
        assert!(no_banner.supported_operations().is_empty());
    }
}
