//! Null provider for platforms without an ad SDK.
//!
//! Every operation fails with `CLIENT_UNSUPPORTED_OPERATION` and the
//! capability list is empty. Lets a host wire the ad manager unconditionally
//! and rely on the capability check / error classification to keep the
//! lifecycle inert where ads are unavailable.

use crate::{
    AdCategory, AdProvider, AdResource, CODE_UNSUPPORTED_OPERATION, ProviderFailure,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

/// Provider that supports no operations.
pub struct NullProvider;

fn unsupported(op: &str) -> ProviderFailure {
    ProviderFailure::new(
        CODE_UNSUPPORTED_OPERATION,
        format!("operation not supported by this client: {op}"),
    )
}

impl AdProvider for NullProvider {
    fn id(&self) -> &str {
        "null"
    }

    fn create_resource<'a>(
        &'a self,
        category: AdCategory,
        placement_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = crate::Result<Arc<dyn AdResource>>> + Send + 'a>> {
        debug!(
            category = category.name(),
            placement_id, "null provider rejecting resource creation"
        );
        Box::pin(async { Err(unsupported("create_resource")) })
    }

    fn load_and_show_banner<'a>(
        &'a self,
        placement_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = crate::Result<()>> + Send + 'a>> {
        debug!(placement_id, "null provider rejecting banner show");
        Box::pin(async { Err(unsupported("load_and_show_banner")) })
    }

    fn hide_banner(&self) -> Pin<Box<dyn Future<Output = crate::Result<()>> + Send + '_>> {
        Box::pin(async { Err(unsupported("hide_banner")) })
    }

    fn supported_operations(&self) -> Vec<String> {
        Vec::new()
    }
}
