//! Common types for the Instant Ads workspace

mod error;

pub use error::{Error, Result};
