//! Failure-code classification for provider errors
//!
//! Distinguishes pacing rejections (retry once the cooldown elapses, no
//! budget consumed) from out-of-inventory failures (permanent for the
//! placement, retire the unit). Everything else is an ordinary recoverable
//! failure counted against the unit's error budget.

use provider::{CODE_NO_FILL, CODE_RATE_LIMITED, ErrorClassification, ProviderFailure};

/// Classify a provider failure code.
///
/// Codes are matched exactly as the provider contract defines them;
/// unknown codes are treated as recoverable.
pub fn classify_code(code: &str) -> ErrorClassification {
    match code {
        CODE_RATE_LIMITED => ErrorClassification::RateLimited,
        CODE_NO_FILL => ErrorClassification::NoFill,
        _ => ErrorClassification::Recoverable,
    }
}

/// Classify a provider failure by its carried code.
pub fn classify_failure(failure: &ProviderFailure) -> ErrorClassification {
    classify_code(&failure.code)
}
