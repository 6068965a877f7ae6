//! Verifier configuration (§6 Configuration table).

use std::time::Duration;

/// Settings for one [`crate::TokenVerifier`] instance. `service_id` doubles
/// as the default audience suffix and the fallback when a `verify` call's
/// `expected_service_id` argument is absent, per §4.1.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub issuer: String,
    /// Audience claim prefix; the full expected audience is
    /// `{audience_prefix}{service_id}`.
    pub audience_prefix: String,
    pub jwks_url: String,
    pub jwks_cache_max_age: Duration,
    pub jwks_cache_cooldown: Duration,
    pub clock_skew: Duration,
}

impl VerifierConfig {
    /// `usion-game-service:` is the audience prefix used throughout §6.
    pub const DEFAULT_AUDIENCE_PREFIX: &'static str = "usion-game-service:";

    pub fn new(issuer: impl Into<String>, jwks_url: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience_prefix: Self::DEFAULT_AUDIENCE_PREFIX.to_string(),
            jwks_url: jwks_url.into(),
            jwks_cache_max_age: Duration::from_secs(300),
            jwks_cache_cooldown: Duration::from_secs(1),
            clock_skew: Duration::from_secs(60),
        }
    }
}
