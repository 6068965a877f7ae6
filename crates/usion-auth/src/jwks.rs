//! Remote JSON Web Key Set cache (§4.1).
//!
//! Timed expiry plus a cooldown that prevents rapid refetches even when the
//! cache is stale and multiple verifications race to refresh it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::JwkSet;
use tokio::sync::RwLock;

use crate::error::{VerifyError, VerifyResult};

struct CacheState {
    jwks: Option<JwkSet>,
    fetched_at: Option<Instant>,
    last_attempt: Option<Instant>,
}

/// Shared, cooldown-limited cache for one JWKS endpoint. Cloned cheaply —
/// the lock and state live behind an `Arc`.
#[derive(Clone)]
pub struct JwksCache {
    url: String,
    http: reqwest::Client,
    max_age: Duration,
    cooldown: Duration,
    state: Arc<RwLock<CacheState>>,
}

impl JwksCache {
    pub fn new(url: impl Into<String>, http: reqwest::Client, max_age: Duration, cooldown: Duration) -> Self {
        Self {
            url: url.into(),
            http,
            max_age,
            cooldown,
            state: Arc::new(RwLock::new(CacheState {
                jwks: None,
                fetched_at: None,
                last_attempt: None,
            })),
        }
    }

    /// Returns the cached key set, refreshing it if absent or stale. Honors
    /// the cooldown: a refresh attempt within `cooldown` of the last one
    /// reuses whatever is cached (even if stale) rather than refetching.
    pub async fn get(&self) -> VerifyResult<JwkSet> {
        {
            let state = self.state.read().await;
            if let (Some(jwks), Some(fetched_at)) = (&state.jwks, state.fetched_at) {
                if fetched_at.elapsed() < self.max_age {
                    return Ok(jwks.clone());
                }
            }
        }
        self.refresh_respecting_cooldown().await
    }

    /// Forces a refresh attempt, bypassing the max-age check (but still
    /// respecting the cooldown against a refresh that just happened). Used
    /// on the key-rotation retry path in `TokenVerifier::verify`.
    pub async fn force_refresh(&self) -> VerifyResult<JwkSet> {
        self.refresh_respecting_cooldown().await
    }

    async fn refresh_respecting_cooldown(&self) -> VerifyResult<JwkSet> {
        {
            let state = self.state.read().await;
            if let Some(last_attempt) = state.last_attempt {
                if last_attempt.elapsed() < self.cooldown {
                    if let Some(jwks) = &state.jwks {
                        return Ok(jwks.clone());
                    }
                }
            }
        }

        let mut state = self.state.write().await;
        // Re-check after acquiring the write lock: another task may have
        // refreshed while we waited.
        if let Some(last_attempt) = state.last_attempt {
            if last_attempt.elapsed() < self.cooldown {
                if let Some(jwks) = &state.jwks {
                    return Ok(jwks.clone());
                }
            }
        }

        state.last_attempt = Some(Instant::now());

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| VerifyError::KeySetFetch {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| VerifyError::KeySetMalformed(e.to_string()))?;

        state.jwks = Some(jwks.clone());
        state.fetched_at = Some(Instant::now());

        tracing::debug!(url = %self.url, key_count = jwks.keys.len(), "refreshed JWKS cache");

        Ok(jwks)
    }
}
