//! RSA-SHA256 JWT verification against a remote JWKS endpoint (§4.1).

use std::collections::HashSet;
use std::time::Duration;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use usion_types::{RoomId, SessionId, UserId};

use crate::claims::{ClaimSet, RawClaims};
use crate::config::VerifierConfig;
use crate::error::{VerifyError, VerifyResult};
use crate::jwks::JwksCache;

/// Upper bound on a single key-set fetch, per §5 ("Token verification has an
/// implicit upper bound via the key-set request timeout").
const KEY_SET_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct TokenVerifier {
    config: VerifierConfig,
    jwks: JwksCache,
}

impl TokenVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        let http = reqwest::Client::new();
        let jwks = JwksCache::new(
            config.jwks_url.clone(),
            http,
            config.jwks_cache_max_age,
            config.jwks_cache_cooldown,
        );
        Self { config, jwks }
    }

    /// Verifies `token` and returns its claim set.
    ///
    /// `expected_service_id` overrides the verifier's configured audience
    /// suffix for this call; when absent, the service id is taken from the
    /// token's own `service_id` claim (§4.1). `expected_room_id`, when
    /// supplied, must match the token's `room_id` claim exactly.
    pub async fn verify(
        &self,
        token: &str,
        expected_service_id: Option<&str>,
        expected_room_id: Option<&RoomId>,
    ) -> VerifyResult<ClaimSet> {
        match self.verify_once(token, expected_service_id, expected_room_id).await {
            Ok(claims) => Ok(claims),
            Err(err) if err.is_key_rotation_signal() => {
                tracing::debug!("verification failed on a key-rotation signal, forcing JWKS refresh");
                self.jwks.force_refresh().await?;
                self.verify_once(token, expected_service_id, expected_room_id).await
            }
            Err(err) => Err(err),
        }
    }

    async fn verify_once(
        &self,
        token: &str,
        expected_service_id: Option<&str>,
        expected_room_id: Option<&RoomId>,
    ) -> VerifyResult<ClaimSet> {
        let header = decode_header(token).map_err(|_| VerifyError::InvalidSignature)?;
        let key_id = header.kid.ok_or(VerifyError::InvalidSignature)?;

        let jwks = tokio::time::timeout(KEY_SET_REQUEST_TIMEOUT, self.jwks.get())
            .await
            .map_err(|_| VerifyError::KeySetFetch {
                url: self.config.jwks_url.clone(),
                reason: "timed out waiting for key set".to_string(),
            })??;

        let jwk = jwks
            .find(&key_id)
            .ok_or_else(|| VerifyError::UnknownSigningKey { key_id: key_id.clone() })?;
        let decoding_key =
            DecodingKey::from_jwk(jwk).map_err(|_| VerifyError::KeySetMalformed(key_id.clone()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.leeway = self.config.clock_skew.as_secs();
        validation.set_issuer(&[&self.config.issuer]);
        // Audience is validated manually below, since the expected value
        // depends on `expected_service_id` / the token's own claim.
        validation.validate_aud = false;

        let token_data = decode::<RawClaims>(token, &decoding_key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => VerifyError::Expired,
                ErrorKind::InvalidIssuer => VerifyError::IssuerMismatch {
                    expected: self.config.issuer.clone(),
                    found: String::new(),
                },
                _ => VerifyError::InvalidSignature,
            }
        })?;
        let raw = token_data.claims;

        let service_id = expected_service_id
            .map(str::to_string)
            .or_else(|| raw.service_id.clone())
            .unwrap_or_default();
        let expected_audience = format!("{}{}", self.config.audience_prefix, service_id);
        if !raw.aud.iter().any(|a| a == &expected_audience) {
            return Err(VerifyError::AudienceMismatch {
                expected: expected_audience,
                found: raw.aud.join(","),
            });
        }

        if !raw.permissions.iter().any(|p| p == "play") {
            return Err(VerifyError::MissingPlayPermission);
        }

        let session_id = raw
            .session_id
            .filter(|s| !s.is_empty())
            .ok_or(VerifyError::MissingSessionId)?;

        if let Some(expected_room) = expected_room_id {
            let found_room = raw.room_id.as_deref().unwrap_or_default();
            if found_room != expected_room.0 {
                return Err(VerifyError::RoomMismatch {
                    expected: expected_room.0.clone(),
                    found: found_room.to_string(),
                });
            }
        }

        Ok(ClaimSet {
            subject: UserId::new(raw.sub),
            room_id: raw.room_id.map(RoomId::new),
            session_id: SessionId::new(session_id),
            service_id,
            expires_at: raw.exp,
            issued_at: raw.iat,
            permissions: raw.permissions.into_iter().collect::<HashSet<_>>(),
        })
    }
}
