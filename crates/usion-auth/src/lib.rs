//! Token Verifier (§4.1): RSA-SHA256 JWT validation against a remote,
//! cooldown-limited JWKS cache, plus the claim shapes it returns.

mod claims;
mod config;
mod error;
mod jwks;
mod verifier;

pub use claims::ClaimSet;
pub use config::VerifierConfig;
pub use error::{VerifyError, VerifyResult};
pub use jwks::JwksCache;
pub use verifier::TokenVerifier;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use usion_types::RoomId;

    #[test]
    fn config_defaults_match_spec() {
        let cfg = VerifierConfig::new("https://auth.usion.gg/", "https://auth.usion.gg/.well-known/jwks.json");
        assert_eq!(cfg.jwks_cache_max_age, Duration::from_secs(300));
        assert_eq!(cfg.jwks_cache_cooldown, Duration::from_secs(1));
        assert_eq!(cfg.clock_skew, Duration::from_secs(60));
        assert_eq!(cfg.audience_prefix, "usion-game-service:");
    }

    #[test]
    fn claim_set_permission_lookup() {
        let claims = ClaimSet {
            subject: usion_types::UserId::new("u1"),
            room_id: Some(RoomId::new("room-1")),
            session_id: usion_types::SessionId::new("s1"),
            service_id: "arena".to_string(),
            expires_at: 0,
            issued_at: 0,
            permissions: ["play".to_string()].into_iter().collect(),
        };
        assert!(claims.has_permission("play"));
        assert!(!claims.has_permission("admin"));
    }

    #[test]
    fn key_rotation_signals_are_exactly_signature_and_unknown_key() {
        assert!(VerifyError::InvalidSignature.is_key_rotation_signal());
        assert!(VerifyError::UnknownSigningKey { key_id: "k1".into() }.is_key_rotation_signal());
        assert!(!VerifyError::Expired.is_key_rotation_signal());
        assert!(!VerifyError::MissingPlayPermission.is_key_rotation_signal());
    }
}
