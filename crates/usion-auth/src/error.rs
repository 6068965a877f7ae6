//! Token verifier error types (§4.1, §7).

use thiserror::Error;

pub type VerifyResult<T> = Result<T, VerifyError>;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token is expired")]
    Expired,

    #[error("token signature or structure is invalid")]
    InvalidSignature,

    #[error("issuer {found:?} does not match expected {expected:?}")]
    IssuerMismatch { expected: String, found: String },

    #[error("audience {found:?} does not match expected {expected:?}")]
    AudienceMismatch { expected: String, found: String },

    #[error("token is missing required permission \"play\"")]
    MissingPlayPermission,

    #[error("token is missing a session_id claim")]
    MissingSessionId,

    #[error("room_id {found:?} does not match expected {expected:?}")]
    RoomMismatch { expected: String, found: String },

    #[error("no signing key {key_id:?} found in key set after refresh")]
    UnknownSigningKey { key_id: String },

    #[error("failed to fetch key set from {url}: {reason}")]
    KeySetFetch { url: String, reason: String },

    #[error("key set endpoint returned a malformed key set: {0}")]
    KeySetMalformed(String),
}

impl VerifyError {
    /// Whether this failure is the signal this module treats as "possible
    /// key rotation": the outer caller force-refreshes the key-set cache and
    /// retries verification exactly once (§4.1).
    pub fn is_key_rotation_signal(&self) -> bool {
        matches!(self, Self::InvalidSignature | Self::UnknownSigningKey { .. })
    }
}
