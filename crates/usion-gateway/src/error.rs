//! Connection Gateway error type (§4.6, §7).

use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no token supplied in the upgrade query string")]
    NoToken,

    #[error("token verification failed: {0}")]
    InvalidToken(#[from] usion_auth::VerifyError),

    #[error("the token's room_id claim is missing")]
    MissingRoomClaim,
}

impl GatewayError {
    /// The wire error code for this failure (§6, §7). Both variants close
    /// the socket after being sent.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::NoToken => usion_net::payloads::error_code::NO_TOKEN,
            GatewayError::InvalidToken(_) | GatewayError::MissingRoomClaim => {
                usion_net::payloads::error_code::INVALID_TOKEN
            }
        }
    }

    /// Client-facing message. Internal detail (key ids, upstream fetch
    /// errors) never crosses this boundary — only `Display` of the outer
    /// variant is surfaced, matching `AuthError`'s client-message policy in
    /// the teacher workspace.
    pub fn client_message(&self) -> Option<String> {
        match self {
            GatewayError::NoToken => None,
            GatewayError::InvalidToken(_) => Some("invalid or expired token".to_string()),
            GatewayError::MissingRoomClaim => Some("token is missing a room assignment".to_string()),
        }
    }
}
