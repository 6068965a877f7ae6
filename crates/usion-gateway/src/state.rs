//! Shared gateway state: the token verifier and room registry every socket
//! dispatches against (§4.6, §5 "the room registry is shared... access is
//! synchronized").

use std::sync::Arc;

use usion_auth::TokenVerifier;
use usion_room::RoomRegistry;

use crate::connection::ConnectionContext;
use crate::error::{GatewayError, GatewayResult};

pub struct GatewayState {
    verifier: TokenVerifier,
    registry: Arc<RoomRegistry>,
    /// Overrides the verifier's configured audience suffix for every
    /// connection to this process (§4.1: "supplied by the verifier call").
    service_id: Option<String>,
}

impl GatewayState {
    pub fn new(verifier: TokenVerifier, registry: Arc<RoomRegistry>, service_id: Option<String>) -> Self {
        Self { verifier, registry, service_id }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Extracts `token` from a `ws://host/ws?token=...` query string (§6).
    /// Any other query parameters are ignored.
    pub fn extract_token(query: Option<&str>) -> Option<String> {
        let query = query?;
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == "token").then(|| urlencoding_decode(value))
        })
    }

    /// Verifies the upgrade token and binds the session's identity from its
    /// claims (§4.6 step 3). `room_id` and `session_id` come from the token,
    /// not from any client-supplied field.
    pub async fn authenticate(&self, token: &str) -> GatewayResult<ConnectionContext> {
        let claims = self
            .verifier
            .verify(token, self.service_id.as_deref(), None)
            .await
            .map_err(GatewayError::InvalidToken)?;
        let room_id = claims.room_id.ok_or(GatewayError::MissingRoomClaim)?;
        Ok(ConnectionContext {
            user_id: claims.subject,
            room_id,
            session_id: claims.session_id,
        })
    }
}

/// Minimal percent-decoding for the one query parameter we read. Avoids
/// pulling in a URL-parsing crate for a single `token=...` extraction; the
/// axum-facing binary uses `axum::extract::Query` instead and only falls
/// back to this for contexts (tests) that hand the gateway a raw query.
fn urlencoding_decode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '+' => out.push(' '),
            '%' => {
                let hi = chars.next();
                let lo = chars.next();
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    if let Ok(byte) = u8::from_str_radix(&format!("{hi}{lo}"), 16) {
                        out.push(byte as char);
                        continue;
                    }
                }
                out.push('%');
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_token_from_query_string() {
        assert_eq!(GatewayState::extract_token(Some("token=abc123")), Some("abc123".to_string()));
        assert_eq!(GatewayState::extract_token(Some("foo=bar&token=xyz")), Some("xyz".to_string()));
        assert_eq!(GatewayState::extract_token(Some("foo=bar")), None);
        assert_eq!(GatewayState::extract_token(None), None);
    }

    #[test]
    fn decodes_percent_encoded_token() {
        assert_eq!(GatewayState::extract_token(Some("token=a%2Fb")), Some("a/b".to_string()));
    }
}
