//! Webhook Signer (§4.2): delivers match results to the matchmaking API
//! over HTTP, signed with a canonical-string HMAC so the receiver can
//! authenticate the service and reject replays.

mod error;
mod payload;
mod signing;

pub use error::{WebhookError, WebhookResult};
pub use payload::{FinalStats, MatchResult, MatchResultBody};

use chrono::Utc;
use reqwest::Client;
use tracing::{instrument, warn};

const RESULTS_PATH: &str = "/games/direct/results";

/// Credentials the Room Runtime was configured with, passed to every
/// [`submit`] call rather than stored on a long-lived client, since a
/// single process only ever holds one signing identity.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub api_base_url: String,
    pub service_id: String,
    pub signing_key_id: String,
    pub signing_secret: String,
}

/// Signs and POSTs `result` to `{api_base_url}{RESULTS_PATH}`.
///
/// Builds a fresh idempotency key per call; retries are the caller's
/// responsibility (the Room Runtime owns that policy), not this crate's.
#[instrument(skip(client, config, result), fields(room_id = %result.room_id, session_id = %result.session_id))]
pub async fn submit(client: &Client, config: &WebhookConfig, result: MatchResult) -> WebhookResult<serde_json::Value> {
    let body = result.into_body(Utc::now());
    let body_bytes = serde_json::to_vec(&body)?;

    let unix_seconds = Utc::now().timestamp();
    let digest = signing::body_digest_hex(&body_bytes);
    let canonical = signing::canonical_string(unix_seconds, "POST", RESULTS_PATH, &digest);
    let signature = signing::sign(&config.signing_secret, &canonical);

    let url = format!("{}{}", config.api_base_url.trim_end_matches('/'), RESULTS_PATH);
    let idempotency_key = uuid::Uuid::new_v4().to_string();

    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("X-Usion-Service-Id", &config.service_id)
        .header("X-Usion-Key-Id", &config.signing_key_id)
        .header("X-Usion-Signature", signature)
        .header("X-Usion-Timestamp", unix_seconds.to_string())
        .header("X-Idempotency-Key", idempotency_key)
        .body(body_bytes)
        .send()
        .await
        .map_err(|e| WebhookError::Transport { url: url.clone(), reason: e.to_string() })?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "webhook submission rejected");
        return Err(WebhookError::NonSuccess { status: status.as_u16(), body: body_text });
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| WebhookError::Transport { url, reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use usion_types::{RoomId, SessionId, TerminationReason, UserId};

    fn sample_result() -> MatchResult {
        let mut final_stats = HashMap::new();
        final_stats.insert(
            UserId::new("u1"),
            FinalStats { kills: 3, deaths: 1, damage_dealt: 240.0, pickups_collected: 2 },
        );
        MatchResult {
            room_id: RoomId::new("room-1"),
            session_id: SessionId::new("sess-1"),
            winner_ids: vec![UserId::new("u1")],
            participants: vec![UserId::new("u1"), UserId::new("u2")],
            reason: TerminationReason::Elimination,
            final_stats,
        }
    }

    #[test]
    fn into_body_stamps_ended_at() {
        let ts = Utc::now();
        let body = sample_result().into_body(ts);
        assert_eq!(body.ended_at, ts);
        assert_eq!(body.winner_ids, vec![UserId::new("u1")]);
    }

    #[test]
    fn results_path_is_stable() {
        assert_eq!(RESULTS_PATH, "/games/direct/results");
    }

    #[tokio::test]
    async fn submit_against_unroutable_host_is_a_transport_error() {
        let client = Client::new();
        let config = WebhookConfig {
            api_base_url: "http://127.0.0.1:1".to_string(),
            service_id: "arena".to_string(),
            signing_key_id: "key-1".to_string(),
            signing_secret: "secret".to_string(),
        };
        let err = submit(&client, &config, sample_result()).await.unwrap_err();
        assert!(matches!(err, WebhookError::Transport { .. }));
    }
}
