//! Webhook Signer error type (§4.2, §7).

use thiserror::Error;

pub type WebhookResult<T> = Result<T, WebhookError>;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("failed to send webhook request to {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("webhook endpoint returned {status}: {body}")]
    NonSuccess { status: u16, body: String },

    #[error("failed to serialize match result body: {0}")]
    Serialize(#[from] serde_json::Error),
}
