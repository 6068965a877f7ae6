//! Process configuration (§2.3, §6): environment variables layered over
//! typed defaults, the way `openibank-auth::config::AuthConfig::from_env`
//! does it.

use std::time::Duration;

use usion_auth::VerifierConfig;
use usion_room::RoomConfig;
use usion_webhook::WebhookConfig;

/// Everything `main` needs to assemble the gateway's shared state.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub service_id: Option<String>,
    pub jwks_url: String,
    pub api_url: String,
    pub signing_key_id: String,
    pub signing_secret: String,
    pub sim_tick_hz: u32,
    pub network_hz: u32,
    pub full_snapshot_interval_net_ticks: u32,
    pub deploy_region: String,
}

impl Config {
    /// Reads every field from its environment variable, falling back to the
    /// §6 default when unset. `JWKS_URL`, when absent, is derived from
    /// `API_URL` rather than left blank, since a deployment always has one
    /// or the other and deriving avoids a second required variable.
    pub fn from_env() -> Self {
        let api_url = env_string("API_URL", "");
        let jwks_url = std::env::var("JWKS_URL").unwrap_or_else(|_| format!("{}/.well-known/jwks.json", api_url.trim_end_matches('/')));

        Self {
            port: env_parsed("PORT", 3000),
            service_id: std::env::var("SERVICE_ID").ok().filter(|s| !s.is_empty()),
            jwks_url,
            api_url,
            signing_key_id: env_string("SIGNING_KEY_ID", ""),
            signing_secret: env_string("SIGNING_SECRET", ""),
            sim_tick_hz: env_parsed("SIM_TICK_HZ", 60),
            network_hz: env_parsed("NETWORK_HZ", 60),
            full_snapshot_interval_net_ticks: env_parsed("FULL_SNAPSHOT_INTERVAL_NET_TICKS", env_parsed("NETWORK_HZ", 60)),
            deploy_region: env_string("DEPLOY_REGION", "local"),
        }
    }

    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            sim_tick_hz: self.sim_tick_hz,
            network_hz: self.network_hz,
            full_snapshot_interval_net_ticks: self.full_snapshot_interval_net_ticks,
            deploy_region: self.deploy_region.clone(),
        }
    }

    pub fn webhook_config(&self) -> WebhookConfig {
        WebhookConfig {
            api_base_url: self.api_url.clone(),
            service_id: self.service_id.clone().unwrap_or_default(),
            signing_key_id: self.signing_key_id.clone(),
            signing_secret: self.signing_secret.clone(),
        }
    }

    /// The expected issuer isn't its own environment variable in §6 — the
    /// matchmaking API is both the token issuer and the webhook recipient,
    /// so it's derived from `API_URL` the same way `JWKS_URL` is.
    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig {
            issuer: self.api_url.clone(),
            audience_prefix: VerifierConfig::DEFAULT_AUDIENCE_PREFIX.to_string(),
            jwks_url: self.jwks_url.clone(),
            jwks_cache_max_age: Duration::from_secs(300),
            jwks_cache_cooldown: Duration::from_secs(1),
            clock_skew: Duration::from_secs(60),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parsed_falls_back_on_absent_or_malformed_value() {
        assert_eq!(env_parsed::<u32>("USION_TEST_DOES_NOT_EXIST", 42), 42);
    }

    #[test]
    fn full_snapshot_interval_defaults_to_network_hz() {
        std::env::remove_var("NETWORK_HZ");
        std::env::remove_var("FULL_SNAPSHOT_INTERVAL_NET_TICKS");
        let config = Config::from_env();
        assert_eq!(config.full_snapshot_interval_net_ticks, config.network_hz);
    }
}
