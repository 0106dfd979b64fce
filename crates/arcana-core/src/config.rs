//! Gateway configuration loaded from `.env`.
//!
//! Toggles for the report pipeline: LLM mode, CAPTCHA bypass, token TTL,
//! storage path, and outbound email identity. Change behavior without code edits.

use serde::{Deserialize, Serialize};

const DEFAULT_PORT: u16 = 8700;
const DEFAULT_TOKEN_TTL_HOURS: u64 = 72;

fn default_app_name() -> String {
    "Arcana Insights".to_string()
}

fn default_storage_path() -> String {
    "./data".to_string()
}

/// Gateway configuration loaded from environment.
///
/// | Env | Default | Description |
/// |-----|---------|--------------|
/// | ARCANA_APP_NAME | Arcana Insights | Application identity (status endpoint, email brand line). |
/// | ARCANA_PORT | 8700 | HTTP port for the gateway. |
/// | ARCANA_STORAGE_PATH | ./data | Base directory for the sled token store. |
/// | ARCANA_CAPTCHA_BYPASS | false | Explicit dev bypass: skip CAPTCHA verification entirely. |
/// | ARCANA_TOKEN_TTL_HOURS | 72 | Premium token lifetime; expired tokens report not-found. |
/// | CAPTCHA_SECRET | — | Shared secret for the CAPTCHA verify endpoint. |
/// | WEBHOOK_SHARED_SECRET | — | HMAC key for the commerce webhook signature. |
/// | EMAIL_API_KEY / EMAIL_FROM | — | Transactional email credentials and sender. |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// ARCANA_APP_NAME: identity for the status endpoint and the email brand line.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// ARCANA_PORT: HTTP port for the gateway.
    pub port: u16,
    /// ARCANA_STORAGE_PATH: base directory for the sled token store.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// ARCANA_CAPTCHA_BYPASS: when true, the CAPTCHA gate always passes (dev only).
    #[serde(default)]
    pub captcha_bypass: bool,
    /// CAPTCHA_SECRET: shared secret for the verification endpoint. Missing secret
    /// without bypass is a hard configuration failure, never a silent pass.
    #[serde(default)]
    pub captcha_secret: Option<String>,
    /// WEBHOOK_SHARED_SECRET: HMAC-SHA256 key for the commerce webhook.
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// EMAIL_API_KEY: transactional email API credential.
    #[serde(default)]
    pub email_api_key: Option<String>,
    /// EMAIL_FROM: sender address for outbound reports.
    #[serde(default = "default_email_from")]
    pub email_from: String,
    /// ARCANA_TOKEN_TTL_HOURS: premium token lifetime in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

fn default_email_from() -> String {
    "reports@arcana.local".to_string()
}

fn default_token_ttl_hours() -> u64 {
    DEFAULT_TOKEN_TTL_HOURS
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            port: DEFAULT_PORT,
            storage_path: default_storage_path(),
            captcha_bypass: false,
            captcha_secret: None,
            webhook_secret: None,
            email_api_key: None,
            email_from: default_email_from(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }
}

impl GatewayConfig {
    /// Load from environment. Unset or invalid => defaults (see struct field docs).
    pub fn from_env() -> Self {
        Self {
            app_name: env_string("ARCANA_APP_NAME").unwrap_or_else(default_app_name),
            port: std::env::var("ARCANA_PORT")
                .ok()
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            storage_path: env_string("ARCANA_STORAGE_PATH").unwrap_or_else(default_storage_path),
            captcha_bypass: env_bool("ARCANA_CAPTCHA_BYPASS", false),
            captcha_secret: env_string("CAPTCHA_SECRET"),
            webhook_secret: env_string("WEBHOOK_SHARED_SECRET"),
            email_api_key: env_string("EMAIL_API_KEY"),
            email_from: env_string("EMAIL_FROM").unwrap_or_else(default_email_from),
            token_ttl_hours: std::env::var("ARCANA_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_TOKEN_TTL_HOURS),
        }
    }

    /// Token TTL in milliseconds (store-level unit).
    pub fn token_ttl_ms(&self) -> u64 {
        self.token_ttl_hours.saturating_mul(60 * 60 * 1000)
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let config = GatewayConfig::default();
        assert_eq!(config.port, 8700);
        assert!(!config.captcha_bypass);
        assert_eq!(config.token_ttl_ms(), 72 * 60 * 60 * 1000);
    }

    #[test]
    fn test_token_ttl_saturates_on_huge_values() {
        let config = GatewayConfig { token_ttl_hours: u64::MAX, ..GatewayConfig::default() };
        assert_eq!(config.token_ttl_ms(), u64::MAX);
    }
}
