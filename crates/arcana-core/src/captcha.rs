//! CAPTCHA verification collaborator.
//!
//! Given a client token and optional IP, asks the provider's verify endpoint
//! whether the token is genuine. A missing shared secret is either an explicit
//! dev bypass (always pass) or a hard configuration failure — never a silent
//! guess.

use crate::error::{ReportError, ReportResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ENV_VERIFY_URL: &str = "CAPTCHA_VERIFY_URL";
const DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Verification outcome: our decision plus the provider's raw response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaOutcome {
    pub ok: bool,
    pub raw: serde_json::Value,
}

#[derive(Deserialize)]
struct ProviderResponse {
    #[serde(default)]
    success: bool,
}

/// Verifier built once at startup from config.
pub struct CaptchaVerifier {
    secret: Option<String>,
    bypass: bool,
    verify_url: String,
    client: reqwest::Client,
}

impl CaptchaVerifier {
    pub fn new(secret: Option<String>, bypass: bool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            secret,
            bypass,
            verify_url: std::env::var(ENV_VERIFY_URL)
                .unwrap_or_else(|_| DEFAULT_VERIFY_URL.to_string()),
            client,
        }
    }

    pub fn bypassed(&self) -> bool {
        self.bypass
    }

    /// Verifies a client token. Bypass => always pass; missing secret without
    /// bypass => `ReportError::Config`. Provider/network errors come back as a
    /// failed verification, not as a pipeline error.
    pub async fn verify(&self, token: &str, remote_ip: Option<&str>) -> ReportResult<CaptchaOutcome> {
        if self.bypass {
            return Ok(CaptchaOutcome {
                ok: true,
                raw: serde_json::json!({"bypass": true}),
            });
        }
        let Some(secret) = self.secret.as_deref() else {
            return Err(ReportError::Config(
                "CAPTCHA secret is not configured and bypass is off".to_string(),
            ));
        };

        let mut form = vec![("secret", secret.to_string()), ("response", token.to_string())];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip.to_string()));
        }

        let res = self.client.post(&self.verify_url).form(&form).send().await;
        match res {
            Ok(res) => {
                let raw: serde_json::Value = res.json().await.unwrap_or(serde_json::Value::Null);
                let ok = serde_json::from_value::<ProviderResponse>(raw.clone())
                    .map(|p| p.success)
                    .unwrap_or(false);
                Ok(CaptchaOutcome { ok, raw })
            }
            Err(e) => {
                tracing::warn!(target: "arcana::captcha", error = %e, "CAPTCHA verify request failed");
                Ok(CaptchaOutcome {
                    ok: false,
                    raw: serde_json::json!({"error": e.to_string()}),
                })
            }
        }
    }
}
