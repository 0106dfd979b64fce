//! Outbound email transport collaborator.
//!
//! Thin client over a transactional-email HTTP API. Attachment bytes are
//! base64-encoded on the wire. Delivery failure is a first-class error
//! (`ReportError::Delivery`) because premium flows must not delete their
//! token until the transport reports success.

use crate::error::{ReportError, ReportResult};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ENV_EMAIL_API_URL: &str = "EMAIL_API_URL";
const DEFAULT_API_URL: &str = "https://api.resend.com/emails";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One attachment; `content` is raw bytes, encoded at send time.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// One outbound message.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

/// Transport receipt: provider message id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    pub id: String,
}

#[derive(Serialize)]
struct WireAttachment {
    filename: String,
    content: String,
}

#[derive(Serialize)]
struct WireMessage {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<WireAttachment>,
}

#[derive(Deserialize)]
struct WireReceipt {
    #[serde(default)]
    id: String,
}

/// Email client. Construct once at startup and share.
pub struct EmailClient {
    api_key: String,
    api_url: String,
    from: String,
    client: reqwest::Client,
}

impl EmailClient {
    pub fn new(api_key: String, from: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.trim().to_string(),
            api_url: std::env::var(ENV_EMAIL_API_URL)
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            from,
            client,
        }
    }

    /// Sends one message. Any transport-level failure maps to
    /// `ReportError::Delivery`.
    pub async fn send(&self, message: &EmailMessage) -> ReportResult<SendReceipt> {
        let wire = WireMessage {
            from: self.from.clone(),
            to: vec![message.to.clone()],
            subject: message.subject.clone(),
            html: message.html.clone(),
            attachments: message
                .attachments
                .iter()
                .map(|a| WireAttachment {
                    filename: a.filename.clone(),
                    content: base64::engine::general_purpose::STANDARD.encode(&a.content),
                })
                .collect(),
        };

        let res = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&wire)
            .send()
            .await
            .map_err(|e| ReportError::Delivery(format!("email request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ReportError::Delivery(format!("email API error {}: {}", status, body)));
        }

        let receipt: WireReceipt = res
            .json()
            .await
            .map_err(|e| ReportError::Delivery(format!("email receipt parse failed: {}", e)))?;
        tracing::info!(target: "arcana::email", to = %message.to, id = %receipt.id, "Report email sent");
        Ok(SendReceipt { id: receipt.id })
    }
}

/// Transport seam for tests and for dev runs without an email credential:
/// the gateway depends on this trait, never on `EmailClient` directly.
#[async_trait::async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> ReportResult<SendReceipt>;
}

#[async_trait::async_trait]
impl EmailTransport for EmailClient {
    async fn send(&self, message: &EmailMessage) -> ReportResult<SendReceipt> {
        EmailClient::send(self, message).await
    }
}

/// Log-only transport for dev runs with no EMAIL_API_KEY configured.
pub struct NullEmailTransport;

#[async_trait::async_trait]
impl EmailTransport for NullEmailTransport {
    async fn send(&self, message: &EmailMessage) -> ReportResult<SendReceipt> {
        tracing::info!(
            target: "arcana::email",
            to = %message.to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "Email transport not configured; message dropped"
        );
        Ok(SendReceipt { id: "null-transport".to_string() })
    }
}
