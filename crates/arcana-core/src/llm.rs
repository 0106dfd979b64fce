//! LLM bridge: OpenAI-compatible chat completions (OpenRouter by default).
//!
//! Pure request/response: callers hand in a system instruction and a user
//! prompt and get back the raw completion text. Engines own their fallbacks;
//! this module never invents content on failure, it only reports the error.
//!
//! API key: `ARCANA_LLM_API_KEY` (or `OPENROUTER_API_KEY`) in `.env`.
//! `ARCANA_LLM_MODE=mock` routes to a deterministic offline stub.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const ENV_LLM_MODE: &str = "ARCANA_LLM_MODE";
const ENV_LLM_API_KEY: &str = "ARCANA_LLM_API_KEY";
const ENV_OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
const ENV_LLM_API_URL: &str = "ARCANA_LLM_API_URL";
const ENV_LLM_MODEL: &str = "ARCANA_LLM_MODEL";
const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

pub type LlmError = Box<dyn std::error::Error + Send + Sync>;

/// Mode for LLM invocation: mock (deterministic stub, no network) or live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LlmMode {
    #[default]
    Live,
    Mock,
}

impl LlmMode {
    pub fn from_env() -> Self {
        match std::env::var(ENV_LLM_MODE).as_deref() {
            Ok("mock") => LlmMode::Mock,
            _ => LlmMode::Live,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmMode::Live => "live",
            LlmMode::Mock => "mock",
        }
    }
}

// OpenAI-compatible request/response structures
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Chat-completion client. Construct once at startup and share; never
/// re-instantiate per call.
pub struct LlmBridge {
    api_key: String,
    api_url: String,
    model: String,
    mode: LlmMode,
    client: reqwest::Client,
}

impl LlmBridge {
    /// Bridge from environment. Returns `None` when no key is configured and
    /// mock mode is off — callers treat that as "engines run on fallbacks".
    pub fn from_env() -> Option<Self> {
        let mode = LlmMode::from_env();
        let api_key = std::env::var(ENV_LLM_API_KEY)
            .or_else(|_| std::env::var(ENV_OPENROUTER_API_KEY))
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        match (mode, api_key) {
            (LlmMode::Mock, _) => Some(Self::mock()),
            (LlmMode::Live, Some(key)) => Some(Self::new(key)),
            (LlmMode::Live, None) => None,
        }
    }

    /// Live bridge with an explicit API key.
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.trim().to_string(),
            api_url: std::env::var(ENV_LLM_API_URL)
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            model: std::env::var(ENV_LLM_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            mode: LlmMode::Live,
            client,
        }
    }

    /// Deterministic offline stub: every completion is an empty JSON object,
    /// so engines fill each schema key from their own fallback.
    pub fn mock() -> Self {
        Self {
            api_key: String::new(),
            api_url: String::new(),
            model: "mock".to_string(),
            mode: LlmMode::Mock,
            client: reqwest::Client::new(),
        }
    }

    pub fn mode(&self) -> LlmMode {
        self.mode
    }

    /// Set the model (e.g. `anthropic/claude-3.5-sonnet`).
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// One chat completion. Returns the raw completion text.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        if self.mode == LlmMode::Mock {
            return Ok("{}".to_string());
        }
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: system.to_string() },
                ChatMessage { role: "user".to_string(), content: user.to_string() },
            ],
            temperature: Some(temperature),
            max_tokens: Some(2048),
        };

        let res = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("LLM request failed: {}", e))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("LLM API error {}: {}", status, body).into());
        }

        let parsed: ChatResponse =
            res.json().await.map_err(|e| format!("LLM response parse failed: {}", e))?;

        parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| "LLM returned no choices".into())
    }

    /// One completion expected to be strict JSON. Strips a markdown code-fence
    /// wrapper before parsing; parse failure is a first-class error, not a crash.
    pub async fn complete_json(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<serde_json::Value, LlmError> {
        let raw = self.complete(system, user, temperature).await?;
        let stripped = strip_code_fence(&raw);
        serde_json::from_str(stripped)
            .map_err(|e| format!("LLM JSON parse failed: {} in {:?}", e, stripped).into())
    }
}

/// Strips a ```json ... ``` (or bare ```) wrapper if present.
pub fn strip_code_fence(raw: &str) -> &str {
    let s = raw.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  ```json {\"a\":1} ```  "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_mock_bridge_returns_empty_object() {
        let bridge = LlmBridge::mock();
        let raw = bridge.complete("sys", "user", 0.3).await.unwrap();
        assert_eq!(raw, "{}");
        let value = bridge.complete_json("sys", "user", 0.3).await.unwrap();
        assert!(value.as_object().unwrap().is_empty());
    }
}
