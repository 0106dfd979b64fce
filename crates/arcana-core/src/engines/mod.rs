//! Content engines: each turns structured input into one categorized slice of
//! narrative, via an LLM call with a fixed JSON schema and an engine-specific
//! fallback.
//!
//! Failure policy (shared by every engine): no credential, HTTP error,
//! timeout, parse failure, or a missing schema key all degrade to the
//! fallback string for the affected keys. Engines never error and never
//! return fewer keys than their schema defines — downstream rendering
//! depends on that invariant.

pub mod astrology;
pub mod compat;
pub mod direct;
pub mod numerology;
pub mod palmistry;
pub mod triad;

use crate::llm::LlmBridge;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strict-JSON instruction appended to every engine system prompt.
pub(crate) const JSON_ONLY_INSTRUCTION: &str =
    "Respond with a single strict JSON object and nothing else: no prose, no markdown fences, \
     no keys beyond the requested schema. Every value must be a string unless stated otherwise.";

/// One engine's output: named narrative fields, always including `summary`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineResult {
    #[serde(flatten)]
    fields: BTreeMap<String, String>,
}

impl EngineResult {
    /// Every schema key set to `fallback`.
    pub fn fallback(schema: &[&str], fallback: &str) -> Self {
        let fields = schema.iter().map(|k| (k.to_string(), fallback.to_string())).collect();
        Self { fields }
    }

    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn summary(&self) -> &str {
        self.get("summary")
    }

    pub fn set(&mut self, key: &str, value: String) {
        self.fields.insert(key.to_string(), value);
    }
}

/// A JSON value coerced to narrative text: strings pass through, numbers and
/// booleans are printed, arrays join with "; ", anything else is skipped.
fn value_to_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_to_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        _ => None,
    }
}

/// Maps a parsed LLM object onto `schema`, filling missing or unusable keys
/// with `fallback`. The result always carries the full schema.
pub(crate) fn coerce_to_schema(
    value: &serde_json::Value,
    schema: &[&str],
    fallback: &str,
) -> EngineResult {
    let mut result = EngineResult::default();
    for key in schema {
        let text = value.get(*key).and_then(value_to_text).unwrap_or_else(|| fallback.to_string());
        result.set(key, text);
    }
    result
}

/// Shared engine runner: strict-JSON LLM call coerced onto `schema`, with the
/// engine's fallback on every failure path.
pub(crate) async fn run_schema_engine(
    llm: Option<&LlmBridge>,
    engine: &'static str,
    system: &str,
    user: &str,
    schema: &[&str],
    fallback: &str,
) -> EngineResult {
    let Some(bridge) = llm else {
        tracing::debug!(target: "arcana::engines", engine, "No LLM configured; using fallback");
        return EngineResult::fallback(schema, fallback);
    };
    let system = format!("{}\n\n{}", system, JSON_ONLY_INSTRUCTION);
    match bridge.complete_json(&system, user, 0.7).await {
        Ok(value) => coerce_to_schema(&value, schema, fallback),
        Err(e) => {
            tracing::warn!(target: "arcana::engines", engine, error = %e, "Engine call failed; using fallback");
            EngineResult::fallback(schema, fallback)
        }
    }
}
