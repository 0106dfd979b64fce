//! Question classifier: personal vs technical intent.
//!
//! Primary path is a constrained LLM prompt requesting strict JSON
//! `{"type": "personal"|"technical"}`. Whenever the bridge is absent, the
//! call errors, or the JSON does not parse, the deterministic keyword scan
//! decides instead. Classification errors are logged and swallowed; this
//! function always returns an answer.

use crate::llm::LlmBridge;
use serde::{Deserialize, Serialize};

/// Keywords that mark a question as personal under the deterministic fallback.
const PERSONAL_KEYWORDS: [&str; 13] = [
    "my", "should i", "will i", "born", "relationship", "marriage", "career", "health", "love",
    "life", "astrology", "numerology", "palm",
];

const CLASSIFY_SYSTEM: &str = "You classify a user question as personal or technical. \
    Personal questions are about the asker's own life, relationships, future, or spiritual matters. \
    Technical questions are about facts, science, engineering, or how things work. \
    Respond with strict JSON only: {\"type\": \"personal\"} or {\"type\": \"technical\"}. No prose.";

/// Report intent for an inbound question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Personal,
    Technical,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Personal => "personal",
            QuestionKind::Technical => "technical",
        }
    }
}

/// Classifies `question`. `llm: None` (no credential configured) goes straight
/// to the keyword fallback.
pub async fn classify(llm: Option<&LlmBridge>, question: &str) -> QuestionKind {
    if let Some(bridge) = llm {
        match bridge.complete_json(CLASSIFY_SYSTEM, question, 0.0).await {
            Ok(value) => {
                if let Some(kind) = value.get("type").and_then(|t| t.as_str()) {
                    match kind {
                        "personal" => return QuestionKind::Personal,
                        "technical" => return QuestionKind::Technical,
                        _ => {}
                    }
                }
                tracing::warn!(target: "arcana::classifier", "Classifier JSON missing type field; using keyword fallback");
            }
            Err(e) => {
                tracing::warn!(target: "arcana::classifier", error = %e, "Classifier LLM call failed; using keyword fallback");
            }
        }
    }
    classify_by_keywords(question)
}

/// Deterministic fallback: any keyword hit in the lowercased question =>
/// personal, else technical.
pub fn classify_by_keywords(question: &str) -> QuestionKind {
    let lower = question.to_lowercase();
    if PERSONAL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        QuestionKind::Personal
    } else {
        QuestionKind::Technical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_fallback_personal() {
        assert_eq!(classify_by_keywords("Will I find love?"), QuestionKind::Personal);
        assert_eq!(classify_by_keywords("Should I change careers?"), QuestionKind::Personal);
        assert_eq!(classify_by_keywords("What does my palm say?"), QuestionKind::Personal);
    }

    #[test]
    fn test_keyword_fallback_technical() {
        assert_eq!(
            classify_by_keywords("What is the time complexity of quicksort?"),
            QuestionKind::Technical
        );
        assert_eq!(classify_by_keywords("How do transistors work?"), QuestionKind::Technical);
    }

    #[tokio::test]
    async fn test_classify_without_bridge_uses_fallback() {
        assert_eq!(classify(None, "Will I find love?").await, QuestionKind::Personal);
        assert_eq!(classify(None, "Explain TCP handshakes").await, QuestionKind::Technical);
    }

    #[tokio::test]
    async fn test_classify_with_mock_bridge_falls_back_on_missing_type() {
        // Mock bridge returns "{}", which has no "type" field.
        let bridge = crate::llm::LlmBridge::mock();
        assert_eq!(classify(Some(&bridge), "Will I find love?").await, QuestionKind::Personal);
    }
}
