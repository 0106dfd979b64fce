//! Direct-answer engine: one plain answer to the submitted question.

use super::{run_schema_engine, EngineResult};
use crate::llm::LlmBridge;

pub const SCHEMA: [&str; 1] = ["answer"];

const FALLBACK: &str =
    "We could not generate a direct answer right now; the rest of your report still applies.";

const SYSTEM: &str = "You answer the user's question directly and concisely, in a warm and \
    honest tone. Schema key: answer.";

pub async fn run(llm: Option<&LlmBridge>, question: &str) -> EngineResult {
    run_schema_engine(llm, "direct", SYSTEM, question, &SCHEMA, FALLBACK).await
}

/// The answer text, used as the `directAnswer` branch of the synthesis result.
pub fn answer(result: &EngineResult) -> &str {
    result.get("answer")
}
