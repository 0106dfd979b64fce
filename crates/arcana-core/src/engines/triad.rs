//! Triad synthesis engine: blends the astrology, numerology, and palmistry
//! readings into one combined narrative. Must run strictly after all three
//! base engines have resolved.

use super::{run_schema_engine, EngineResult};
use crate::llm::LlmBridge;

pub const SCHEMA: [&str; 4] = ["summary", "combinedInsight", "shadow", "growth"];

const FALLBACK: &str =
    "The three readings each speak for themselves; their combined thread will be woven in an \
     updated report.";

const SYSTEM: &str = "You synthesize three readings (astrology, numerology, palmistry) for the \
    same person into one combined narrative. Name where they agree and where they tension. \
    Schema keys: summary, combinedInsight, shadow, growth.";

pub async fn run(
    llm: Option<&LlmBridge>,
    question: &str,
    astrology: &EngineResult,
    numerology: &EngineResult,
    palmistry: &EngineResult,
) -> EngineResult {
    let user = format!(
        "Question: {}\n\nAstrology reading: {}\n\nNumerology reading: {}\n\nPalmistry reading: {}",
        question,
        astrology.summary(),
        numerology.summary(),
        palmistry.summary(),
    );
    run_schema_engine(llm, "triad", SYSTEM, &user, &SCHEMA, FALLBACK).await
}

/// Cross-engine summary: the single paragraph that heads the short HTML email.
/// Same dependency rule as the triad: runs after the base engines resolve.
pub async fn cross_summary(
    llm: Option<&LlmBridge>,
    question: &str,
    astrology: &EngineResult,
    numerology: &EngineResult,
    palmistry: &EngineResult,
) -> String {
    const SUMMARY_SYSTEM: &str = "You write a single warm paragraph summarizing a three-part \
        spiritual reading as it bears on the user's question. Schema key: summary.";
    const SUMMARY_FALLBACK: &str =
        "Your full reading is attached; each section speaks to your question in its own way.";
    let user = format!(
        "Question: {}\nAstrology: {}\nNumerology: {}\nPalmistry: {}",
        question,
        astrology.summary(),
        numerology.summary(),
        palmistry.summary(),
    );
    let result =
        run_schema_engine(llm, "cross_summary", SUMMARY_SYSTEM, &user, &["summary"], SUMMARY_FALLBACK)
            .await;
    result.summary().to_string()
}
