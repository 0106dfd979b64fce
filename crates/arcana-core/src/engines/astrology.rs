//! Astrology engine: birth chart narrative for one person.

use super::{run_schema_engine, EngineResult};
use crate::llm::LlmBridge;
use crate::submission::Person;

pub const SCHEMA: [&str; 8] = [
    "summary",
    "planetaryPositions",
    "ascendant",
    "houses",
    "family",
    "loveHouse",
    "health",
    "career",
];

const FALLBACK: &str =
    "The stars are quiet on this point right now. A full chart reading will follow once the \
     celestial data is available again.";

const SYSTEM: &str = "You are a veteran astrologer writing a warm, specific birth-chart reading. \
    Ground every statement in the birth data provided. Schema keys: summary, planetaryPositions, \
    ascendant, houses, family, loveHouse, health, career.";

/// Runs the astrology engine. `chart_context` carries sun-sign / chart-API
/// enrichment; empty means the prompt runs on birth data alone.
pub async fn run(
    llm: Option<&LlmBridge>,
    person: &Person,
    question: &str,
    chart_context: &str,
) -> EngineResult {
    let mut user = format!(
        "Name: {}\nDate of birth: {}\nTime of birth: {}\nBirth place: {}\nQuestion: {}",
        person.full_name, person.date_of_birth, person.time_of_birth, person.birth_place, question,
    );
    if !chart_context.is_empty() {
        user.push_str("\n\n");
        user.push_str(chart_context);
    }
    run_schema_engine(llm, "astrology", SYSTEM, &user, &SCHEMA, FALLBACK).await
}
