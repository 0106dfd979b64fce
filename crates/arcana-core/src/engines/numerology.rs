//! Numerology narrative engine: turns the computed profile into prose.
//!
//! The numbers themselves come from [`crate::numerology`] and are passed into
//! the prompt; the LLM only narrates, it never computes.

use super::{run_schema_engine, EngineResult};
use crate::llm::LlmBridge;
use crate::numerology::NumerologyProfile;
use crate::submission::Person;

pub const SCHEMA: [&str; 6] =
    ["summary", "lifePath", "expression", "personality", "soulUrge", "maturity"];

const FALLBACK: &str =
    "Your numbers hold their meaning even when words fail us. A full interpretation will follow \
     shortly.";

const SYSTEM: &str = "You are a numerologist interpreting a computed Pythagorean profile. \
    Use the exact numbers given; do not recompute them. Schema keys: summary, lifePath, \
    expression, personality, soulUrge, maturity.";

pub async fn run(
    llm: Option<&LlmBridge>,
    person: &Person,
    profile: &NumerologyProfile,
    question: &str,
) -> EngineResult {
    let user = format!(
        "Name: {}\nQuestion: {}\nLife path: {}\nExpression: {}\nPersonality: {}\nSoul urge: {}\n\
         Maturity: {}\nPinnacles: {:?}\nChallenges: {:?}",
        person.full_name,
        question,
        profile.life_path,
        profile.expression,
        profile.personality,
        profile.soul_urge,
        profile.maturity,
        profile.pinnacles,
        profile.challenges,
    );
    run_schema_engine(llm, "numerology", SYSTEM, &user, &SCHEMA, FALLBACK).await
}
