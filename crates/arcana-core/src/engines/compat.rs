//! Compatibility engine: one paired reading for two people, plus a numeric
//! score clamped to [0, 100].

use super::{coerce_to_schema, EngineResult, JSON_ONLY_INSTRUCTION};
use crate::llm::LlmBridge;
use crate::numerology::NumerologyProfile;
use crate::submission::Person;

pub const SCHEMA: [&str; 13] = [
    "summary",
    "answerToQuestion",
    "reasoning",
    "coreCompatibility",
    "strengths",
    "challenges",
    "overall",
    "astrologyPerson1",
    "astrologyPerson2",
    "numerologyPerson1",
    "numerologyPerson2",
    "palmistryPerson1",
    "palmistryPerson2",
];

/// Score used whenever the LLM path is unavailable or unusable.
pub const FALLBACK_SCORE: u32 = 50;

const FALLBACK: &str =
    "Your connection has its own weather; a fuller compatibility reading will follow soon.";

const SYSTEM: &str = "You are a relationship reader comparing two people across astrology, \
    numerology, and palmistry. Schema keys: summary, answerToQuestion, reasoning, \
    coreCompatibility, strengths, challenges, overall, astrologyPerson1, astrologyPerson2, \
    numerologyPerson1, numerologyPerson2, palmistryPerson1, palmistryPerson2, plus a numeric \
    key score between 0 and 100.";

/// Clamp-and-round for the LLM-returned score: `round(clamp(score, 0, 100))`.
pub fn clamp_score(score: f64) -> u32 {
    score.clamp(0.0, 100.0).round() as u32
}

fn person_block(label: &str, person: &Person, profile: &NumerologyProfile, palm: &EngineResult) -> String {
    format!(
        "{label}: {} (born {} {} in {})\n{label} life path {}, expression {}\n{label} palm summary: {}",
        person.full_name,
        person.date_of_birth,
        person.time_of_birth,
        person.birth_place,
        profile.life_path,
        profile.expression,
        palm.summary(),
    )
}

/// Runs the compatibility engine for two persons. Returns the paired reading
/// and the clamped score.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    llm: Option<&LlmBridge>,
    question: &str,
    person1: &Person,
    profile1: &NumerologyProfile,
    palm1: &EngineResult,
    person2: &Person,
    profile2: &NumerologyProfile,
    palm2: &EngineResult,
) -> (EngineResult, u32) {
    let Some(bridge) = llm else {
        return (EngineResult::fallback(&SCHEMA, FALLBACK), FALLBACK_SCORE);
    };
    let system = format!("{}\n\n{}", SYSTEM, JSON_ONLY_INSTRUCTION);
    let user = format!(
        "Question: {}\n\n{}\n\n{}",
        question,
        person_block("Person 1", person1, profile1, palm1),
        person_block("Person 2", person2, profile2, palm2),
    );
    match bridge.complete_json(&system, &user, 0.7).await {
        Ok(value) => {
            let score = value
                .get("score")
                .and_then(|s| s.as_f64())
                .map(clamp_score)
                .unwrap_or(FALLBACK_SCORE);
            (coerce_to_schema(&value, &SCHEMA, FALLBACK), score)
        }
        Err(e) => {
            tracing::warn!(target: "arcana::engines", engine = "compat", error = %e, "Engine call failed; using fallback");
            (EngineResult::fallback(&SCHEMA, FALLBACK), FALLBACK_SCORE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(140.0), 100);
        assert_eq!(clamp_score(-5.0), 0);
        assert_eq!(clamp_score(73.6), 74);
        assert_eq!(clamp_score(0.0), 0);
        assert_eq!(clamp_score(100.0), 100);
    }

    #[tokio::test]
    async fn test_fallback_reading_and_score() {
        let person = Person::default();
        let profile = crate::numerology::profile("", "");
        let palm = EngineResult::fallback(&["summary"], "n/a");
        let (result, score) =
            run(None, "q", &person, &profile, &palm, &person, &profile, &palm).await;
        assert_eq!(score, FALLBACK_SCORE);
        for key in SCHEMA {
            assert!(!result.get(key).is_empty());
        }
    }
}
