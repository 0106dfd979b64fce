//! Engine orchestrator: runs the right subset of content engines for a mode
//! and merges their outputs into one synthesis result.
//!
//! Independent engines run concurrently (`tokio::join!`); the triad and the
//! cross-engine summary are sequenced strictly after the three base readings
//! resolve. Engines own their own fallbacks, so no engine error can surface
//! here and one engine's fallback never degrades another's execution.

use crate::astro_api::{build_chart_context, AstroDataClient};
use crate::classifier::QuestionKind;
use crate::engines::{astrology, compat, direct, numerology, palmistry, triad, EngineResult};
use crate::llm::LlmBridge;
use crate::numerology::NumerologyProfile;
use crate::submission::Submission;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Report mode selected from the classified question (or forced by the
/// compatibility intake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    Personal,
    Technical,
    Compat,
}

impl From<QuestionKind> for ReportMode {
    fn from(kind: QuestionKind) -> Self {
        match kind {
            QuestionKind::Personal => ReportMode::Personal,
            QuestionKind::Technical => ReportMode::Technical,
        }
    }
}

impl ReportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportMode::Personal => "personal",
            ReportMode::Technical => "technical",
            ReportMode::Compat => "compat",
        }
    }
}

/// Merged output of one orchestrator run. Exactly one mode branch is
/// populated; `summary` is always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub mode: ReportMode,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub astrology: Option<EngineResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numerology: Option<EngineResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palmistry: Option<EngineResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triad: Option<EngineResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compat: Option<EngineResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compat_score: Option<u32>,
    /// Computed numbers behind the numerology narrative (personal mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numerology_profile: Option<NumerologyProfile>,
}

impl SynthesisResult {
    fn empty(mode: ReportMode) -> Self {
        Self {
            mode,
            summary: String::new(),
            direct_answer: None,
            astrology: None,
            numerology: None,
            palmistry: None,
            triad: None,
            compat: None,
            compat_score: None,
            numerology_profile: None,
        }
    }
}

/// Owns the shared collaborators and fans a submission out to the engines.
/// Construct once at startup; collaborators are never re-instantiated per call.
pub struct Orchestrator {
    llm: Option<Arc<LlmBridge>>,
    astro: Option<Arc<AstroDataClient>>,
}

impl Orchestrator {
    pub fn new(llm: Option<Arc<LlmBridge>>, astro: Option<Arc<AstroDataClient>>) -> Self {
        Self { llm, astro }
    }

    fn bridge(&self) -> Option<&LlmBridge> {
        self.llm.as_deref()
    }

    pub fn llm_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Personal fan-out: astrology, numerology narrative, palmistry, and the
    /// direct answer run concurrently; triad and cross-engine summary run
    /// strictly after the three base readings.
    pub async fn personal(&self, submission: &Submission, question: &str) -> SynthesisResult {
        let person = submission.person();
        let profile = crate::numerology::profile(&person.full_name, &person.date_of_birth);
        let palm_image = submission.palm_image();
        let chart_context = build_chart_context(self.astro.as_deref(), &person).await;

        let llm = self.bridge();
        let (astrology_r, numerology_r, palmistry_r, direct_r) = tokio::join!(
            astrology::run(llm, &person, question, &chart_context),
            numerology::run(llm, &person, &profile, question),
            palmistry::run(llm, &person, question, palm_image.as_deref()),
            direct::run(llm, question),
        );

        let (triad_r, summary) = tokio::join!(
            triad::run(llm, question, &astrology_r, &numerology_r, &palmistry_r),
            triad::cross_summary(llm, question, &astrology_r, &numerology_r, &palmistry_r),
        );

        SynthesisResult {
            summary,
            direct_answer: Some(direct::answer(&direct_r).to_string()),
            astrology: Some(astrology_r),
            numerology: Some(numerology_r),
            palmistry: Some(palmistry_r),
            triad: Some(triad_r),
            numerology_profile: Some(profile),
            ..SynthesisResult::empty(ReportMode::Personal)
        }
    }

    /// Technical path: direct answer only; the summary mirrors the answer.
    /// Deliberately skips the esoteric engines instead of reusing the
    /// personal fan-out.
    pub async fn technical(&self, question: &str) -> SynthesisResult {
        let direct_r = direct::run(self.bridge(), question).await;
        let answer = direct::answer(&direct_r).to_string();
        SynthesisResult {
            summary: answer.clone(),
            direct_answer: Some(answer),
            ..SynthesisResult::empty(ReportMode::Technical)
        }
    }

    /// Compatibility path: palmistry once per person (concurrently), then one
    /// compatibility call carrying both persons. No triad step.
    pub async fn compat(
        &self,
        submission: &Submission,
        partner: &Submission,
        question: &str,
    ) -> SynthesisResult {
        let person1 = submission.person();
        let person2 = partner.person();
        let profile1 = crate::numerology::profile(&person1.full_name, &person1.date_of_birth);
        let profile2 = crate::numerology::profile(&person2.full_name, &person2.date_of_birth);
        let image1 = submission.palm_image();
        let image2 = partner.palm_image();

        let llm = self.bridge();
        let (palm1, palm2) = tokio::join!(
            palmistry::run(llm, &person1, question, image1.as_deref()),
            palmistry::run(llm, &person2, question, image2.as_deref()),
        );

        let (compat_r, score) = compat::run(
            llm, question, &person1, &profile1, &palm1, &person2, &profile2, &palm2,
        )
        .await;

        SynthesisResult {
            summary: compat_r.summary().to_string(),
            compat: Some(compat_r),
            compat_score: Some(score),
            ..SynthesisResult::empty(ReportMode::Compat)
        }
    }
}
