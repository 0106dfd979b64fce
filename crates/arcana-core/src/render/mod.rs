//! Document rendering: HTML email bodies and PDF bytes from one synthesis
//! result. Rendering never fails on missing optional fields — placeholders
//! (an em-dash) stand in for anything an engine left unpopulated.

mod html;
mod pdf;

pub use html::{build_full_report_html, build_summary_html, gauge_svg};
pub use pdf::{HtmlFlattenPdfBackend, PdfBackend, SemanticPdfBackend};

use crate::engines::EngineResult;
use crate::orchestrator::{ReportMode, SynthesisResult};
use crate::submission::Person;
use serde::{Deserialize, Serialize};

/// Placeholder for optional fields the engines left empty.
pub const PLACEHOLDER: &str = "—";

/// One labeled line inside a report section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionLine {
    pub label: String,
    pub text: String,
}

/// One report section: a titled engine reading, its summary paragraph first,
/// the remaining schema fields as labeled lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub lead: String,
    pub lines: Vec<SectionLine>,
}

/// Structured document both PDF backends consume; layout-neutral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub brand: String,
    pub title: String,
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gauge_score: Option<u32>,
    pub persons: Vec<Person>,
    pub sections: Vec<ReportSection>,
}

fn or_placeholder(text: &str) -> String {
    if text.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        text.to_string()
    }
}

/// Field label for display: `loveHouse` => `Love House`.
fn label_for(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else {
            if c.is_uppercase() {
                out.push(' ');
            }
            out.push(c);
        }
    }
    out
}

/// Builds one section from an engine result: summary leads, every other
/// schema field becomes a labeled line (summary skipped to avoid duplication).
fn section_from_engine(title: &str, result: &EngineResult, schema: &[&str]) -> ReportSection {
    let lines = schema
        .iter()
        .filter(|key| **key != "summary")
        .map(|key| SectionLine { label: label_for(key), text: or_placeholder(result.get(key)) })
        .collect();
    ReportSection {
        title: title.to_string(),
        lead: or_placeholder(result.summary()),
        lines,
    }
}

impl ReportDocument {
    /// Structured document for one synthesis result. `persons` carries one
    /// entry for personal/technical reports and two for compat.
    pub fn from_synthesis(
        brand: &str,
        title: &str,
        question: &str,
        synthesis: &SynthesisResult,
        persons: Vec<Person>,
    ) -> Self {
        use crate::engines::{astrology, compat, numerology, palmistry, triad};

        let mut sections = Vec::new();
        if let Some(result) = &synthesis.astrology {
            sections.push(section_from_engine("Astrology", result, &astrology::SCHEMA));
        }
        if let Some(result) = &synthesis.numerology {
            sections.push(section_from_engine("Numerology", result, &numerology::SCHEMA));
        }
        if let Some(result) = &synthesis.palmistry {
            sections.push(section_from_engine("Palmistry", result, &palmistry::SCHEMA));
        }
        if let Some(result) = &synthesis.triad {
            sections.push(section_from_engine("Combined Reading", result, &triad::SCHEMA));
        }
        if let Some(result) = &synthesis.compat {
            sections.push(section_from_engine("Compatibility", result, &compat::SCHEMA));
        }

        let answer = synthesis
            .direct_answer
            .as_deref()
            .map(or_placeholder)
            .unwrap_or_else(|| or_placeholder(&synthesis.summary));

        Self {
            brand: brand.to_string(),
            title: title.to_string(),
            question: or_placeholder(question),
            answer,
            gauge_score: match synthesis.mode {
                ReportMode::Compat => synthesis.compat_score,
                _ => None,
            },
            persons,
            sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_for_camel_case() {
        assert_eq!(label_for("loveHouse"), "Love House");
        assert_eq!(label_for("summary"), "Summary");
        assert_eq!(label_for("planetaryPositions"), "Planetary Positions");
    }

    #[test]
    fn test_section_skips_summary_line_and_placeholders() {
        let result = EngineResult::fallback(&["summary", "alpha"], "");
        let section = section_from_engine("Test", &result, &["summary", "alpha"]);
        assert_eq!(section.lead, PLACEHOLDER);
        assert_eq!(section.lines.len(), 1);
        assert_eq!(section.lines[0].label, "Alpha");
        assert_eq!(section.lines[0].text, PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_document_from_personal_synthesis() {
        let orchestrator = crate::orchestrator::Orchestrator::new(None, None);
        let mut sub = crate::submission::Submission::default();
        sub.set("fullName", "Jane Doe");
        sub.set("birthDate", "1990-05-14");
        let synthesis = orchestrator.personal(&sub, "Should I change careers?").await;
        let doc = ReportDocument::from_synthesis(
            "Arcana Insights",
            "Your Personal Reading",
            "Should I change careers?",
            &synthesis,
            vec![sub.person()],
        );
        assert!(doc.gauge_score.is_none());
        let titles: Vec<&str> = doc.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Astrology", "Numerology", "Palmistry", "Combined Reading"]);
        assert!(!doc.answer.is_empty());
    }
}
