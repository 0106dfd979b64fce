//! HTML rendering: the short summary email body and the long report document.

use super::{or_placeholder, ReportDocument, PLACEHOLDER};
use crate::orchestrator::{ReportMode, SynthesisResult};

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Semi-circle gauge for the compatibility score: an SVG arc whose sweep
/// angle is `180° × score/100`.
pub fn gauge_svg(score: u32) -> String {
    let score = score.min(100);
    let theta = std::f64::consts::PI * f64::from(score) / 100.0;
    let x = 100.0 - 80.0 * theta.cos();
    let y = 100.0 - 80.0 * theta.sin();
    format!(
        concat!(
            "<svg width=\"200\" height=\"110\" viewBox=\"0 0 200 110\">",
            "<path d=\"M 20 100 A 80 80 0 0 1 180 100\" fill=\"none\" stroke=\"#eee\" stroke-width=\"12\"/>",
            "<path d=\"M 20 100 A 80 80 0 0 1 {x:.1} {y:.1}\" fill=\"none\" stroke=\"#7c5cbf\" stroke-width=\"12\"/>",
            "<text x=\"100\" y=\"95\" text-anchor=\"middle\" font-size=\"28\" fill=\"#333\">{score}</text>",
            "</svg>"
        ),
        x = x,
        y = y,
        score = score,
    )
}

/// Short HTML summary: for compat mode the numeric score and a one-paragraph
/// summary; for other modes the question and the cross-engine summary.
/// Missing optional fields render as an em-dash, never a panic.
pub fn build_summary_html(question: &str, synthesis: &SynthesisResult) -> String {
    let summary = or_placeholder(&synthesis.summary);
    match synthesis.mode {
        ReportMode::Compat => {
            let score = synthesis.compat_score.map(|s| s.to_string());
            format!(
                "<div class=\"arcana-summary\">\
                 <h2>Compatibility: {}</h2>\
                 {}\
                 <p>{}</p>\
                 </div>",
                score.as_deref().unwrap_or(PLACEHOLDER),
                synthesis.compat_score.map(gauge_svg).unwrap_or_default(),
                escape(&summary),
            )
        }
        _ => format!(
            "<div class=\"arcana-summary\">\
             <h2>Your question</h2><p>{}</p>\
             <h2>In short</h2><p>{}</p>\
             </div>",
            escape(&or_placeholder(question)),
            escape(&summary),
        ),
    }
}

/// Long HTML report over the structured document: brand header, title,
/// question, answer, optional gauge, per-person blocks, then one section per
/// populated engine (summary paragraph first, remaining fields as labeled
/// lines).
pub fn build_full_report_html(doc: &ReportDocument) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<!DOCTYPE html><html><body style=\"font-family: Georgia, serif; color: #222;\">");
    out.push_str(&format!(
        "<p style=\"letter-spacing: 2px; color: #7c5cbf;\">{}</p>",
        escape(&doc.brand)
    ));
    out.push_str(&format!("<h1>{}</h1>", escape(&doc.title)));

    if let Some(score) = doc.gauge_score {
        out.push_str(&gauge_svg(score));
    }

    for person in &doc.persons {
        out.push_str("<div class=\"person\">");
        out.push_str(&format!("<h3>{}</h3>", escape(person.display_name())));
        for (label, value) in [
            ("Born", person.date_of_birth.as_str()),
            ("Time", person.time_of_birth.as_str()),
            ("Place", person.birth_place.as_str()),
        ] {
            out.push_str(&format!(
                "<p><strong>{}:</strong> {}</p>",
                label,
                escape(&or_placeholder(value))
            ));
        }
        out.push_str("</div>");
    }

    out.push_str(&format!("<h2>Question</h2><p>{}</p>", escape(&doc.question)));
    out.push_str(&format!("<h2>Answer</h2><p>{}</p>", escape(&doc.answer)));

    for section in &doc.sections {
        out.push_str(&format!("<h2>{}</h2>", escape(&section.title)));
        out.push_str(&format!("<p>{}</p>", escape(&section.lead)));
        for line in &section.lines {
            out.push_str(&format!(
                "<p><strong>{}:</strong> {}</p>",
                escape(&line.label),
                escape(&line.text)
            ));
        }
    }

    out.push_str("</body></html>");
    out
}
