//! PDF rendering over the structured report document.
//!
//! Two substitutable backends behind one trait: `SemanticPdfBackend` draws
//! the document with typed text primitives (headings, labels, body), while
//! `HtmlFlattenPdfBackend` renders the HTML report, flattens it to text, and
//! sets it as a monospaced page run. Both produce the same visual layout:
//! brand line, title, Question, Answer, then the mode-dependent sections.

use super::{build_full_report_html, ReportDocument};
use crate::error::{ReportError, ReportResult};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const BODY_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 14.0;
const TITLE_SIZE: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 5.5;
const BODY_WRAP: usize = 92;

/// A renderer that accepts the structured document and returns PDF bytes.
pub trait PdfBackend: Send + Sync {
    fn render(&self, doc: &ReportDocument) -> ReportResult<Vec<u8>>;
}

/// Greedy word wrap at `width` characters.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Page cursor: tracks the current layer and y position, breaking to a new
/// page when the text run reaches the bottom margin.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    y_mm: f32,
}

impl PageWriter {
    fn new(title: &str) -> Self {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "text");
        let layer = doc.get_page(page).get_layer(layer);
        Self { doc, layer, y_mm: PAGE_HEIGHT_MM - MARGIN_MM }
    }

    fn font(&self, font: BuiltinFont) -> ReportResult<IndirectFontRef> {
        self.doc
            .add_builtin_font(font)
            .map_err(|e| ReportError::Render(format!("PDF font: {}", e)))
    }

    fn advance(&mut self, height_mm: f32) {
        if self.y_mm - height_mm < MARGIN_MM {
            let (page, layer) =
                self.doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "text");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y_mm = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        self.y_mm -= height_mm;
    }

    fn text_line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.advance(LINE_HEIGHT_MM * (size / BODY_SIZE));
        self.layer.use_text(text, size, Mm(MARGIN_MM), Mm(self.y_mm), font);
    }

    fn paragraph(&mut self, text: &str, size: f32, font: &IndirectFontRef, width: usize) {
        for line in wrap(text, width) {
            self.text_line(&line, size, font);
        }
    }

    fn gap(&mut self) {
        self.advance(LINE_HEIGHT_MM);
    }

    fn finish(self) -> ReportResult<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ReportError::Render(format!("PDF save: {}", e)))
    }
}

/// Semantic backend: typed drawing primitives per document element.
#[derive(Default)]
pub struct SemanticPdfBackend;

impl PdfBackend for SemanticPdfBackend {
    fn render(&self, doc: &ReportDocument) -> ReportResult<Vec<u8>> {
        let mut writer = PageWriter::new(&doc.title);
        let regular = writer.font(BuiltinFont::Helvetica)?;
        let bold = writer.font(BuiltinFont::HelveticaBold)?;

        writer.text_line(&doc.brand.to_uppercase(), BODY_SIZE, &bold);
        writer.gap();
        writer.paragraph(&doc.title, TITLE_SIZE, &bold, 48);
        writer.gap();

        if let Some(score) = doc.gauge_score {
            writer.text_line(&format!("Compatibility score: {} / 100", score), HEADING_SIZE, &bold);
            writer.gap();
        }

        for person in &doc.persons {
            writer.text_line(person.display_name(), HEADING_SIZE, &bold);
            writer.paragraph(
                &format!(
                    "Born {} {} in {}",
                    person.date_of_birth, person.time_of_birth, person.birth_place
                ),
                BODY_SIZE,
                &regular,
                BODY_WRAP,
            );
            writer.gap();
        }

        writer.text_line("Question", HEADING_SIZE, &bold);
        writer.paragraph(&doc.question, BODY_SIZE, &regular, BODY_WRAP);
        writer.gap();
        writer.text_line("Answer", HEADING_SIZE, &bold);
        writer.paragraph(&doc.answer, BODY_SIZE, &regular, BODY_WRAP);

        for section in &doc.sections {
            writer.gap();
            writer.text_line(&section.title, HEADING_SIZE, &bold);
            writer.paragraph(&section.lead, BODY_SIZE, &regular, BODY_WRAP);
            for line in &section.lines {
                writer.paragraph(
                    &format!("{}: {}", line.label, line.text),
                    BODY_SIZE,
                    &regular,
                    BODY_WRAP,
                );
            }
        }

        writer.finish()
    }
}

/// Flattening backend: renders the HTML report, converts it to plain text,
/// and sets the result as a monospaced run.
#[derive(Default)]
pub struct HtmlFlattenPdfBackend;

impl PdfBackend for HtmlFlattenPdfBackend {
    fn render(&self, doc: &ReportDocument) -> ReportResult<Vec<u8>> {
        let html = build_full_report_html(doc);
        let text = html2text::from_read(html.as_bytes(), BODY_WRAP)
            .map_err(|e| ReportError::Render(format!("HTML flatten: {}", e)))?;

        let mut writer = PageWriter::new(&doc.title);
        let mono = writer.font(BuiltinFont::Courier)?;
        for line in text.lines() {
            writer.text_line(line, BODY_SIZE, &mono);
        }
        writer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Orchestrator;
    use crate::submission::Submission;

    #[test]
    fn test_wrap_long_paragraph() {
        let lines = wrap("one two three four five", 9);
        assert_eq!(lines, ["one two", "three", "four five"]);
        assert_eq!(wrap("", 10), [""]);
    }

    async fn sample_document() -> ReportDocument {
        let mut sub = Submission::default();
        sub.set("fullName", "Jane Doe");
        sub.set("birthDate", "1990-05-14");
        let synthesis = Orchestrator::new(None, None).personal(&sub, "Should I change careers?").await;
        ReportDocument::from_synthesis(
            "Arcana Insights",
            "Your Personal Reading",
            "Should I change careers?",
            &synthesis,
            vec![sub.person()],
        )
    }

    #[tokio::test]
    async fn test_semantic_backend_produces_pdf_bytes() {
        let doc = sample_document().await;
        let bytes = SemanticPdfBackend.render(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_flatten_backend_produces_pdf_bytes() {
        let doc = sample_document().await;
        let bytes = HtmlFlattenPdfBackend.render(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
