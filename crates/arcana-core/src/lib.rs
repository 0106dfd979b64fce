//! arcana-core: report-synthesis library (submissions, content engines,
//! orchestrator, document rendering, premium token store, and the external
//! collaborators the gateway wires together).

mod astro_api;
mod captcha;
mod classifier;
mod config;
mod email;
pub mod engines;
mod error;
mod llm;
pub mod numerology;
mod orchestrator;
mod render;
mod store;
mod submission;
mod webhook;

pub use astro_api::{build_chart_context, sun_sign, AstroDataClient};
pub use captcha::{CaptchaOutcome, CaptchaVerifier};
pub use classifier::{classify, classify_by_keywords, QuestionKind};
pub use config::GatewayConfig;
pub use email::{
    Attachment, EmailClient, EmailMessage, EmailTransport, NullEmailTransport, SendReceipt,
};
pub use engines::EngineResult;
pub use error::{ReportError, ReportResult};
pub use llm::{strip_code_fence, LlmBridge, LlmMode};
pub use numerology::NumerologyProfile;
pub use orchestrator::{Orchestrator, ReportMode, SynthesisResult};
pub use render::{
    build_full_report_html, build_summary_html, gauge_svg, HtmlFlattenPdfBackend, PdfBackend,
    ReportDocument, ReportSection, SectionLine, SemanticPdfBackend, PLACEHOLDER,
};
pub use store::{MemoryTokenStore, SledTokenStore, TokenStore};
pub use submission::{FieldValue, Person, Submission};
pub use webhook::{extract_premium_token, sign, verify_signature};
