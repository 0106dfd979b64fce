//! Request handlers: the report delivery state machine and its premium /
//! webhook variants.
//!
//! Shared policy lives here: the error-to-status mapping (only Validation,
//! Auth, NotFound, Delivery, and Internal cross the boundary as non-200
//! responses) and the synthesize-render-email pipeline every flow ends in.

pub mod premium;
pub mod report;
pub mod webhook;

use crate::AppState;
use arcana_core::{
    build_full_report_html, build_summary_html, classify, Attachment, EmailMessage, ReportDocument,
    ReportError, ReportMode, ReportResult, Submission, SynthesisResult,
};
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Upper bound on a buffered intake body; multipart palm uploads fit well
/// under this.
const MAX_INTAKE_BYTES: usize = 8 * 1024 * 1024;

pub(crate) type ErrorResponse = (StatusCode, Json<serde_json::Value>);

/// Maps the error taxonomy onto HTTP statuses. Internal detail is logged,
/// never echoed to the caller.
pub(crate) fn error_response(err: ReportError) -> ErrorResponse {
    let (status, message) = match &err {
        ReportError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
        ReportError::Auth(m) => (StatusCode::FORBIDDEN, m.clone()),
        ReportError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
        ReportError::Delivery(m) => {
            tracing::error!(target: "arcana::gateway", error = %m, "Email delivery failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Report email could not be delivered".to_string())
        }
        ReportError::Config(m) => {
            tracing::error!(target: "arcana::gateway", error = %m, "Configuration error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Service is misconfigured".to_string())
        }
        ReportError::Store(m) | ReportError::Render(m) | ReportError::Internal(m) => {
            tracing::error!(target: "arcana::gateway", error = %m, "Internal error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
        }
    };
    (status, Json(serde_json::json!({"ok": false, "error": message})))
}

/// Parses a raw JSON body into a value, as a 400-class validation failure
/// rather than an extractor rejection.
pub(crate) fn parse_json_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> ReportResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| ReportError::Validation(format!("malformed request body: {}", e)))
}

/// Reads an intake request in either wire shape and lands both in the same
/// JSON value: a JSON body passes through; multipart parts become string
/// fields, with repeated part names coalescing into lists and binary parts
/// (palm image uploads) carried as base64 text. A part named `partner` holds
/// a nested JSON object.
pub(crate) async fn read_intake(request: Request) -> ReportResult<serde_json::Value> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false);

    if !is_multipart {
        let bytes = axum::body::to_bytes(request.into_body(), MAX_INTAKE_BYTES)
            .await
            .map_err(|e| ReportError::Validation(format!("unreadable request body: {}", e)))?;
        return parse_json_body(&bytes);
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ReportError::Validation(format!("malformed multipart body: {}", e)))?;
    let mut map = serde_json::Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ReportError::Validation(format!("malformed multipart part: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else { continue };
        let data = field
            .bytes()
            .await
            .map_err(|e| ReportError::Validation(format!("unreadable part '{}': {}", name, e)))?;
        let value = if name == "partner" {
            serde_json::from_slice(&data)
                .map_err(|e| ReportError::Validation(format!("malformed partner part: {}", e)))?
        } else {
            match String::from_utf8(data.to_vec()) {
                Ok(text) => serde_json::Value::String(text),
                Err(_) => serde_json::Value::String(BASE64.encode(&data)),
            }
        };
        match map.get_mut(&name) {
            Some(serde_json::Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = serde_json::Value::Array(vec![first, value]);
            }
            None => {
                map.insert(name, value);
            }
        }
    }
    Ok(serde_json::Value::Object(map))
}

/// Deserializes the normalized intake value into a typed request.
pub(crate) fn from_intake<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
) -> ReportResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ReportError::Validation(format!("malformed request body: {}", e)))
}

/// Required-field gate for the intake flows.
pub(crate) fn validate_submission(submission: &Submission) -> ReportResult<()> {
    if submission.field("email").is_empty() {
        return Err(ReportError::Validation("email is required".to_string()));
    }
    if submission.field("question").is_empty() {
        return Err(ReportError::Validation("question is required".to_string()));
    }
    Ok(())
}

/// CAPTCHA gate: failure is an auth error unless the dev bypass is on.
pub(crate) async fn check_captcha(
    state: &AppState,
    submission: &Submission,
    remote_ip: Option<&str>,
) -> ReportResult<()> {
    let token = submission.field("captchaToken");
    let outcome = state.captcha.verify(&token, remote_ip).await?;
    if !outcome.ok {
        return Err(ReportError::Auth("CAPTCHA verification failed".to_string()));
    }
    Ok(())
}

/// Outcome of one completed delivery, echoed in the 200 response.
pub(crate) struct Delivered {
    pub mode: ReportMode,
    pub summary: String,
    pub email_id: String,
}

/// The tail of every flow: classify, synthesize, render both documents, and
/// email them. Engines degrade internally, so the only error paths left here
/// are rendering defects and the email transport.
pub(crate) async fn synthesize_and_deliver(
    state: &AppState,
    submission: &Submission,
    partner: Option<&Submission>,
) -> ReportResult<Delivered> {
    let question = submission.field("question");
    let person = submission.person();

    let (synthesis, persons): (SynthesisResult, Vec<_>) = match partner {
        Some(partner) => {
            let result = state.orchestrator.compat(submission, partner, &question).await;
            (result, vec![person.clone(), partner.person()])
        }
        None => {
            let kind = classify(state.llm.as_deref(), &question).await;
            let result = match ReportMode::from(kind) {
                ReportMode::Technical => state.orchestrator.technical(&question).await,
                _ => state.orchestrator.personal(submission, &question).await,
            };
            (result, vec![person.clone()])
        }
    };

    let title = match synthesis.mode {
        ReportMode::Compat => "Your Compatibility Reading",
        ReportMode::Technical => "Your Answer",
        ReportMode::Personal => "Your Personal Reading",
    };
    let doc =
        ReportDocument::from_synthesis(&state.config.app_name, title, &question, &synthesis, persons);
    let summary_html = build_summary_html(&question, &synthesis);
    let full_html = build_full_report_html(&doc);
    let pdf_bytes = state.pdf.render(&doc)?;

    let message = EmailMessage {
        to: person.email,
        subject: format!("{} — {}", state.config.app_name, title),
        html: format!("{}\n{}", summary_html, full_html),
        attachments: vec![Attachment {
            filename: "arcana-report.pdf".to_string(),
            content: pdf_bytes,
        }],
    };
    let receipt = state.email.send(&message).await?;

    tracing::info!(
        target: "arcana::gateway",
        mode = synthesis.mode.as_str(),
        email_id = %receipt.id,
        "Report delivered"
    );
    Ok(Delivered { mode: synthesis.mode, summary: synthesis.summary, email_id: receipt.id })
}

#[cfg(test)]
mod tests {
    use super::report::ReportRequest;
    use super::*;
    use axum::body::Body;

    fn multipart_request(boundary: &str, body: String) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap()
    }

    fn part(boundary: &str, name: &str, value: &str) -> String {
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            boundary, name, value
        )
    }

    #[tokio::test]
    async fn test_multipart_parts_become_submission_fields() {
        let b = "ARCANABOUNDARY";
        let body = [
            part(b, "email", "x@y.com"),
            part(b, "question", "first?"),
            part(b, "question", "second?"),
            part(b, "partner", r#"{"fullName":"Ada"}"#),
            format!("--{}--\r\n", b),
        ]
        .concat();

        let value = read_intake(multipart_request(b, body)).await.unwrap();
        assert_eq!(value["email"], "x@y.com");
        // Repeated part names coalesce into a list, like a repeated form field.
        assert_eq!(value["question"][0], "first?");
        assert_eq!(value["question"][1], "second?");

        let request: ReportRequest = from_intake(value).unwrap();
        assert_eq!(request.submission.field("question"), "first?");
        assert_eq!(request.partner.unwrap().person().full_name, "Ada");
    }

    #[tokio::test]
    async fn test_multipart_binary_part_lands_as_base64() {
        let b = "ARCANABOUNDARY";
        let mut bytes = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"palmImage\"; filename=\"palm.bin\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            b
        )
        .into_bytes();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(format!("\r\n--{}--\r\n", b).as_bytes());

        let value = read_intake(multipart_request(b, String::new()).map(|_| Body::from(bytes)))
            .await
            .unwrap();
        assert_eq!(value["palmImage"], BASE64.encode([0xff, 0xfe]));
    }

    #[tokio::test]
    async fn test_json_body_passes_through_unchanged() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"x@y.com","question":"hi"}"#))
            .unwrap();
        let value = read_intake(request).await.unwrap();
        assert_eq!(value["email"], "x@y.com");
    }
}
