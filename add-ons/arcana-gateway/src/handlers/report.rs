//! POST /api/v1/report — direct intake (JSON or multipart form): validate,
//! CAPTCHA-gate, classify, synthesize, render, email, respond.

use super::{
    check_captcha, error_response, from_intake, read_intake, synthesize_and_deliver,
    validate_submission, ErrorResponse,
};
use crate::AppState;
use arcana_core::Submission;
use axum::extract::{Request, State};
use axum::Json;
use serde::Deserialize;

/// Direct intake body: the submission fields plus an optional partner block,
/// which forces compatibility mode.
#[derive(Deserialize)]
pub(crate) struct ReportRequest {
    #[serde(default)]
    pub partner: Option<Submission>,
    #[serde(flatten)]
    pub submission: Submission,
}

pub(crate) async fn report_post(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let intake = read_intake(request).await.map_err(error_response)?;
    let request: ReportRequest = from_intake(intake).map_err(error_response)?;
    validate_submission(&request.submission).map_err(error_response)?;
    check_captcha(&state, &request.submission, None).await.map_err(error_response)?;

    let delivered = synthesize_and_deliver(&state, &request.submission, request.partner.as_ref())
        .await
        .map_err(error_response)?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "mode": delivered.mode.as_str(),
        "summary": delivered.summary,
        "emailId": delivered.email_id,
    })))
}
