//! Premium flows: capture a submission against a minted single-use token,
//! and redeem that token into a delivered report.
//!
//! Deletion timing is retry-safe: the token is taken atomically up front (so
//! two concurrent redemptions cannot both proceed), and restored if the email
//! transport fails, preserving redeemability for a retry.

use super::{
    check_captcha, error_response, from_intake, parse_json_body, read_intake,
    synthesize_and_deliver, validate_submission, ErrorResponse,
};
use crate::AppState;
use arcana_core::{ReportError, Submission};
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::Json;
use serde::Deserialize;

/// POST /api/v1/submission — capture the form (JSON or multipart) and mint a
/// premium token.
pub(crate) async fn submission_post(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let intake = read_intake(request).await.map_err(error_response)?;
    let submission: Submission = from_intake(intake).map_err(error_response)?;
    validate_submission(&submission).map_err(error_response)?;
    check_captcha(&state, &submission, None).await.map_err(error_response)?;

    let token = uuid::Uuid::new_v4().to_string();
    state
        .store
        .save(&token, &submission, state.config.token_ttl_ms())
        .map_err(error_response)?;
    tracing::info!(target: "arcana::premium", token = %token, "Submission captured");

    Ok(Json(serde_json::json!({"ok": true, "premiumToken": token})))
}

#[derive(Deserialize)]
struct RedeemRequest {
    #[serde(rename = "premiumToken")]
    premium_token: String,
}

/// POST /api/v1/premium/redeem — redeem a token into a full delivered report.
/// Unknown or expired tokens are a hard 404 on this path.
pub(crate) async fn redeem_post(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let request: RedeemRequest = parse_json_body(&body).map_err(error_response)?;
    let token = request.premium_token.trim();
    if token.is_empty() {
        return Err(error_response(ReportError::Validation("premiumToken is required".to_string())));
    }

    let submission = state
        .store
        .redeem(token)
        .map_err(error_response)?
        .ok_or_else(|| error_response(ReportError::NotFound("unknown or expired token".to_string())))?;

    match synthesize_and_deliver(&state, &submission, None).await {
        Ok(delivered) => Ok(Json(serde_json::json!({
            "ok": true,
            "mode": delivered.mode.as_str(),
            "emailId": delivered.email_id,
        }))),
        Err(err) => {
            // The token was taken atomically; put it back so the delivery can
            // be retried.
            if let Err(restore) =
                state.store.save(token, &submission, state.config.token_ttl_ms())
            {
                tracing::error!(target: "arcana::premium", token, error = %restore, "Token restore failed after delivery error");
            }
            Err(error_response(err))
        }
    }
}
