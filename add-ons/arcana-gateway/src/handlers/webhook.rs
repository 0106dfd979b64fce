//! POST /api/v1/webhooks/order — commerce webhook intake.
//!
//! The signature is verified over the exact raw byte body before anything is
//! parsed; a mismatch is a 401 that touches no token. Unknown tokens are
//! downgraded to a soft 200 acknowledgment so the upstream platform does not
//! retry-storm us; delivery failures stay hard 500s (the platform should
//! retry those, and the token is restored first).

use super::{error_response, synthesize_and_deliver, ErrorResponse};
use crate::AppState;
use arcana_core::{extract_premium_token, verify_signature, ReportError};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

/// Signature header: `x-<provider>-hmac-sha256`. Any provider prefix is
/// accepted; the digest is what matters.
fn signature_header(headers: &HeaderMap) -> Option<&str> {
    headers.iter().find_map(|(name, value)| {
        let name = name.as_str();
        if name.starts_with("x-") && name.ends_with("-hmac-sha256") {
            value.to_str().ok()
        } else {
            None
        }
    })
}

pub(crate) async fn order_webhook_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let Some(secret) = state.config.webhook_secret.as_deref() else {
        return Err(error_response(ReportError::Config(
            "WEBHOOK_SHARED_SECRET is not configured".to_string(),
        )));
    };

    let verified = signature_header(&headers)
        .map(|signature| verify_signature(secret, &body, signature))
        .unwrap_or(false);
    if !verified {
        tracing::warn!(target: "arcana::webhook", "Webhook signature mismatch");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"ok": false, "error": "invalid signature"})),
        ));
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| error_response(ReportError::Validation(format!("malformed payload: {}", e))))?;

    let Some(token) = extract_premium_token(&payload) else {
        tracing::warn!(target: "arcana::webhook", "Order carried no premium token attribute");
        return Ok(Json(serde_json::json!({"ok": true, "note": "no premium token in order"})));
    };

    let Some(submission) = state.store.redeem(&token).map_err(error_response)? else {
        // Soft acknowledgment: a hard 404 here would make the platform retry
        // a token that will never appear.
        tracing::warn!(target: "arcana::webhook", token = %token, "Unknown or expired token in order");
        return Ok(Json(serde_json::json!({"ok": true, "note": "token not found"})));
    };

    match synthesize_and_deliver(&state, &submission, None).await {
        Ok(delivered) => Ok(Json(serde_json::json!({
            "ok": true,
            "mode": delivered.mode.as_str(),
            "emailId": delivered.email_id,
        }))),
        Err(err) => {
            if let Err(restore) =
                state.store.save(&token, &submission, state.config.token_ttl_ms())
            {
                tracing::error!(target: "arcana::webhook", token = %token, error = %restore, "Token restore failed after delivery error");
            }
            Err(error_response(err))
        }
    }
}
