//! Commerce webhook verification and payload extraction.
//!
//! The provider signs the exact raw request body with HMAC-SHA256 under a
//! shared secret and sends the base64 digest in an `x-<provider>-hmac-sha256`
//! header. Verification uses constant-time comparison; a mismatch must leave
//! every token untouched.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Order custom-attribute key naming the premium token to redeem.
const TOKEN_ATTRIBUTE: &str = "premiumToken";

/// Verifies the signature header against the exact raw body. The header value
/// is the base64 HMAC-SHA256 digest; comparison is constant-time.
pub fn verify_signature(secret: &str, raw_body: &[u8], signature_header: &str) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature_header.trim())
    else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&expected).is_ok()
}

/// Computes the base64 signature for a body (test fixtures and local tooling).
pub fn sign(secret: &str, raw_body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(raw_body);
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

/// Pulls the premium token out of an order payload. The token lives in the
/// order's custom attribute list as `{"name": "premiumToken", "value": ...}`,
/// with a flat `premiumToken` field accepted as well.
pub fn extract_premium_token(payload: &serde_json::Value) -> Option<String> {
    if let Some(token) = payload.get(TOKEN_ATTRIBUTE).and_then(|t| t.as_str()) {
        if !token.trim().is_empty() {
            return Some(token.trim().to_string());
        }
    }
    let attributes = payload
        .get("note_attributes")
        .or_else(|| payload.get("customAttributes"))
        .and_then(|a| a.as_array())?;
    attributes.iter().find_map(|attr| {
        let name = attr.get("name").or_else(|| attr.get("key"))?.as_str()?;
        if name != TOKEN_ATTRIBUTE {
            return None;
        }
        let value = attr.get("value")?.as_str()?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "shhh";

    #[test]
    fn test_signature_round_trip() {
        let body = br#"{"id": 42}"#;
        let sig = sign(SECRET, body);
        assert!(verify_signature(SECRET, body, &sig));
    }

    #[test]
    fn test_signature_rejects_tampered_body() {
        let sig = sign(SECRET, br#"{"id": 42}"#);
        assert!(!verify_signature(SECRET, br#"{"id": 43}"#, &sig));
    }

    #[test]
    fn test_signature_rejects_wrong_secret_and_garbage() {
        let body = b"payload";
        let sig = sign("other-secret", body);
        assert!(!verify_signature(SECRET, body, &sig));
        assert!(!verify_signature(SECRET, body, "not base64!!"));
        assert!(!verify_signature(SECRET, body, ""));
    }

    #[test]
    fn test_extract_token_from_note_attributes() {
        let payload = serde_json::json!({
            "id": 7,
            "note_attributes": [
                {"name": "giftWrap", "value": "yes"},
                {"name": "premiumToken", "value": "tok-123"}
            ]
        });
        assert_eq!(extract_premium_token(&payload).as_deref(), Some("tok-123"));
    }

    #[test]
    fn test_extract_token_flat_field_and_missing() {
        let flat = serde_json::json!({"premiumToken": "tok-9"});
        assert_eq!(extract_premium_token(&flat).as_deref(), Some("tok-9"));
        let missing = serde_json::json!({"note_attributes": [{"name": "other", "value": "x"}]});
        assert_eq!(extract_premium_token(&missing), None);
    }
}
