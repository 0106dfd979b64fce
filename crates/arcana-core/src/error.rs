//! Error taxonomy for the report pipeline.
//!
//! Only a handful of variants are allowed to cross the request boundary as
//! non-200 responses (Validation, Auth, NotFound, Delivery, Internal). Engine
//! and data-provider failures are absorbed into fallback content inside
//! `engines` and never reach this type.

use thiserror::Error;

/// Result type alias for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors that can surface from the report pipeline or its collaborators.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Bad or missing input (4xx, user-visible short message).
    #[error("Validation error: {0}")]
    Validation(String),

    /// CAPTCHA or webhook signature failure (401/403).
    #[error("Authorization error: {0}")]
    Auth(String),

    /// Unknown or expired premium token (404 on the direct path).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Email transport failure (500; blocks token deletion in premium flows).
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Token store failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Document rendering failure.
    #[error("Render error: {0}")]
    Render(String),

    /// Configuration error (missing secret without an explicit bypass).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected failure. Logged with full detail; the user sees a generic message.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sled::Error> for ReportError {
    fn from(err: sled::Error) -> Self {
        ReportError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Internal(format!("serialization: {}", err))
    }
}
