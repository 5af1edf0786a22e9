// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the contact gate.

use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Why a token failed validation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Never issued, already consumed, or already swept
    #[error("token not found")]
    NotFound,

    #[error("token expired")]
    Expired,

    /// Presented by a different client than it was issued to
    #[error("token presented by a different client")]
    OwnerMismatch,
}

/// Failure reported by a delivery backend.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("delivery endpoint returned status {0}")]
    Rejected(u16),

    #[error("delivery failed: {0}")]
    Other(String),
}

/// Why a submission body could not be read as a form.
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    UrlEncoded(#[from] FormRejection),

    #[error(transparent)]
    Multipart(#[from] MultipartRejection),

    #[error("malformed multipart field: {0}")]
    Field(#[from] MultipartError),
}

/// Terminal failure of a submission, one per gate.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("rate limit exceeded")]
    RateLimited { retry_after: Duration },

    #[error("invalid security token: {0}")]
    TokenInvalid(#[from] TokenError),

    #[error("validation failed: {}", .0.join(", "))]
    ValidationFailed(Vec<String>),

    #[error("delivery failed: {0}")]
    DeliveryFailed(#[from] DeliveryError),
}

/// Caller-facing classification of a failed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateLimited,
    TokenInvalid,
    ValidationFailed,
    DeliveryFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::TokenInvalid => "token_invalid",
            Self::ValidationFailed => "validation_failed",
            Self::DeliveryFailed => "delivery_failed",
        }
    }
}

impl SubmissionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::TokenInvalid(_) => ErrorKind::TokenInvalid,
            Self::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Self::DeliveryFailed(_) => ErrorKind::DeliveryFailed,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::TokenInvalid(_) => StatusCode::FORBIDDEN,
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::DeliveryFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller. Delivery detail is never included.
    pub fn public_message(&self) -> String {
        match self {
            Self::RateLimited { .. } => "Too many requests. Please try again later.".to_string(),
            Self::TokenInvalid(_) => "Invalid or expired security token".to_string(),
            Self::ValidationFailed(errors) => errors.join(", "),
            Self::DeliveryFailed(_) => {
                "Failed to send message. Please try again later.".to_string()
            }
        }
    }
}
