// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Gate
//!
//! This crate provides an abuse-resistant submission endpoint for a public
//! contact form:
//!
//! - Single-use anti-forgery tokens with a 30 minute lifetime
//! - Per-client sliding-window rate limiting (3 per 15 minutes default)
//! - Exhaustive field validation with markup neutralization
//! - Fail-fast submission pipeline ending in an external delivery capability

pub mod config;
pub mod delivery;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod submission;
pub mod token;
pub mod validator;

pub use config::Config;
pub use delivery::{Deliver, Notification};
pub use error::{ErrorKind, SubmissionError, TokenError};
pub use limiter::{RateLimitResult, RateLimiter};
pub use submission::{SubmissionGate, SubmissionOutcome};
pub use token::{Token, TokenStore};
pub use validator::{SubmissionRequest, SubmissionValidator, ValidationResult};
