// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-request submission pipeline.
//!
//! A submission passes four gates in order: rate admission, token
//! consumption, field validation, delivery. The first failing gate ends the
//! request. A rate-limit slot is charged as soon as the request is admitted,
//! whatever happens at later gates.

use crate::config::Config;
use crate::delivery::{Deliver, Notification};
use crate::error::{ErrorKind, SubmissionError};
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::metrics::{GateMetrics, OUTCOME_DELIVERED};
use crate::token::{Token, TokenStore};
use crate::validator::{SubmissionRequest, SubmissionValidator};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Owner key used when the client identity cannot be determined.
pub const UNKNOWN_OWNER: &str = "unknown";

/// Validation message for a body that is not a readable form.
pub const MALFORMED_BODY: &str = "Invalid form submission";

/// Terminal result of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub success: bool,
    pub error_kind: Option<ErrorKind>,
    pub http_status: u16,
}

impl From<&Result<(), SubmissionError>> for SubmissionOutcome {
    fn from(result: &Result<(), SubmissionError>) -> Self {
        match result {
            Ok(()) => Self {
                success: true,
                error_kind: None,
                http_status: 200,
            },
            Err(err) => Self {
                success: false,
                error_kind: Some(err.kind()),
                http_status: err.status().as_u16(),
            },
        }
    }
}

/// Orchestrates the abuse gates and delivery for each submission.
pub struct SubmissionGate {
    limiter: RateLimiter,
    tokens: TokenStore,
    validator: SubmissionValidator,
    delivery: Arc<dyn Deliver>,
    metrics: GateMetrics,
    site_name: String,
}

impl SubmissionGate {
    pub fn new(config: &Config, delivery: Arc<dyn Deliver>, metrics: GateMetrics) -> Self {
        Self {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            tokens: TokenStore::new(config.tokens.clone()),
            validator: SubmissionValidator::new(config.validation.clone()),
            delivery,
            metrics,
            site_name: config.delivery.site_name.clone(),
        }
    }

    /// Issue an anti-forgery token to `owner_key`.
    pub async fn issue_token(&self, owner_key: &str) -> Token {
        let token = self.tokens.issue(owner_key).await;
        self.metrics.record_token_issued();
        token
    }

    /// Run a submission through every gate.
    pub async fn submit(&self, request: SubmissionRequest) -> Result<(), SubmissionError> {
        let owner = owner_key(&request.client_identity);
        let result = self.run_gates(owner, &request).await;
        self.record(owner, &result);
        result
    }

    /// Settle a request whose body could not be read as a form.
    ///
    /// The rate gate still runs first and charges a slot. An admitted
    /// request then fails validation with [`MALFORMED_BODY`].
    pub async fn reject_unreadable(
        &self,
        client_identity: &str,
        detail: &str,
    ) -> Result<(), SubmissionError> {
        let owner = owner_key(client_identity);
        debug!(owner = %owner, detail = %detail, "Unreadable submission body");

        let result = match self.limiter.check(owner).await {
            RateLimitResult::Limited { retry_after } => {
                Err(SubmissionError::RateLimited { retry_after })
            }
            RateLimitResult::Allowed { .. } => Err(SubmissionError::ValidationFailed(vec![
                MALFORMED_BODY.to_string(),
            ])),
        };
        self.record(owner, &result);
        result
    }

    fn record(&self, owner: &str, result: &Result<(), SubmissionError>) {
        match result {
            Ok(()) => {
                info!(owner = %owner, "Submission delivered");
                self.metrics.record_outcome(OUTCOME_DELIVERED);
            }
            Err(err @ SubmissionError::DeliveryFailed(_)) => {
                // The cause stays in the log; callers only see a generic message
                error!(owner = %owner, error = %err, "Submission delivery failed");
                self.metrics.record_outcome(err.kind().as_str());
            }
            Err(err) => {
                info!(owner = %owner, error = %err, "Submission rejected");
                self.metrics.record_outcome(err.kind().as_str());
            }
        }
    }

    /// Submit and collapse the result into a [`SubmissionOutcome`].
    pub async fn submit_outcome(&self, request: SubmissionRequest) -> SubmissionOutcome {
        SubmissionOutcome::from(&self.submit(request).await)
    }

    async fn run_gates(
        &self,
        owner: &str,
        request: &SubmissionRequest,
    ) -> Result<(), SubmissionError> {
        if let RateLimitResult::Limited { retry_after } = self.limiter.check(owner).await {
            return Err(SubmissionError::RateLimited { retry_after });
        }
        debug!(owner = %owner, "Rate check passed");

        self.tokens
            .validate_and_consume(request.token_id.trim(), owner)
            .await
            .map_err(|err| {
                warn!(owner = %owner, reason = %err, "Token rejected");
                SubmissionError::from(err)
            })?;
        debug!(owner = %owner, "Token consumed");

        let validation = self.validator.validate(request);
        let (sanitized, plain) = match (validation.sanitized, validation.plain) {
            (Some(sanitized), Some(plain)) if validation.ok => (sanitized, plain),
            _ => return Err(SubmissionError::ValidationFailed(validation.errors)),
        };

        let notification = Notification::from_validated(&self.site_name, &sanitized, &plain);
        self.delivery.deliver(&notification).await?;
        Ok(())
    }

    /// Drop expired tokens and idle rate windows.
    pub async fn sweep(&self) {
        let tokens = self.tokens.sweep_expired().await;
        let owners = self.limiter.cleanup().await;
        if tokens > 0 || owners > 0 {
            debug!(tokens, owners, "Swept stale gate state");
        }
    }

    pub fn metrics(&self) -> &GateMetrics {
        &self.metrics
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

fn owner_key(identity: &str) -> &str {
    match identity.trim() {
        "" => UNKNOWN_OWNER,
        id => id,
    }
}
