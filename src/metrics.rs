// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for the contact gate.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Outcome label for accepted submissions.
pub const OUTCOME_DELIVERED: &str = "delivered";

/// Counters exposed on the metrics endpoint.
#[derive(Clone)]
pub struct GateMetrics {
    registry: Registry,
    submissions: IntCounterVec,
    tokens_issued: IntCounter,
}

impl GateMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new(
                "contact_submissions_total",
                "Contact form submissions by terminal outcome",
            ),
            &["outcome"],
        )?;
        let tokens_issued = IntCounter::new(
            "contact_tokens_issued_total",
            "Anti-forgery tokens issued",
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(tokens_issued.clone()))?;

        Ok(Self {
            registry,
            submissions,
            tokens_issued,
        })
    }

    pub fn record_outcome(&self, outcome: &str) {
        self.submissions.with_label_values(&[outcome]).inc();
    }

    pub fn record_token_issued(&self) {
        self.tokens_issued.inc();
    }

    pub fn submissions(&self, outcome: &str) -> u64 {
        self.submissions.with_label_values(&[outcome]).get()
    }

    /// Render all counters in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
