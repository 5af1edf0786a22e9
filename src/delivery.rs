// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Notification delivery.
//!
//! The gate hands a [`Notification`] built from validated fields to a
//! [`Deliver`] implementation and awaits the outcome once. Retries, if any,
//! belong to the backend.

use crate::config::DeliveryConfig;
use crate::error::DeliveryError;
use crate::validator::{escape_markup, SubmissionRequest};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Operator notification for one accepted submission.
///
/// `html_body` interpolates only markup-escaped fields. The subject line and
/// `text_body` are plain-text channels and carry the unescaped fields, which
/// are already stripped of control characters and line breaks.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notification {
    pub reply_to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl Notification {
    /// Render a notification from the escaped and plain forms of one
    /// validated submission.
    pub fn from_validated(
        site_name: &str,
        sanitized: &SubmissionRequest,
        plain: &SubmissionRequest,
    ) -> Self {
        let subject = format!("[{}] {}: {}", site_name, plain.subject, plain.reason);
        let text_body = format!("From: {}\n\nMessage:\n{}", plain.email, plain.message);
        let html_body = format!(
            concat!(
                "<div style=\"font-family: sans-serif; padding: 20px;\">",
                "<h2>New Message from {site}</h2>",
                "<p><strong>From:</strong> {email}</p>",
                "<p><strong>Subject:</strong> {subject}</p>",
                "<p><strong>Reason:</strong> {reason}</p>",
                "<hr />",
                "<p style=\"white-space: pre-wrap;\">{message}</p>",
                "</div>"
            ),
            site = escape_markup(site_name),
            email = sanitized.email,
            subject = sanitized.subject,
            reason = sanitized.reason,
            message = sanitized.message,
        );

        Self {
            reply_to: plain.email.clone(),
            subject,
            text_body,
            html_body,
        }
    }
}

/// Capability that forwards a notification to the operator.
#[async_trait]
pub trait Deliver: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Writes notifications to the log. Used when no transport is configured.
#[derive(Debug, Default)]
pub struct LogDelivery;

#[async_trait]
impl Deliver for LogDelivery {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        info!(
            reply_to = %notification.reply_to,
            subject = %notification.subject,
            body_len = notification.text_body.len(),
            "Contact notification (log delivery)"
        );
        Ok(())
    }
}

/// POSTs notifications as JSON to an operator webhook.
pub struct WebhookDelivery {
    url: Url,
    client: reqwest::Client,
}

impl WebhookDelivery {
    pub fn new(url: Url, config: &DeliveryConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl Deliver for WebhookDelivery {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected(status.as_u16()))
        }
    }
}

/// Pick the delivery backend described by `config`.
pub fn from_config(config: &DeliveryConfig) -> Result<Arc<dyn Deliver>, DeliveryError> {
    match &config.webhook_url {
        Some(url) => Ok(Arc::new(WebhookDelivery::new(url.clone(), config)?)),
        None => Ok(Arc::new(LogDelivery)),
    }
}
