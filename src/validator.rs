// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Contact form validator and sanitizer.
//!
//! Implements the field gate for submissions:
//! - Email address syntax and normalization
//! - Subject and message presence and length
//! - Reason membership in a closed set
//! - Markup neutralization of every free-text field
//!
//! All rule violations are collected so the caller sees the complete list.

use crate::config::ValidationConfig;
use tracing::debug;
use url::Host;

const EMAIL_REQUIRED: &str = "Valid email address is required";
const SUBJECT_REQUIRED: &str = "Subject is required";
const MESSAGE_REQUIRED: &str = "Message is required";
const INVALID_REASON: &str = "Invalid reason selected";

/// Reason assumed when the form leaves it out.
pub const DEFAULT_REASON: &str = "General";

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_PART_LEN: usize = 64;

/// An inbound contact form submission, as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub client_identity: String,
    pub token_id: String,
    pub email: String,
    pub subject: String,
    pub reason: String,
    pub message: String,
}

/// Result of validating a submission.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub ok: bool,
    pub errors: Vec<String>,
    /// Cleaned and markup-escaped fields, present only when `ok`
    pub sanitized: Option<SubmissionRequest>,
    /// Cleaned fields without markup escaping, for plain-text channels
    pub plain: Option<SubmissionRequest>,
}

impl ValidationResult {
    fn rejected(errors: Vec<String>) -> Self {
        Self {
            ok: false,
            errors,
            sanitized: None,
            plain: None,
        }
    }
}

/// Contact form validator.
pub struct SubmissionValidator {
    config: ValidationConfig,
}

impl SubmissionValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a submission and, if it passes, produce its sanitized form.
    pub fn validate(&self, request: &SubmissionRequest) -> ValidationResult {
        let mut errors = Vec::new();

        let email = request.email.trim();
        if !is_plausible_email(email) {
            errors.push(EMAIL_REQUIRED.to_string());
        }

        // Control characters go before the emptiness check so a field made
        // only of them cannot pass as non-empty
        let subject = single_line(request.subject.trim());
        let subject = subject.trim();
        if let Some(err) = check_text(
            subject,
            SUBJECT_REQUIRED,
            "Subject",
            self.config.max_subject_len,
        ) {
            errors.push(err);
        }

        let message = strip_controls(request.message.trim(), true);
        let message = message.trim();
        if let Some(err) = check_text(
            message,
            MESSAGE_REQUIRED,
            "Message",
            self.config.max_message_len,
        ) {
            errors.push(err);
        }

        let reason = strip_controls(request.reason.trim(), false);
        let reason = match reason.trim() {
            "" => DEFAULT_REASON,
            r => r,
        };
        if !self.config.allowed_reasons.iter().any(|allowed| allowed == reason) {
            errors.push(INVALID_REASON.to_string());
        }

        if !errors.is_empty() {
            debug!(errors = ?errors, "Submission failed validation");
            return ValidationResult::rejected(errors);
        }

        let Some(email) = normalize_email(email) else {
            // is_plausible_email already accepted the address
            return ValidationResult::rejected(vec![EMAIL_REQUIRED.to_string()]);
        };

        let plain = SubmissionRequest {
            client_identity: request.client_identity.clone(),
            token_id: request.token_id.clone(),
            email,
            subject: subject.to_string(),
            reason: reason.to_string(),
            message: message.to_string(),
        };
        let sanitized = SubmissionRequest {
            subject: escape_markup(&plain.subject),
            reason: escape_markup(&plain.reason),
            message: escape_markup(&plain.message),
            ..plain.clone()
        };

        ValidationResult {
            ok: true,
            errors,
            sanitized: Some(sanitized),
            plain: Some(plain),
        }
    }
}

fn check_text(value: &str, required: &str, label: &str, max_len: usize) -> Option<String> {
    if value.is_empty() {
        Some(required.to_string())
    } else if value.chars().count() > max_len {
        Some(format!("{label} must be less than {max_len} characters"))
    } else {
        None
    }
}

/// Check that `email` looks like a deliverable address: one `@`, a
/// dot-atom local part and a multi-label domain.
pub fn is_plausible_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    is_valid_local_part(local) && normalize_domain(domain).is_some()
}

fn is_valid_local_part(local: &str) -> bool {
    const SPECIALS: &str = "!#$%&'*+/=?^_`{|}~.-";

    !local.is_empty()
        && local.len() <= MAX_LOCAL_PART_LEN
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(c) || !c.is_ascii())
        && !local.chars().any(char::is_whitespace)
}

/// Parse a mail domain, returning its lowercase ASCII form.
fn normalize_domain(domain: &str) -> Option<String> {
    if domain.is_empty() || domain.starts_with('.') || domain.ends_with('.') {
        return None;
    }

    match Host::parse(domain).ok()? {
        Host::Domain(d) => {
            let labels_ok = d.split('.').count() >= 2
                && d.split('.').all(|label| {
                    !label.is_empty()
                        && !label.starts_with('-')
                        && !label.ends_with('-')
                        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                });
            labels_ok.then_some(d)
        }
        // Bare IP literals are not accepted for a contact address
        Host::Ipv4(_) | Host::Ipv6(_) => None,
    }
}

/// Canonical form of a plausible address: trimmed, lowercased, with the
/// domain in its ASCII form.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim();
    let (local, domain) = email.rsplit_once('@')?;
    let domain = normalize_domain(domain)?;
    Some(format!("{}@{}", local.to_lowercase(), domain))
}

/// Escape characters that carry meaning in HTML or script contexts.
///
/// Text without any of these characters comes back unchanged.
pub fn escape_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

/// Remove control characters. Newlines and tabs survive when `multiline`.
fn strip_controls(input: &str, multiline: bool) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || (multiline && matches!(c, '\n' | '\t')))
        .collect()
}

/// Collapse line breaks so the value is safe in a single header line.
fn single_line(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| if matches!(c, '\r' | '\n') { ' ' } else { c })
        .collect();
    strip_controls(&replaced, false)
}
