// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact gate service.
//!
//! Exposes token issuance and form submission. Every gate failure maps to
//! exactly one status code and a JSON body of the form
//! `{"success": false, "error": "..."}`.

use crate::config::Config;
use crate::error::{FormError, SubmissionError};
use crate::submission::{SubmissionGate, MALFORMED_BODY, UNKNOWN_OWNER};
use crate::validator::SubmissionRequest;
use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Shared application state.
pub struct AppState {
    pub gate: SubmissionGate,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Token issuance response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Submission form body. Missing fields are treated as empty so they
/// surface as validation errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct SubmissionForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub token: String,
}

/// Submission form read from either a urlencoded or a multipart body.
///
/// Multipart parts other than the five form fields, such as an
/// `attachment`, are skipped.
#[derive(Debug, Default)]
pub struct ContactForm(pub SubmissionForm);

#[async_trait]
impl<S> FromRequest<S> for ContactForm
where
    S: Send + Sync,
{
    type Rejection = FormError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await?;
            read_multipart(multipart).await.map(ContactForm)
        } else {
            let Form(form) = Form::<SubmissionForm>::from_request(req, state).await?;
            Ok(ContactForm(form))
        }
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        error_response(&SubmissionError::ValidationFailed(vec![
            MALFORMED_BODY.to_string(),
        ]))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<SubmissionForm, FormError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart.next_field().await? {
        let slot = match field.name() {
            Some("email") => &mut form.email,
            Some("subject") => &mut form.subject,
            Some("message") => &mut form.message,
            Some("reason") => &mut form.reason,
            Some("token") => &mut form.token,
            _ => continue,
        };
        *slot = field.text().await?;
    }

    Ok(form)
}

/// Submission response body.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build the service router with tracing and security headers applied.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/token", get(issue_token).post(issue_token))
        .route("/submit", post(submit));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    let security_headers: [(HeaderName, &'static str); 7] = [
        (header::X_FRAME_OPTIONS, "DENY"),
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
        (
            header::CONTENT_SECURITY_POLICY,
            "default-src 'none'; frame-ancestors 'none'",
        ),
        (
            header::STRICT_TRANSPORT_SECURITY,
            "max-age=31536000; includeSubDomains",
        ),
        (
            HeaderName::from_static("permissions-policy"),
            "geolocation=(), microphone=(), camera=()",
        ),
        (header::CACHE_CONTROL, "no-store"),
    ];

    for (name, value) in security_headers {
        app = app.layer(SetResponseHeaderLayer::overriding(
            name,
            HeaderValue::from_static(value),
        ));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-gate",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Issue an anti-forgery token to the calling client.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Json<TokenResponse> {
    let owner = client_identity(&headers, connect.map(|c| c.0), state.config.trust_forwarded_for);
    let token = state.gate.issue_token(&owner).await;

    Json(TokenResponse {
        token: token.id,
        expires_at: token.expires_at_utc,
    })
}

/// Accept a contact form submission.
///
/// A body that cannot be read as a form still passes the rate gate before
/// it is rejected.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    form: Result<ContactForm, FormError>,
) -> Response {
    let owner = client_identity(&headers, connect.map(|c| c.0), state.config.trust_forwarded_for);
    debug!(owner = %owner, "Processing submission");

    let result = match form {
        Ok(ContactForm(form)) => {
            let request = SubmissionRequest {
                client_identity: owner,
                token_id: form.token,
                email: form.email,
                subject: form.subject,
                reason: form.reason,
                message: form.message,
            };
            state.gate.submit(request).await
        }
        Err(err) => {
            state
                .gate
                .reject_unreadable(&owner, &err.to_string())
                .await
        }
    };

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(SubmitResponse {
                success: true,
                error: None,
            }),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.gate.metrics().render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn error_response(err: &SubmissionError) -> Response {
    let body = Json(SubmitResponse {
        success: false,
        error: Some(err.public_message()),
    });

    match err {
        SubmissionError::RateLimited { retry_after } => {
            // Round up so clients never retry a moment too early
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            (
                err.status(),
                [(header::RETRY_AFTER, secs.max(1).to_string())],
                body,
            )
                .into_response()
        }
        _ => (err.status(), body).into_response(),
    }
}

/// Derive the owner key for a request.
///
/// The peer address is used unless `trust_forwarded_for` is set, in which
/// case the last `X-Forwarded-For` hop (the one appended by our proxy) wins.
pub fn client_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').next())
            .and_then(|hop| hop.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_OWNER.to_string())
}
