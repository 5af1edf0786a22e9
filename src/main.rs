// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Gate Service
//!
//! Accepts contact form submissions from untrusted visitors and forwards a
//! sanitized notification to the operator.
//!
//! ## Usage
//!
//! 1. The form fetches a token from `/token` when it is rendered.
//! 2. The form posts `email`, `subject`, `message`, `reason` and `token`
//!    to `/submit`.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `RATE_WINDOW_SECS`: Rate limit window (default: 900)
//! - `RATE_MAX_REQUESTS`: Submissions per window per client (default: 3)
//! - `TOKEN_TTL_SECS`: Token lifetime (default: 1800)
//! - `TOKEN_BIND_TO_OWNER`: Reject tokens used by another client (default: false)
//! - `DELIVERY_WEBHOOK_URL`: Operator webhook; notifications are logged when unset

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_gate::{
    config::Config,
    delivery,
    handlers::{router, AppState},
    metrics::GateMetrics,
    submission::SubmissionGate,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        window_secs = config.rate_limit.window_secs,
        max_requests = config.rate_limit.max_requests,
        token_ttl_secs = config.tokens.ttl_secs,
        bind_to_owner = config.tokens.bind_to_owner,
        webhook = config.delivery.webhook_url.is_some(),
        "Starting contact gate"
    );

    let delivery = delivery::from_config(&config.delivery)?;
    let gate = SubmissionGate::new(&config, delivery, GateMetrics::new()?);

    let state = Arc::new(AppState {
        gate,
        config: config.clone(),
    });

    // Spawn sweep task
    let sweep_state = state.clone();
    let sweep_every = Duration::from_secs(config.cleanup_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            sweep_state.gate.sweep().await;
        }
    });

    let app = router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
