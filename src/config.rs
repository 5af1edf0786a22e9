// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact gate.
//!
//! Every limit the gate enforces lives here and is handed to the stores at
//! construction time. Nothing reads ambient state after startup.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Top-level configuration for the contact gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Sliding-window rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Anti-forgery token issuance
    #[serde(default)]
    pub tokens: TokenConfig,

    /// Field validation limits
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Notification delivery
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Take the client identity from `X-Forwarded-For` (default: false).
    /// Only enable behind a reverse proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Interval between full sweeps of the token and rate stores in seconds (default: 60)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// Sliding-window rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Trailing window length in seconds (default: 900)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Admitted attempts per owner within one window (default: 3)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

/// Anti-forgery token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token lifetime in seconds (default: 1800)
    #[serde(default = "default_token_ttl_secs")]
    pub ttl_secs: u64,

    /// Reject tokens presented by a different client than the issuer (default: false)
    #[serde(default)]
    pub bind_to_owner: bool,

    /// Outstanding tokens kept per owner; issuing past this evicts the
    /// owner's oldest token (default: 10)
    #[serde(default = "default_max_tokens_per_owner")]
    pub max_per_owner: usize,
}

/// Field validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum subject length in characters (default: 200)
    #[serde(default = "default_max_subject_len")]
    pub max_subject_len: usize,

    /// Maximum message length in characters (default: 5000)
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,

    /// Closed set of accepted contact reasons
    #[serde(default = "default_allowed_reasons")]
    pub allowed_reasons: Vec<String>,
}

/// Delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Site name used in the notification subject prefix
    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Webhook endpoint; when unset notifications are only logged
    #[serde(default)]
    pub webhook_url: Option<Url>,

    /// Webhook request timeout in seconds (default: 10)
    #[serde(default = "default_delivery_timeout_secs")]
    pub timeout_secs: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_max_requests() -> u32 {
    3
}

fn default_token_ttl_secs() -> u64 {
    30 * 60
}

fn default_max_tokens_per_owner() -> usize {
    10
}

fn default_max_subject_len() -> usize {
    200
}

fn default_max_message_len() -> usize {
    5000
}

fn default_allowed_reasons() -> Vec<String> {
    ["General", "Project", "Collaboration", "Job Opportunity", "Other"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_site_name() -> String {
    "Portfolio".to_string()
}

fn default_delivery_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            tokens: TokenConfig::default(),
            validation: ValidationConfig::default(),
            delivery: DeliveryConfig::default(),
            metrics: MetricsConfig::default(),
            trust_forwarded_for: false,
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_token_ttl_secs(),
            bind_to_owner: false,
            max_per_owner: default_max_tokens_per_owner(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_subject_len: default_max_subject_len(),
            max_message_len: default_max_message_len(),
            allowed_reasons: default_allowed_reasons(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            site_name: default_site_name(),
            webhook_url: None,
            timeout_secs: default_delivery_timeout_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the sliding window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl TokenConfig {
    /// Get the token lifetime
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl DeliveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    ///
    /// - `BIND_ADDR`: Server bind address
    /// - `RATE_WINDOW_SECS`, `RATE_MAX_REQUESTS`: sliding window
    /// - `TOKEN_TTL_SECS`, `TOKEN_BIND_TO_OWNER`, `TOKEN_MAX_PER_OWNER`: token
    ///   lifetime, binding and per-owner cap
    /// - `SITE_NAME`, `DELIVERY_WEBHOOK_URL`, `DELIVERY_TIMEOUT_SECS`: delivery
    /// - `TRUST_FORWARDED_FOR`, `METRICS_ENABLED`, `CLEANUP_INTERVAL_SECS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            rate_limit: RateLimitConfig {
                window_secs: parse_var(&lookup, "RATE_WINDOW_SECS")
                    .unwrap_or(defaults.rate_limit.window_secs),
                max_requests: parse_var(&lookup, "RATE_MAX_REQUESTS")
                    .unwrap_or(defaults.rate_limit.max_requests),
            },
            tokens: TokenConfig {
                ttl_secs: parse_var(&lookup, "TOKEN_TTL_SECS")
                    .unwrap_or(defaults.tokens.ttl_secs),
                bind_to_owner: parse_var(&lookup, "TOKEN_BIND_TO_OWNER")
                    .unwrap_or(defaults.tokens.bind_to_owner),
                max_per_owner: parse_var(&lookup, "TOKEN_MAX_PER_OWNER")
                    .unwrap_or(defaults.tokens.max_per_owner),
            },
            delivery: DeliveryConfig {
                site_name: lookup("SITE_NAME").unwrap_or(defaults.delivery.site_name),
                webhook_url: parse_var(&lookup, "DELIVERY_WEBHOOK_URL"),
                timeout_secs: parse_var(&lookup, "DELIVERY_TIMEOUT_SECS")
                    .unwrap_or(defaults.delivery.timeout_secs),
            },
            metrics: MetricsConfig {
                enabled: parse_var(&lookup, "METRICS_ENABLED")
                    .unwrap_or(defaults.metrics.enabled),
                ..defaults.metrics
            },
            trust_forwarded_for: parse_var(&lookup, "TRUST_FORWARDED_FOR")
                .unwrap_or(defaults.trust_forwarded_for),
            cleanup_interval_secs: parse_var(&lookup, "CLEANUP_INTERVAL_SECS")
                .unwrap_or(defaults.cleanup_interval_secs),
            validation: defaults.validation,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
