// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window rate limiter keyed by client identity.
//!
//! Each owner keeps the timestamps of its admitted attempts. On every check
//! the timestamps older than the window are dropped; the attempt is admitted
//! only if fewer than `max_requests` remain. No more than `max_requests`
//! admissions ever fall inside any trailing window.

use crate::config::RateLimitConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Attempt admitted and recorded
    Allowed {
        /// Attempts left in the current window
        remaining: u32,
    },
    /// Attempt denied, nothing recorded
    Limited {
        /// Time until the oldest attempt leaves the window
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Admitted attempts for one owner, oldest first.
#[derive(Debug, Default)]
struct RateWindow {
    attempts: VecDeque<Instant>,
}

impl RateWindow {
    /// Drop attempts that fell out of the window.
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.attempts.front() {
            if now.duration_since(*oldest) >= window {
                self.attempts.pop_front();
            } else {
                break;
            }
        }
    }

    fn retry_after(&self, now: Instant, window: Duration) -> Duration {
        self.attempts
            .front()
            .map(|oldest| window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(Duration::ZERO)
    }
}

/// Thread-safe sliding-window rate limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<RwLock<HashMap<String, RateWindow>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check and record an attempt for `owner_key`.
    pub async fn check(&self, owner_key: &str) -> RateLimitResult {
        let now = Instant::now();
        let window_len = self.config.window_duration();
        let max = self.config.max_requests as usize;

        let mut windows = self.windows.write().await;
        let window = windows.entry(owner_key.to_string()).or_default();
        window.prune(now, window_len);

        if window.attempts.len() >= max {
            let retry_after = window.retry_after(now, window_len);
            debug!(owner = %owner_key, ?retry_after, "Rate limit exceeded");
            return RateLimitResult::Limited { retry_after };
        }

        window.attempts.push_back(now);
        RateLimitResult::Allowed {
            remaining: (max - window.attempts.len()) as u32,
        }
    }

    /// Admit or deny an attempt for `owner_key`.
    pub async fn admit(&self, owner_key: &str) -> bool {
        self.check(owner_key).await.is_allowed()
    }

    /// Evict owners with no attempts left inside the window. Returns the
    /// number of owners evicted.
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let window_len = self.config.window_duration();

        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, window| {
            window.prune(now, window_len);
            !window.attempts.is_empty()
        });
        before - windows.len()
    }

    /// Number of owners currently tracked.
    pub async fn tracked_owners(&self) -> usize {
        self.windows.read().await.len()
    }
}
