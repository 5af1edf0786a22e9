// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Abuse patterns for security testing.

/// How the simulated client obtains the token it submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// Fetch a fresh token before every submission
    Fresh,
    /// Submit ids that were never issued
    Forged,
    /// Reuse the first token for every submission
    Replayed,
}

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of submissions to send
    pub total_requests: usize,
    /// Number of unique clients to simulate
    pub unique_clients: usize,
    /// Token acquisition strategy
    pub token_mode: TokenMode,
    /// Inject markup payloads into the message body
    pub markup_payloads: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            unique_clients: 1,
            token_mode: TokenMode::Fresh,
            markup_payloads: false,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// Single client flood with valid tokens.
    pub fn single_client_flood() -> Self {
        Self {
            total_requests: 200,
            unique_clients: 1,
            ..Default::default()
        }
    }

    /// Distributed flood - many clients, a few submissions each.
    pub fn distributed_flood() -> Self {
        Self {
            total_requests: 500,
            unique_clients: 100,
            ..Default::default()
        }
    }

    /// Cross-site forgery - submissions without an issued token.
    pub fn forged_tokens() -> Self {
        Self {
            total_requests: 100,
            unique_clients: 50,
            token_mode: TokenMode::Forged,
            ..Default::default()
        }
    }

    /// Replay of one captured token from many clients.
    pub fn token_replay() -> Self {
        Self {
            total_requests: 100,
            unique_clients: 100,
            token_mode: TokenMode::Replayed,
            ..Default::default()
        }
    }

    /// Markup injection through the message body.
    pub fn markup_injection() -> Self {
        Self {
            total_requests: 40,
            unique_clients: 20,
            markup_payloads: true,
            ..Default::default()
        }
    }

    /// Upper bound on deliveries for this pattern with `max_requests` per client.
    pub fn max_deliveries(&self, max_requests: usize) -> usize {
        match self.token_mode {
            TokenMode::Forged => 0,
            TokenMode::Replayed => 1,
            TokenMode::Fresh => {
                let per_client = self.total_requests.div_ceil(self.unique_clients);
                self.unique_clients * per_client.min(max_requests)
            }
        }
    }
}
