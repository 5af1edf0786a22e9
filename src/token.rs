// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Single-use anti-forgery tokens.
//!
//! A token is valid while `now < expires_at` and only until its first
//! successful consumption. Consumption removes the entry, so replaying a
//! captured token always reports [`TokenError::NotFound`].

use crate::config::TokenConfig;
use crate::error::TokenError;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Random bytes per token id (hex-encoded to 64 characters).
const TOKEN_BYTES: usize = 32;

/// An issued anti-forgery token.
#[derive(Debug, Clone)]
pub struct Token {
    /// Opaque unique id handed to the client
    pub id: String,
    /// Identity of the client the token was issued to
    pub owner_key: String,
    pub created_at: Instant,
    pub expires_at: Instant,
    /// Wall-clock expiry, for reporting to clients
    pub expires_at_utc: DateTime<Utc>,
}

impl Token {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Thread-safe store of outstanding tokens.
pub struct TokenStore {
    config: TokenConfig,
    tokens: Arc<RwLock<HashMap<String, Token>>>,
}

impl TokenStore {
    /// Create a new token store with the given configuration.
    pub fn new(config: TokenConfig) -> Self {
        Self {
            config,
            tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Issue a fresh token for `owner_key`.
    ///
    /// Expired tokens are swept on the way in, which keeps the map small
    /// without a dedicated timer. An owner already holding `max_per_owner`
    /// tokens loses its oldest one.
    pub async fn issue(&self, owner_key: &str) -> Token {
        let now = Instant::now();
        let ttl = self.config.token_ttl();
        let token = Token {
            id: generate_token_id(),
            owner_key: owner_key.to_string(),
            created_at: now,
            expires_at: now + ttl,
            expires_at_utc: Utc::now()
                + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero()),
        };

        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, t| !t.is_expired(now));
        evict_oldest_for_owner(&mut tokens, owner_key, self.config.max_per_owner.max(1) - 1);
        tokens.insert(token.id.clone(), token.clone());

        debug!(owner = %owner_key, outstanding = tokens.len(), "Issued token");
        token
    }

    /// Validate `token_id` and consume it on success.
    ///
    /// `presenter` is the identity of the client presenting the token. It is
    /// only compared against the issuing owner when `bind_to_owner` is set;
    /// a mismatch leaves the token in place for its rightful owner.
    pub async fn validate_and_consume(
        &self,
        token_id: &str,
        presenter: &str,
    ) -> Result<(), TokenError> {
        let now = Instant::now();
        let mut tokens = self.tokens.write().await;

        let token = tokens.get(token_id).ok_or(TokenError::NotFound)?;

        if token.is_expired(now) {
            tokens.remove(token_id);
            debug!(presenter = %presenter, "Token expired");
            return Err(TokenError::Expired);
        }

        if self.config.bind_to_owner && token.owner_key != presenter {
            warn!(
                owner = %token.owner_key,
                presenter = %presenter,
                "Token presented by a different client"
            );
            return Err(TokenError::OwnerMismatch);
        }

        tokens.remove(token_id);
        Ok(())
    }

    /// Remove every expired token. Returns the number removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| !t.is_expired(now));
        before - tokens.len()
    }

    /// Number of outstanding tokens.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

/// Drop the owner's oldest tokens until at most `keep` remain.
fn evict_oldest_for_owner(tokens: &mut HashMap<String, Token>, owner_key: &str, keep: usize) {
    let mut owned: Vec<(Instant, String)> = tokens
        .values()
        .filter(|t| t.owner_key == owner_key)
        .map(|t| (t.created_at, t.id.clone()))
        .collect();
    if owned.len() <= keep {
        return;
    }

    owned.sort();
    let excess = owned.len() - keep;
    for (_, id) in owned.into_iter().take(excess) {
        tokens.remove(&id);
    }
    debug!(owner = %owner_key, evicted = excess, "Evicted oldest tokens for owner");
}

fn generate_token_id() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
