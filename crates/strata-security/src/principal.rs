//! Authenticated principal and its authentication record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The user behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Login name.
    pub username: String,
    /// Granted authorities (roles and permissions).
    pub authorities: BTreeSet<String>,
    /// Whether the account is enabled.
    pub enabled: bool,
    /// Whether the account is not locked.
    pub account_non_locked: bool,
}

impl Principal {
    /// Creates an enabled, unlocked principal with no authorities.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            authorities: BTreeSet::new(),
            enabled: true,
            account_non_locked: true,
        }
    }

    /// Adds an authority.
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authorities.insert(authority.into());
        self
    }

    #[must_use]
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    /// Checks the account may act at all.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.enabled && self.account_non_locked
    }
}

/// Outcome of authenticating a principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authentication {
    pub principal: Principal,
    pub authenticated: bool,
    /// When the authentication lapses; `None` never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Authentication {
    /// Creates an authenticated record valid until `expires_at`.
    #[must_use]
    pub fn authenticated(principal: Principal, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            principal,
            authenticated: true,
            expires_at,
        }
    }

    /// Checks if the authentication is expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// Authenticated, unexpired and held by an active account.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.authenticated && !self.is_expired() && self.principal.is_active()
    }
}
