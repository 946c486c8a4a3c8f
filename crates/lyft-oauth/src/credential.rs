//! OAuth credentials.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use lyft_client::de;
use serde::{Deserialize, Serialize};

/// An access token and what came with it.
///
/// Never mutated in place: a refresh produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    /// Present for the three-legged flow with the `offline` scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: String,
    /// Lifetime of the access token, counted from `issued_at`.
    #[serde(with = "de::duration_secs")]
    pub expires_in: Duration,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub issued_at: DateTime<Utc>,
}

impl Credential {
    /// When the access token stops working.
    pub fn expires_at(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.expires_in)
            .ok()
            .and_then(|d| self.issued_at.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the access token has expired by `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Whether the access token has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Body of a successful `/oauth/token` response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default, deserialize_with = "de::seconds")]
    expires_in: Duration,
    #[serde(default, deserialize_with = "de::scopes")]
    scope: Vec<String>,
}

impl TokenResponse {
    /// A credential issued at `issued_at`.
    pub(crate) fn into_credential(self, issued_at: DateTime<Utc>) -> Credential {
        Credential {
            access_token: self.access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            token_type: self.token_type.unwrap_or_default(),
            expires_in: self.expires_in,
            scopes: self.scope,
            issued_at,
        }
    }

    /// A refreshed credential; keeps the previous refresh token unless the
    /// server rotated it.
    pub(crate) fn refresh(self, previous: &Credential, issued_at: DateTime<Utc>) -> Credential {
        let mut credential = self.into_credential(issued_at);
        if credential.refresh_token.is_none() {
            credential.refresh_token = previous.refresh_token.clone();
        }
        credential
    }
}
