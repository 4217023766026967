//! Visitor session credentials.
//!
//! The commerce backend identifies an anonymous shopper by an OAuth token
//! pair from its anonymous grant. The pair is what ties a browser to its
//! "current cart", so it is stored in the shopper's session and refreshed
//! when it expires.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tokens are treated as expired this long before their stated expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Visitor token pair.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredential {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredential")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl SessionCredential {
    /// Whether the access token must be refreshed before use.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }
}

/// Token endpoint request body.
#[derive(Debug, Serialize)]
#[serde(tag = "grantType")]
pub(crate) enum TokenRequest<'a> {
    #[serde(rename = "anonymous")]
    Anonymous {
        #[serde(rename = "clientId")]
        client_id: &'a str,
    },
    #[serde(rename = "refresh_token")]
    Refresh {
        #[serde(rename = "clientId")]
        client_id: &'a str,
        refresh_token: &'a str,
    },
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

impl TokenResponse {
    pub(crate) fn into_credential(self, issued_at: DateTime<Utc>) -> SessionCredential {
        SessionCredential {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: issued_at + Duration::seconds(self.expires_in),
        }
    }
}
