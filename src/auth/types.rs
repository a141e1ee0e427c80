// Authentication types

use serde::{Deserialize, Serialize};

/// Credential pair issued by `/auth/login`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login request body
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Refresh request body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Refresh response body. The server may rotate the refresh token as well;
/// the client keeps using the one it already holds.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[allow(dead_code)]
    pub refresh_token: Option<String>,
}

/// Result of one refresh attempt.
///
/// Every variant other than [`RefreshOutcome::Renewed`] means the session has
/// already been cleared and the user sent back to the login route.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// New access token saved to the store
    Renewed(String),

    /// No refresh token stored
    NoSession,

    /// Stored refresh token is expired or malformed
    RefreshExpired,

    /// Server answered with a non-200 status
    Rejected { status: u16 },

    /// Request never produced a response
    Network(String),

    /// Server returned an access token that cannot be decoded
    InvalidCredential(String),
}

impl RefreshOutcome {
    /// The renewed access token, if any
    pub fn access_token(&self) -> Option<&str> {
        match self {
            RefreshOutcome::Renewed(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_renewed(&self) -> bool {
        matches!(self, RefreshOutcome::Renewed(_))
    }
}
