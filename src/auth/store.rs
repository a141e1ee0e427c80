// Session storage
// Persists the credential pair and derived expiry under fixed string keys

use dashmap::DashMap;
use std::sync::Arc;

use super::claims::{self, DecodeError};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const TOKEN_EXPIRY_KEY: &str = "tokenExpiry";

/// String key/value storage scoped to one client session
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// In-process storage, discarded with the process
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// Snapshot of a stored session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at_ms: i64,
}

/// Typed view over the three session fields
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// Store backed by a fresh [`MemoryStorage`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Save a credential pair, overwriting any previous session.
    ///
    /// The expiry is taken from the access credential's `exp` claim. When the
    /// access credential cannot be decoded nothing is written and the prior
    /// session stays as it was.
    pub fn save(&self, access_token: &str, refresh_token: &str) -> Result<Session, DecodeError> {
        let claims = match claims::decode(access_token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::error!(error = %e, "Failed to save session: access token is malformed");
                return Err(e);
            }
        };

        let session = Session {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at_ms: claims.expires_at_ms(),
        };

        self.storage
            .set(ACCESS_TOKEN_KEY, session.access_token.clone());
        self.storage
            .set(REFRESH_TOKEN_KEY, session.refresh_token.clone());
        self.storage
            .set(TOKEN_EXPIRY_KEY, session.expires_at_ms.to_string());

        tracing::debug!(expires_at_ms = session.expires_at_ms, "Session saved");
        Ok(session)
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(REFRESH_TOKEN_KEY)
    }

    /// Stored expiry in epoch milliseconds; an unparsable value reads as absent
    pub fn expires_at_ms(&self) -> Option<i64> {
        let raw = self.storage.get(TOKEN_EXPIRY_KEY)?;
        match raw.trim().parse() {
            Ok(ms) => Some(ms),
            Err(_) => {
                tracing::warn!(value = %raw, "Stored token expiry is not a number");
                None
            }
        }
    }

    /// All three fields, if every one of them is present
    pub fn session(&self) -> Option<Session> {
        Some(Session {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token()?,
            expires_at_ms: self.expires_at_ms()?,
        })
    }

    /// Remove every session field. Safe to call repeatedly.
    pub fn clear(&self) {
        self.storage.remove(ACCESS_TOKEN_KEY);
        self.storage.remove(REFRESH_TOKEN_KEY);
        self.storage.remove(TOKEN_EXPIRY_KEY);
    }
}
