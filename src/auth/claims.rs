// Credential decoding
// Reads the payload of a signed token without verifying the signature

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

/// Base64url engine that accepts payloads with or without trailing padding
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors raised while decoding a credential payload
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("token must have three segments, found {0}")]
    Segments(usize),

    #[error("token payload is not valid base64url: {0}")]
    Base64(String),

    #[error("token payload is not valid claims JSON: {0}")]
    Json(String),
}

/// Claims carried by access and refresh credentials
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    /// Subject (username)
    #[serde(default)]
    pub sub: Option<String>,

    /// Granted authority, e.g. `ROLE_ADMIN`. Refresh credentials carry none.
    #[serde(default)]
    pub role: Option<String>,

    /// Expiry in epoch seconds
    pub exp: i64,

    /// `ACCESS` or `REFRESH`
    #[serde(default, rename = "type")]
    pub token_type: Option<String>,
}

impl Claims {
    /// Expiry in epoch milliseconds, the unit the session store persists
    pub fn expires_at_ms(&self) -> i64 {
        self.exp.saturating_mul(1000)
    }

    /// True once `now_ms` has reached the expiry
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms()
    }
}

/// Decode a token's claims. No signature or expiry validation is performed.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::Segments(segments.len()));
    }

    let payload = PAYLOAD_ENGINE
        .decode(segments[1])
        .map_err(|e| DecodeError::Base64(e.to_string()))?;

    serde_json::from_slice(&payload).map_err(|e| DecodeError::Json(e.to_string()))
}

/// Build an unsigned token around `claims`, for tests only
#[cfg(test)]
pub(crate) fn encode_for_testing(claims: &serde_json::Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}
