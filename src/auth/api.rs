// Remote session API
// Unauthenticated calls that obtain credentials from the backend

use reqwest::{Client, StatusCode};

use super::types::{LoginRequest, RefreshRequest, RefreshResponse, TokenPair};
use crate::error::{ApiError, Result};
use crate::http_client::join_url;

/// Client for `/auth/*` endpoints.
///
/// These calls bypass the gateway: they never carry a bearer token and a 401
/// from them must not trigger another refresh.
#[derive(Clone)]
pub struct AuthApi {
    client: Client,
    base_url: String,
}

impl AuthApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Exchange username and password for a credential pair
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        tracing::info!(username = %username, "Logging in");

        let response = self
            .client
            .post(join_url(&self.base_url, "/auth/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Login rejected");
            return Err(ApiError::from_status(status, &error_text));
        }

        response
            .json::<TokenPair>()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))
    }

    /// Obtain a new access token for `refresh_token`.
    ///
    /// Only a 200 response counts as success.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<String> {
        tracing::debug!("Requesting new access token");

        let response = self
            .client
            .post(join_url(&self.base_url, "/auth/refresh-token"))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %error_text,
                "Token refresh rejected"
            );
            return Err(ApiError::from_status(status, &error_text));
        }

        let data: RefreshResponse = response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse refresh response: {}", e))
        })?;

        if data.access_token.is_empty() {
            return Err(ApiError::InvalidResponse(
                "Refresh response does not contain accessToken".to_string(),
            ));
        }

        Ok(data.access_token)
    }
}
