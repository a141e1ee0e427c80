use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{RefreshOutcome, SessionManager};
use crate::error::{ApiError, Result};

/// Join a base URL and an endpoint path with exactly one slash between them
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn bearer(token: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token)).ok()
}

/// HTTP gateway to the backend.
///
/// Attaches the stored access token to every request and, on a 401, refreshes
/// the token and re-sends the request once.
#[derive(Clone)]
pub struct Gateway {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Base URL every path is resolved against
    base_url: String,

    /// Session manager owning the credentials
    session: SessionManager,
}

impl Gateway {
    /// Create a gateway around an existing client
    pub fn with_client(client: Client, base_url: impl Into<String>, session: SessionManager) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            session,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Start a request for `path` relative to the base URL
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, join_url(&self.base_url, path))
    }

    /// Attach the stored access token if it is present and not expired
    fn authorize(&self, request: &mut Request) {
        let Some(token) = self.session.store().access_token() else {
            return;
        };
        if self.session.is_expired() {
            tracing::debug!("Stored access token expired, sending request unauthenticated");
            return;
        }
        match bearer(&token) {
            Some(value) => {
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            None => tracing::warn!("Stored access token is not a valid header value"),
        }
    }

    /// Execute a request.
    ///
    /// Non-success statuses become errors. A 401 triggers one token refresh
    /// and one retry; a second 401 is returned as an error.
    pub async fn execute(&self, mut request: Request) -> Result<Response> {
        let request_id = Uuid::new_v4();
        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!(
            request_id = %request_id,
            method = %method,
            url = %url,
            "Sending HTTP request"
        );

        self.authorize(&mut request);
        let mut retried = false;

        loop {
            let req = request.try_clone().ok_or_else(|| {
                ApiError::Internal(anyhow::anyhow!("Request body is not cloneable"))
            })?;

            let response = match self.client.execute(req).await {
                Ok(response) => response,
                Err(e) => {
                    let error_kind = if e.is_timeout() {
                        "timeout"
                    } else if e.is_connect() {
                        "connection_failed"
                    } else if e.is_request() {
                        "request_error"
                    } else {
                        "unknown"
                    };
                    tracing::warn!(
                        request_id = %request_id,
                        error_kind = error_kind,
                        error = %e,
                        url = %url,
                        "HTTP request error"
                    );
                    return Err(ApiError::Network(e));
                }
            };

            let status = response.status();
            tracing::debug!(request_id = %request_id, status = %status, "Received HTTP response");

            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::UNAUTHORIZED && !retried {
                retried = true;
                tracing::warn!(request_id = %request_id, "Received 401, refreshing token and retrying");

                match self.session.refresh().await {
                    RefreshOutcome::Renewed(token) => {
                        let value = bearer(&token).ok_or_else(|| {
                            ApiError::Internal(anyhow::anyhow!(
                                "Renewed access token is not a valid header value"
                            ))
                        })?;
                        request.headers_mut().insert(AUTHORIZATION, value);
                        continue;
                    }
                    outcome => {
                        tracing::error!(
                            request_id = %request_id,
                            outcome = ?outcome,
                            "Token refresh failed, not retrying"
                        );
                    }
                }
            }

            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                request_id = %request_id,
                status = status.as_u16(),
                url = %url,
                response_body = %error_text,
                retried,
                "HTTP request failed with error response"
            );
            return Err(ApiError::from_status(status, &error_text));
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        self.execute(builder.build()?).await
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        Self::read_json(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        Self::read_json(response).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.request(Method::PUT, path).json(body)).await?;
        Self::read_json(response).await
    }

    /// POST a JSON body and return the response body as text
    pub async fn post_text<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String> {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}
