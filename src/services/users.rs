use super::log_failure;
use crate::error::Result;
use crate::http_client::Gateway;
use crate::models::NewUser;

/// Client for `/users`. Registration needs an admin session.
#[derive(Clone)]
pub struct UserService {
    gateway: Gateway,
}

impl UserService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Register a new account; returns the server's confirmation message
    pub async fn register(&self, username: &str, password: &str, role: &str) -> Result<String> {
        let user = NewUser {
            username: username.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        };
        log_failure(
            "register user",
            self.gateway.post_text("/users/register", &user).await,
        )
    }

    /// Whether the backend still has its bootstrap account
    pub async fn default_user_present(&self) -> Result<bool> {
        log_failure(
            "check default user",
            self.gateway.get_json("/users/defaultUser").await,
        )
    }
}
