use serde::Serialize;

/// Account to register through `/users/register`
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: String,
}
