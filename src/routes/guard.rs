// Navigation guard

use super::{find_route, Route, ACCESS_DENIED_ROUTE, ADD_USER_ROUTE, ERROR_ROUTE};
use crate::auth::SessionManager;

/// Subject that is always sent to the user-management page
pub const ADMIN_USERNAME: &str = "admin";

/// Role allowed on admin-only routes
pub const ADMIN_ROLE: &str = "ROLE_ADMIN";

/// Redirect chains longer than this are abandoned
const MAX_REDIRECTS: usize = 5;

/// Verdict for a single transition
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
    /// Transition dropped; the session has been ended
    Cancel,
}

/// Where a navigation ended up
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    /// Location is now this path
    Arrived(String),
    Cancelled,
}

#[derive(Clone)]
pub struct NavigationGuard {
    session: SessionManager,
}

impl NavigationGuard {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    /// Decide whether `route` may be entered
    pub async fn check(&self, route: &Route) -> GuardDecision {
        if !route.requires_auth {
            return GuardDecision::Allow;
        }

        let has_token = self.session.store().access_token().is_some();
        if !has_token || self.session.is_expired() {
            tracing::debug!(route = route.path, "No valid access token, refreshing before navigation");
            let outcome = self.session.refresh().await;
            return if outcome.is_renewed() {
                GuardDecision::Allow
            } else {
                GuardDecision::Cancel
            };
        }

        let username = self.session.username();
        if username.as_deref() == Some(ADMIN_USERNAME) && route.path != ADD_USER_ROUTE {
            return GuardDecision::Redirect(ADD_USER_ROUTE.to_string());
        }

        if route.requires_admin && self.session.role().as_deref() != Some(ADMIN_ROLE) {
            tracing::warn!(route = route.path, "Admin route denied");
            return GuardDecision::Redirect(ACCESS_DENIED_ROUTE.to_string());
        }

        GuardDecision::Allow
    }

    /// Navigate to `path`, following guard redirects
    pub async fn navigate(&self, path: &str) -> NavigationOutcome {
        let mut target = path.to_string();

        for _ in 0..=MAX_REDIRECTS {
            let Some(route) = find_route(&target) else {
                tracing::warn!(path = %target, "Unknown route");
                target = ERROR_ROUTE.to_string();
                continue;
            };

            match self.check(route).await {
                GuardDecision::Allow => {
                    self.session.navigation().replace(route.path);
                    return NavigationOutcome::Arrived(route.path.to_string());
                }
                GuardDecision::Redirect(next) => {
                    tracing::debug!(from = route.path, to = %next, "Guard redirect");
                    target = next;
                }
                GuardDecision::Cancel => return NavigationOutcome::Cancelled,
            }
        }

        tracing::error!(path = %path, "Navigation aborted after too many redirects");
        NavigationOutcome::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::encode_for_testing;
    use crate::auth::{AuthApi, SessionStore, DEFAULT_RENEWAL_MARGIN};
    use crate::routes::{Navigation, LOGIN_ROUTE};
    use chrono::Utc;
    use reqwest::Client;
    use serde_json::json;

    fn token(sub: &str, role: Option<&str>, exp_offset: i64) -> String {
        encode_for_testing(&json!({
            "sub": sub,
            "role": role,
            "exp": Utc::now().timestamp() + exp_offset
        }))
    }

    fn guard(base_url: &str) -> NavigationGuard {
        NavigationGuard::new(SessionManager::new(
            SessionStore::in_memory(),
            AuthApi::new(Client::new(), base_url),
            Navigation::new("/"),
            DEFAULT_RENEWAL_MARGIN,
        ))
    }

    fn login_as(guard: &NavigationGuard, sub: &str, role: &str) {
        guard
            .session
            .store()
            .save(&token(sub, Some(role), 600), &token(sub, None, 3600))
            .unwrap();
    }

    #[tokio::test]
    async fn test_public_route_needs_no_session() {
        let guard = guard("http://127.0.0.1:9");
        assert_eq!(
            guard.navigate(LOGIN_ROUTE).await,
            NavigationOutcome::Arrived(LOGIN_ROUTE.to_string())
        );
    }

    #[tokio::test]
    async fn test_protected_route_without_session_is_cancelled() {
        let guard = guard("http://127.0.0.1:9");

        assert_eq!(guard.navigate("/sales").await, NavigationOutcome::Cancelled);
        assert_eq!(guard.session.navigation().current(), LOGIN_ROUTE);
    }

    #[tokio::test]
    async fn test_expired_access_token_is_refreshed_before_entering() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/refresh-token")
            .with_status(200)
            .with_body(json!({ "accessToken": token("mario", Some("ROLE_USER"), 900) }).to_string())
            .expect(1)
            .create_async()
            .await;

        let guard = guard(&server.url());
        guard
            .session
            .store()
            .save(
                &token("mario", Some("ROLE_USER"), -30),
                &token("mario", None, 3600),
            )
            .unwrap();

        assert_eq!(
            guard.navigate("/sales").await,
            NavigationOutcome::Arrived("/sales".to_string())
        );
        assert!(!guard.session.is_expired());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_refresh_cancels_navigation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/refresh-token")
            .with_status(403)
            .create_async()
            .await;

        let guard = guard(&server.url());
        guard
            .session
            .store()
            .save(
                &token("mario", Some("ROLE_USER"), -30),
                &token("mario", None, 3600),
            )
            .unwrap();

        assert_eq!(guard.navigate("/").await, NavigationOutcome::Cancelled);
        assert_eq!(guard.session.navigation().current(), LOGIN_ROUTE);
        assert!(guard.session.store().session().is_none());
    }

    #[tokio::test]
    async fn test_admin_subject_is_sent_to_user_management() {
        let guard = guard("http://127.0.0.1:9");
        login_as(&guard, ADMIN_USERNAME, ADMIN_ROLE);

        assert_eq!(
            guard.navigate("/sales").await,
            NavigationOutcome::Arrived(ADD_USER_ROUTE.to_string())
        );
        assert_eq!(
            guard.navigate(ADD_USER_ROUTE).await,
            NavigationOutcome::Arrived(ADD_USER_ROUTE.to_string())
        );
    }

    #[tokio::test]
    async fn test_non_admin_role_is_denied_admin_routes() {
        let guard = guard("http://127.0.0.1:9");
        login_as(&guard, "mario", "ROLE_USER");

        assert_eq!(
            guard.navigate("/products").await,
            NavigationOutcome::Arrived(ACCESS_DENIED_ROUTE.to_string())
        );
        assert_eq!(
            guard.navigate("/sales").await,
            NavigationOutcome::Arrived("/sales".to_string())
        );
    }

    #[tokio::test]
    async fn test_admin_role_enters_admin_routes() {
        let guard = guard("http://127.0.0.1:9");
        login_as(&guard, "giulia", ADMIN_ROLE);

        assert_eq!(
            guard.navigate("/archive").await,
            NavigationOutcome::Arrived("/archive".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_path_goes_to_error_page() {
        let guard = guard("http://127.0.0.1:9");
        assert_eq!(
            guard.navigate("/nowhere").await,
            NavigationOutcome::Arrived(ERROR_ROUTE.to_string())
        );
    }
}
