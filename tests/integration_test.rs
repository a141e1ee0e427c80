// Integration tests for the ERP client
//
// These tests drive the wired application against a mock backend: login,
// authenticated requests, 401 recovery, guarded navigation and logout.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::time::Duration;

use erp_client::auth::{RefreshOutcome, ResumeOutcome, SessionStore};
use erp_client::config::Config;
use erp_client::error::ApiError;
use erp_client::routes::{NavigationOutcome, ACCESS_DENIED_ROUTE, ADD_USER_ROUTE, LOGIN_ROUTE};
use erp_client::App;

// ==================================================================================================
// Test Helpers
// ==================================================================================================

/// Unsigned JWT carrying the given claims
fn jwt(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

fn access_token(sub: &str, role: &str, exp_offset: i64) -> String {
    jwt(json!({
        "sub": sub,
        "role": role,
        "type": "ACCESS",
        "exp": Utc::now().timestamp() + exp_offset
    }))
}

fn refresh_token(sub: &str, exp_offset: i64) -> String {
    jwt(json!({
        "sub": sub,
        "type": "REFRESH",
        "exp": Utc::now().timestamp() + exp_offset
    }))
}

fn test_config(base_url: &str) -> Config {
    Config {
        base_url: base_url.to_string(),
        username: Some("mario".to_string()),
        password: Some("Password123!".to_string()),
        token_renewal_margin: 120,
        http_connect_timeout: 5,
        http_request_timeout: 10,
        log_level: "debug".to_string(),
    }
}

fn create_test_app(base_url: &str) -> App {
    App::new(&test_config(base_url)).expect("Failed to create test app")
}

async fn mock_login(server: &mut Server, access: &str, refresh: &str) -> mockito::Mock {
    server
        .mock("POST", "/auth/login")
        .match_body(Matcher::Json(json!({
            "username": "mario",
            "password": "Password123!"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "accessToken": access, "refreshToken": refresh }).to_string())
        .create_async()
        .await
}

// ==================================================================================================
// Login and authenticated requests
// ==================================================================================================

#[tokio::test]
async fn test_login_then_list_products_with_bearer() {
    let mut server = Server::new_async().await;
    let access = access_token("mario", "ROLE_ADMIN", 900);
    let login = mock_login(&mut server, &access, &refresh_token("mario", 36000)).await;
    let products = server
        .mock("GET", "/products")
        .match_header("authorization", format!("Bearer {}", access).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "id": 1,
                "barcode": 8001234567890i64,
                "name": "Caffè macinato",
                "quantity": 12,
                "purchasePrice": 2.5,
                "sellingPrice": 4.0
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let app = create_test_app(&server.url());
    app.session.login("mario", "Password123!").await.unwrap();

    let list = app.products.list().await.unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Caffè macinato");
    assert_eq!(list[0].unit_margin(), 1.5);
    assert!(app.session.has_scheduled_renewal());
    login.assert_async().await;
    products.assert_async().await;
}

#[tokio::test]
async fn test_login_rejected_leaves_no_session() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(401)
        .with_body(r#"{"message":"Credenziali non valide"}"#)
        .create_async()
        .await;

    let app = create_test_app(&server.url());
    let err = app.session.login("mario", "wrong").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert!(app.session.store().session().is_none());
    assert!(!app.session.has_scheduled_renewal());
}

// ==================================================================================================
// 401 recovery
// ==================================================================================================

#[tokio::test]
async fn test_rejected_request_is_retried_after_refresh() {
    let mut server = Server::new_async().await;
    let stale = access_token("mario", "ROLE_USER", 600);
    let renewed = access_token("mario", "ROLE_USER", 900);
    let refresh = refresh_token("mario", 36000);

    let rejected = server
        .mock("GET", "/suppliers")
        .match_header("authorization", format!("Bearer {}", stale).as_str())
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refreshed = server
        .mock("POST", "/auth/refresh-token")
        .match_body(Matcher::Json(json!({ "refreshToken": refresh })))
        .with_status(200)
        .with_body(json!({ "accessToken": renewed }).to_string())
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("GET", "/suppliers")
        .match_header("authorization", format!("Bearer {}", renewed).as_str())
        .with_status(200)
        .with_body(r#"[{"id":3,"name":"Rossi Srl","address":"Via Roma 1"}]"#)
        .expect(1)
        .create_async()
        .await;

    let app = create_test_app(&server.url());
    app.session.store().save(&stale, &refresh).unwrap();

    let suppliers = app.suppliers.list().await.unwrap();

    assert_eq!(suppliers.len(), 1);
    assert_eq!(suppliers[0].name, "Rossi Srl");
    assert_eq!(app.session.store().access_token(), Some(renewed));
    rejected.assert_async().await;
    refreshed.assert_async().await;
    accepted.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_rejections_all_recover() {
    let mut server = Server::new_async().await;
    let stale = access_token("mario", "ROLE_USER", 600);
    let renewed = access_token("mario", "ROLE_USER", 900);

    server
        .mock("GET", Matcher::Regex(r"^/sales".to_string()))
        .match_header("authorization", format!("Bearer {}", stale).as_str())
        .with_status(401)
        .create_async()
        .await;
    // Rejections that overlap an in-flight refresh join it
    let refreshed = server
        .mock("POST", "/auth/refresh-token")
        .with_status(200)
        .with_body(json!({ "accessToken": renewed }).to_string())
        .expect_at_least(1)
        .expect_at_most(3)
        .create_async()
        .await;
    server
        .mock("GET", Matcher::Regex(r"^/sales".to_string()))
        .match_header("authorization", format!("Bearer {}", renewed).as_str())
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let app = create_test_app(&server.url());
    app.session
        .store()
        .save(&stale, &refresh_token("mario", 36000))
        .unwrap();

    let (today, month, latest) = tokio::join!(
        app.sales.today(),
        app.sales.current_month(),
        app.sales.latest()
    );

    assert!(today.unwrap().is_empty());
    assert!(month.unwrap().is_empty());
    assert!(latest.unwrap().is_empty());
    refreshed.assert_async().await;
}

#[tokio::test]
async fn test_failed_refresh_ends_session() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/products")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("POST", "/auth/refresh-token")
        .with_status(403)
        .with_body(r#"{"message":"Refresh token scaduto"}"#)
        .expect(1)
        .create_async()
        .await;

    let app = create_test_app(&server.url());
    app.session
        .store()
        .save(
            &access_token("mario", "ROLE_USER", 600),
            &refresh_token("mario", 36000),
        )
        .unwrap();

    let err = app.products.list().await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(app.session.store().session().is_none());
    assert_eq!(app.session.navigation().current(), LOGIN_ROUTE);
    assert_eq!(app.session.navigation().replacements(), 1);
}

// ==================================================================================================
// Navigation guard
// ==================================================================================================

#[tokio::test]
async fn test_guard_routes_users_by_role() {
    let server = Server::new_async().await;
    let app = create_test_app(&server.url());

    app.session
        .store()
        .save(
            &access_token("mario", "ROLE_USER", 900),
            &refresh_token("mario", 36000),
        )
        .unwrap();
    assert_eq!(
        app.guard.navigate("/sales").await,
        NavigationOutcome::Arrived("/sales".to_string())
    );
    assert_eq!(
        app.guard.navigate("/products").await,
        NavigationOutcome::Arrived(ACCESS_DENIED_ROUTE.to_string())
    );

    app.session
        .store()
        .save(
            &access_token("admin", "ROLE_ADMIN", 900),
            &refresh_token("admin", 36000),
        )
        .unwrap();
    assert_eq!(
        app.guard.navigate("/sales").await,
        NavigationOutcome::Arrived(ADD_USER_ROUTE.to_string())
    );
    assert_eq!(app.session.navigation().current(), ADD_USER_ROUTE);
}

#[tokio::test]
async fn test_guard_refreshes_expired_token_before_entering() {
    let mut server = Server::new_async().await;
    let renewed = access_token("mario", "ROLE_USER", 900);
    let refreshed = server
        .mock("POST", "/auth/refresh-token")
        .with_status(200)
        .with_body(json!({ "accessToken": renewed }).to_string())
        .expect(1)
        .create_async()
        .await;

    let app = create_test_app(&server.url());
    app.session
        .store()
        .save(
            &access_token("mario", "ROLE_USER", -30),
            &refresh_token("mario", 36000),
        )
        .unwrap();

    assert_eq!(
        app.guard.navigate("/sales").await,
        NavigationOutcome::Arrived("/sales".to_string())
    );
    assert_eq!(app.session.store().access_token(), Some(renewed));
    refreshed.assert_async().await;
}

#[tokio::test]
async fn test_guard_without_session_cancels_and_goes_to_login() {
    let server = Server::new_async().await;
    let app = create_test_app(&server.url());

    assert_eq!(
        app.guard.navigate("/archive").await,
        NavigationOutcome::Cancelled
    );
    assert_eq!(app.session.navigation().current(), LOGIN_ROUTE);
}

// ==================================================================================================
// Session resume
// ==================================================================================================

#[tokio::test]
async fn test_resume_renews_expired_stored_session() {
    let mut server = Server::new_async().await;
    let renewed = access_token("mario", "ROLE_USER", 900);
    server
        .mock("POST", "/auth/refresh-token")
        .with_status(200)
        .with_body(json!({ "accessToken": renewed }).to_string())
        .create_async()
        .await;

    let store = SessionStore::in_memory();
    store
        .save(
            &access_token("mario", "ROLE_USER", -60),
            &refresh_token("mario", 36000),
        )
        .unwrap();
    let app = App::with_store(&test_config(&server.url()), store).unwrap();

    assert_eq!(
        app.session.resume().await,
        ResumeOutcome::Renewed(RefreshOutcome::Renewed(renewed))
    );
    assert!(app.session.has_scheduled_renewal());
}

#[tokio::test]
async fn test_logout_cancels_renewal_timer() {
    let mut server = Server::new_async().await;
    mock_login(
        &mut server,
        &access_token("mario", "ROLE_USER", 900),
        &refresh_token("mario", 36000),
    )
    .await;

    let app = create_test_app(&server.url());
    app.session.login("mario", "Password123!").await.unwrap();
    assert!(app.session.has_scheduled_renewal());

    app.session.logout();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!app.session.has_scheduled_renewal());
    assert!(app.session.store().session().is_none());
    assert_eq!(app.session.navigation().current(), LOGIN_ROUTE);
}
