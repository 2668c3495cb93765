#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use guildhall_core::consent::codec::encode;
use guildhall_core::consent::{ConsentRecord, CONSENT_COOKIE, PREFERENCES_COOKIE};
use guildhall_core::forum::InMemoryPostRepository;
use guildhall_core::rate_limit::AdmissionController;
use guildhall_core::roles::Role;
use guildhall_core::types::DbId;
use guildhall_core::users::InMemoryUserDirectory;
use http_body_util::BodyExt;
use tower::ServiceExt;

use guildhall_api::app::build_app;
use guildhall_api::auth::jwt::{generate_access_token, JwtConfig};
use guildhall_api::config::{Environment, ServerConfig};
use guildhall_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Proxy headers are trusted so tests can pick the client address with
/// `X-Forwarded-For`.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        environment: Environment::Development,
        trust_proxy: true,
        rate_limit_sweep_secs: 60,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        bootstrap_admin: None,
    }
}

/// A router plus handles on the in-memory stores behind it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<InMemoryUserDirectory>,
    pub posts: Arc<InMemoryPostRepository>,
}

/// Build the full application router with all middleware layers.
///
/// Uses the same `build_app` as `main.rs`, with a fixed peer address standing
/// in for the socket's connect info.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let users = Arc::new(InMemoryUserDirectory::new());
    let posts = Arc::new(InMemoryPostRepository::new());
    let state = AppState {
        limiter: AdmissionController::in_memory(config.rate_limit_policy()),
        config: Arc::new(config),
        users: users.clone(),
        posts: posts.clone(),
    };

    let router = build_app(state.clone())
        .expect("test config should build")
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

    TestApp {
        router,
        state,
        users,
        posts,
    }
}

/// Mint a bearer token the app will accept.
pub fn token_for(app: &TestApp, user_id: DbId, role: Role) -> String {
    generate_access_token(user_id, role, &app.state.config.jwt).expect("token should sign")
}

/// Value for a `Cookie` header carrying the given consent.
pub fn consent_cookie(preferences: ConsentRecord) -> String {
    format!(
        "{CONSENT_COOKIE}=2026-01-01T00%3A00%3A00.000Z; {PREFERENCES_COOKIE}={}",
        encode(&preferences)
    )
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Fluent request builder over the test router.
pub struct Call {
    builder: axum::http::request::Builder,
}

pub fn call(method: Method, uri: &str) -> Call {
    Call {
        builder: Request::builder().method(method).uri(uri),
    }
}

impl Call {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.builder = self.builder.header(AUTHORIZATION, format!("Bearer {token}"));
        self
    }

    pub fn cookie(mut self, cookie: &str) -> Self {
        self.builder = self.builder.header(COOKIE, cookie);
        self
    }

    /// Pose as a client at `addr` (the test config trusts proxy headers).
    pub fn from_addr(self, addr: &str) -> Self {
        self.header("x-forwarded-for", addr)
    }

    pub async fn send(self, app: &TestApp) -> Response {
        let request = self.builder.body(Body::empty()).unwrap();
        app.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn json(self, app: &TestApp, body: serde_json::Value) -> Response {
        let request = self
            .builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        app.router.clone().oneshot(request).await.unwrap()
    }
}

/// Send a GET request with no headers.
pub async fn get(app: &TestApp, uri: &str) -> Response {
    call(Method::GET, uri).send(app).await
}

/// Read the full response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Every `Set-Cookie` header on the response.
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// The `Set-Cookie` header for `name`, if any.
pub fn set_cookie_named(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&prefix))
}
