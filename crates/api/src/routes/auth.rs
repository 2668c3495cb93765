//! Route definitions for the `/auth` resource.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::middleware::rate_limit::limit_login;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login    -> login (login limiter, keyed by address)
/// GET  /me       -> me (requires auth)
/// ```
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(auth::login).route_layer(from_fn_with_state(state.clone(), limit_login)),
        )
        .route("/me", get(auth::me))
}
