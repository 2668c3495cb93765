pub mod admin;
pub mod auth;
pub mod consent;
pub mod health;
pub mod posts;

use axum::middleware::from_fn_with_state;
use axum::routing::{post, put};
use axum::Router;

use crate::handlers::tracking;
use crate::middleware::rate_limit::limit_general;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every request first passes the general limiter, then any class limiter
/// on its route, then the role check declared by its handler.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                              login (public, login limiter)
/// /auth/me                                 current identity (requires auth)
///
/// /posts                                   list (public), create (member, posts limiter)
/// /posts/{id}                              delete (game master or admin)
/// /posts/{id}/replies                      reply (member, replies limiter)
///
/// /consent                                 get, save, withdraw
/// /consent/accept-all                      accept every category (POST)
/// /consent/reject-all                      essential only (POST)
/// /consent/cookies                         category and cookie catalogue (GET)
/// /consent/{category}                      toggle one category (PATCH)
///
/// /user/display-settings                   functional cookie write (PUT)
/// /analytics/page-view                     analytics cookie write (POST)
///
/// /admin/rate-limits                       active budgets (admin only)
/// /admin/rate-limits/{class}/{subject}     reset one counter (DELETE)
/// ```
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router(state))
        .nest("/posts", posts::router(state))
        .nest("/consent", consent::router())
        .nest("/admin", admin::router())
        .route(
            "/user/display-settings",
            put(tracking::put_display_settings),
        )
        .route("/analytics/page-view", post(tracking::record_page_view))
        .layer(from_fn_with_state(state.clone(), limit_general))
}
