//! Route definitions for the `/posts` resource.

use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::posts;
use crate::middleware::rate_limit::{limit_posts, limit_replies};
use crate::state::AppState;

/// Routes mounted at `/posts`.
///
/// Write routes carry their own limiter on top of the general one. Role
/// checks happen afterwards, in the handler extractors.
///
/// ```text
/// GET    /               -> list_posts (public)
/// POST   /               -> create_post (posts limiter, member)
/// POST   /{id}/replies   -> create_reply (replies limiter, member)
/// DELETE /{id}           -> delete_post (game master or admin)
/// ```
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(posts::list_posts).merge(
                post(posts::create_post)
                    .route_layer(from_fn_with_state(state.clone(), limit_posts)),
            ),
        )
        .route(
            "/{id}/replies",
            post(posts::create_reply)
                .route_layer(from_fn_with_state(state.clone(), limit_replies)),
        )
        .route("/{id}", delete(posts::delete_post))
}
