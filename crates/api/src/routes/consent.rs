//! Route definitions for the `/consent` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::consent;
use crate::state::AppState;

/// Routes mounted at `/consent`. All public.
///
/// ```text
/// GET    /              -> get_consent
/// POST   /              -> save_preferences
/// DELETE /              -> withdraw
/// POST   /accept-all    -> accept_all
/// POST   /reject-all    -> reject_all
/// GET    /cookies       -> cookie_catalogue
/// PATCH  /{category}    -> update_category
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(consent::get_consent)
                .post(consent::save_preferences)
                .delete(consent::withdraw),
        )
        .route("/accept-all", post(consent::accept_all))
        .route("/reject-all", post(consent::reject_all))
        .route("/cookies", get(consent::cookie_catalogue))
        .route("/{category}", patch(consent::update_category))
}
