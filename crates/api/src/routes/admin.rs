//! Route definitions for the `/admin` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `Admin` role (enforced by handler extractors).
///
/// ```text
/// GET    /rate-limits                    -> get_rate_limits
/// DELETE /rate-limits/{class}/{subject}  -> reset_rate_limit
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rate-limits", get(admin::get_rate_limits))
        .route(
            "/rate-limits/{class}/{subject}",
            delete(admin::reset_rate_limit),
        )
}
