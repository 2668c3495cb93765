//! Admission control layers.
//!
//! One middleware function per limiter class, mounted with
//! `axum::middleware::from_fn_with_state`. The general limiter wraps the
//! whole API; the others wrap the routes they guard.

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use guildhall_core::rate_limit::{Admission, LimiterClass, SubjectKey};

use super::auth::bearer_identity;
use super::client::client_address;
use crate::error::AppError;
use crate::state::AppState;

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

pub async fn limit_general(State(state): State<AppState>, req: Request, next: Next) -> Response {
    enforce(&state, LimiterClass::General, req, next).await
}

pub async fn limit_posts(State(state): State<AppState>, req: Request, next: Next) -> Response {
    enforce(&state, LimiterClass::Posts, req, next).await
}

pub async fn limit_replies(State(state): State<AppState>, req: Request, next: Next) -> Response {
    enforce(&state, LimiterClass::Replies, req, next).await
}

pub async fn limit_login(State(state): State<AppState>, req: Request, next: Next) -> Response {
    enforce(&state, LimiterClass::Login, req, next).await
}

/// Spend one point of `class` for the caller, or answer 429.
///
/// The point stays spent whatever the downstream handler returns.
async fn enforce(state: &AppState, class: LimiterClass, req: Request, next: Next) -> Response {
    let user_id = match class {
        LimiterClass::Login => None,
        _ => bearer_identity(req.headers(), &state.config.jwt).map(|i| i.user_id),
    };
    let address = client_address(req.headers(), req.extensions(), state.config.trust_proxy);
    let subject = SubjectKey::select(class, user_id, &address);

    match state.limiter.consume(class, &subject).await {
        Admission::Rejected { retry_after_secs } => {
            tracing::warn!(
                %class,
                %subject,
                retry_after_secs,
                path = %req.uri().path(),
                "Rate limit exceeded"
            );
            AppError::RateLimited { retry_after_secs }.into_response()
        }
        Admission::Admitted { limit, remaining } => {
            let mut response = next.run(req).await;
            // The innermost (most specific) limiter reports its budget.
            let headers = response.headers_mut();
            if !headers.contains_key(&RATE_LIMIT_LIMIT) {
                headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit));
                headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
            }
            response
        }
    }
}
