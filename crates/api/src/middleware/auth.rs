//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use guildhall_core::access::{AccessDenied, Identity};
use guildhall_core::roles::Role;
use guildhall_core::types::DbId;

use crate::auth::jwt::{validate_token, JwtConfig};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// Missing, malformed, or expired tokens and tokens carrying an unknown role
/// are all rejected as unauthenticated (401).
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: DbId,
    pub role: Role,
}

impl From<Identity> for AuthUser {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            role: identity.role,
        }
    }
}

impl From<AuthUser> for Identity {
    fn from(user: AuthUser) -> Self {
        Identity {
            user_id: user.user_id,
            role: user.role,
        }
    }
}

/// Resolve the identity carried by the request's bearer token, if any.
pub fn bearer_identity(headers: &HeaderMap, jwt: &JwtConfig) -> Option<Identity> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Bearer ")?;

    match validate_token(token.trim(), jwt) {
        Ok(claims) => {
            let identity = claims.identity();
            if identity.is_none() {
                tracing::warn!(user_id = claims.sub, role = %claims.role, "Token carries unknown role");
            }
            identity
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            None
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        bearer_identity(&parts.headers, &state.config.jwt)
            .map(AuthUser::from)
            .ok_or(AppError::Access(AccessDenied::Unauthenticated))
    }
}
