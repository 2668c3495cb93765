//! Role-based access control (RBAC) extractors.
//!
//! Each extractor names the exact roles it admits; there is no hierarchy, so
//! a route open to game masters and admins lists both.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use guildhall_core::access::authorize;
use guildhall_core::roles::Role;

use super::auth::{bearer_identity, AuthUser};
use crate::error::AppError;
use crate::state::AppState;

pub const ADMIN_ROLES: &[Role] = &[Role::Admin];
pub const MODERATOR_ROLES: &[Role] = &[Role::GameMaster, Role::Admin];
pub const MEMBER_ROLES: &[Role] = &[Role::Player, Role::GameMaster, Role::Admin];

/// Run the access gate for `allowed` against the request's bearer token.
fn require_roles(
    parts: &Parts,
    state: &AppState,
    allowed: &[Role],
) -> Result<AuthUser, AppError> {
    let identity = bearer_identity(&parts.headers, &state.config.jwt);
    if let Err(denied) = authorize(identity.as_ref(), allowed) {
        tracing::debug!(
            path = %parts.uri.path(),
            user_id = identity.map(|i| i.user_id),
            reason = %denied,
            "Access denied"
        );
        return Err(denied.into());
    }
    // authorize() only passes with an identity present.
    identity
        .map(AuthUser::from)
        .ok_or_else(|| AppError::InternalError("Access gate passed without identity".into()))
}

/// Requires the `Admin` role.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_roles(parts, state, ADMIN_ROLES).map(RequireAdmin)
    }
}

/// Requires `GameMaster` or `Admin`.
pub struct RequireModerator(pub AuthUser);

impl FromRequestParts<AppState> for RequireModerator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_roles(parts, state, MODERATOR_ROLES).map(RequireModerator)
    }
}

/// Requires `Player`, `GameMaster`, or `Admin`.
pub struct RequireMember(pub AuthUser);

impl FromRequestParts<AppState> for RequireMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_roles(parts, state, MEMBER_ROLES).map(RequireMember)
    }
}

/// Requires any authenticated user.
///
/// Functionally equivalent to [`AuthUser`] but named explicitly for routes
/// where "this route requires authentication" should be self-documenting.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}
