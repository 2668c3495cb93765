//! Admin-only limiter inspection and reset.

use axum::extract::{Path, State};
use axum::Json;
use guildhall_core::rate_limit::{LimiterClass, RateLimitPolicy, SubjectKey};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResetOutcome {
    pub cleared: bool,
}

/// GET /api/v1/admin/rate-limits
///
/// Active budgets for every limiter class.
pub async fn get_rate_limits(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Json<DataResponse<RateLimitPolicy>> {
    Json(DataResponse {
        data: *state.limiter.policy(),
    })
}

/// DELETE /api/v1/admin/rate-limits/{class}/{subject}
///
/// `subject` is `user:<id>` or `ip:<address>`.
pub async fn reset_rate_limit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((class, subject)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<ResetOutcome>>> {
    let class: LimiterClass = class.parse()?;
    let subject: SubjectKey = subject.parse()?;

    let cleared = state.limiter.reset(class, &subject).await;

    tracing::info!(
        admin_id = admin.user_id,
        %class,
        %subject,
        cleared,
        "Rate limit counter reset"
    );

    Ok(Json(DataResponse {
        data: ResetOutcome { cleared },
    }))
}
