//! Endpoints that write non-essential cookies.
//!
//! Both answer `{ "stored": bool }` so the client can tell whether the write
//! was honoured under its current consent.

use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use guildhall_core::consent::CookieCategory;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::validate_input;
use crate::error::AppResult;
use crate::middleware::consent::{Consent, SetCookies};

pub const DISPLAY_SETTINGS_COOKIE: &str = "functional_data";
pub const PAGE_VIEW_COOKIE: &str = "analytics_data";

/// Request body for `PUT /user/display-settings`.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct DisplaySettings {
    #[validate(length(min = 1, max = 32))]
    pub theme: String,
    #[validate(range(min = 5, max = 100))]
    pub posts_per_page: u32,
}

/// Request body for `POST /analytics/page-view`.
#[derive(Debug, Deserialize, Validate)]
pub struct PageView {
    #[validate(length(min = 1, max = 512))]
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct WriteOutcome {
    pub stored: bool,
}

/// PUT /api/v1/user/display-settings
///
/// Remember display settings in a functional cookie.
pub async fn put_display_settings(
    Consent(mut writer): Consent,
    Json(input): Json<DisplaySettings>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;

    let value = json!({
        "theme": input.theme,
        "postsPerPage": input.posts_per_page,
    })
    .to_string();
    let stored =
        writer.attempt_set_cookie(DISPLAY_SETTINGS_COOKIE, &value, CookieCategory::Functional);

    Ok((SetCookies(writer), Json(WriteOutcome { stored })))
}

/// POST /api/v1/analytics/page-view
///
/// Record the last page viewed in an analytics cookie.
pub async fn record_page_view(
    Consent(mut writer): Consent,
    Json(input): Json<PageView>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;

    let value = json!({
        "lastPath": input.path,
        "seenAt": Utc::now().timestamp(),
    })
    .to_string();
    let stored = writer.attempt_set_cookie(PAGE_VIEW_COOKIE, &value, CookieCategory::Analytics);

    Ok((SetCookies(writer), Json(WriteOutcome { stored })))
}
