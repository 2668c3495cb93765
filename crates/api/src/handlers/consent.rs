//! Handlers for the `/consent` resource.
//!
//! Consent lives entirely in two client-held cookies; these endpoints only
//! read the current request's cookies and queue replacements.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use guildhall_core::consent::cookies::cookies_in;
use guildhall_core::consent::{ConsentRecord, CookieAttributes, CookieCategory};
use guildhall_core::types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::consent::{Consent, SetCookies};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentStatus {
    pub has_consent: bool,
    pub consent_date: Option<Timestamp>,
    pub preferences: ConsentRecord,
    pub can_change_preferences: bool,
}

#[derive(Debug, Serialize)]
pub struct ConsentSaved {
    pub message: &'static str,
    pub preferences: ConsentRecord,
    pub timestamp: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct ConsentWithdrawn {
    pub message: &'static str,
    pub action: &'static str,
    pub timestamp: Timestamp,
}

/// Request body for `PATCH /consent/{category}`.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    pub category: CookieCategory,
    pub description: &'static str,
    pub required: bool,
    pub attributes: CookieAttributes,
    pub cookies: Vec<CookieInfo>,
}

#[derive(Debug, Serialize)]
pub struct CookieInfo {
    pub name: &'static str,
    pub purpose: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/consent
pub async fn get_consent(Consent(writer): Consent) -> Json<ConsentStatus> {
    let state = writer.state();
    Json(ConsentStatus {
        has_consent: state.has_consent,
        consent_date: state.consent_date,
        preferences: state.preferences,
        can_change_preferences: true,
    })
}

/// POST /api/v1/consent
///
/// Replace the stored preferences wholesale. Missing categories are denied.
pub async fn save_preferences(
    consent: Consent,
    Json(preferences): Json<ConsentRecord>,
) -> AppResult<impl IntoResponse> {
    store(consent, preferences, "Cookie preferences saved")
}

/// POST /api/v1/consent/accept-all
pub async fn accept_all(consent: Consent) -> AppResult<impl IntoResponse> {
    store(consent, ConsentRecord::accept_all(), "All cookies accepted")
}

/// POST /api/v1/consent/reject-all
///
/// Records consent to essential cookies only.
pub async fn reject_all(consent: Consent) -> AppResult<impl IntoResponse> {
    store(
        consent,
        ConsentRecord::default_deny(),
        "Only essential cookies accepted",
    )
}

/// PATCH /api/v1/consent/{category}
///
/// Flip a single category, keeping the others as the request carries them.
/// Unknown category names are rejected before the body is read or any
/// cookie is touched.
pub async fn update_category(
    Path(category): Path<String>,
    consent: Consent,
    body: Result<Json<UpdateCategoryRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let category: CookieCategory = category.parse()?;
    let Json(input) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let mut preferences = consent.0.state().preferences;
    preferences.set(category, input.enabled);

    tracing::info!(%category, enabled = input.enabled, "Cookie category updated");
    store(consent, preferences, "Cookie preference updated")
}

/// DELETE /api/v1/consent
///
/// Expire every known cookie along with both consent cookies.
pub async fn withdraw(Consent(mut writer): Consent) -> AppResult<impl IntoResponse> {
    writer.clear_consent();
    tracing::info!("Cookie consent withdrawn");

    Ok((
        SetCookies(writer),
        Json(ConsentWithdrawn {
            message: "Cookie consent withdrawn",
            action: "withdrawn",
            timestamp: Utc::now(),
        }),
    ))
}

/// GET /api/v1/consent/cookies
///
/// Describe every category, its default attributes, and its cookies.
pub async fn cookie_catalogue(State(state): State<AppState>) -> Json<Vec<CategoryInfo>> {
    let policy = state.config.cookie_policy();
    let categories = CookieCategory::ALL
        .into_iter()
        .map(|category| CategoryInfo {
            category,
            description: category.description(),
            required: category.is_required(),
            attributes: policy.attributes(category),
            cookies: cookies_in(category)
                .map(|c| CookieInfo {
                    name: c.name,
                    purpose: c.purpose,
                })
                .collect(),
        })
        .collect();
    Json(categories)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn store(
    Consent(mut writer): Consent,
    preferences: ConsentRecord,
    message: &'static str,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let preferences = writer.set_consent(preferences, now).preferences;

    tracing::debug!(
        functional = preferences.functional,
        analytics = preferences.analytics,
        marketing = preferences.marketing,
        "Cookie preferences stored"
    );

    Ok((
        SetCookies(writer),
        Json(ConsentSaved {
            message,
            preferences,
            timestamp: now,
        }),
    ))
}
