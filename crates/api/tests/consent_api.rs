//! Integration tests for the consent endpoints and consent-gated cookie writes.

mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::{body_json, call, consent_cookie, get, set_cookie_named, set_cookies};
use guildhall_core::consent::{ConsentRecord, COOKIE_CATALOGUE};
use serde_json::json;

/// Turn the consent cookies a response set into a `Cookie` header value.
fn cookie_header_from(response: &axum::response::Response) -> String {
    ["cookie-consent", "cookie-preferences"]
        .iter()
        .filter_map(|name| set_cookie_named(response, name))
        .map(|c| c.split(';').next().unwrap().to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn functional_only() -> ConsentRecord {
    ConsentRecord {
        functional: true,
        ..ConsentRecord::default_deny()
    }
}

// ---------------------------------------------------------------------------
// Test: no cookies means default-deny
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_cookies_reports_default_deny() {
    let app = common::build_test_app();
    let response = get(&app, "/api/v1/consent").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["hasConsent"], false);
    assert!(json["consentDate"].is_null());
    assert_eq!(json["canChangePreferences"], true);
    assert_eq!(
        json["preferences"],
        json!({"essential": true, "functional": false, "analytics": false, "marketing": false})
    );
}

#[tokio::test]
async fn existing_consent_cookies_are_read() {
    let app = common::build_test_app();
    let response = call(Method::GET, "/api/v1/consent")
        .cookie(&consent_cookie(functional_only()))
        .send(&app)
        .await;

    let json = body_json(response).await;
    assert_eq!(json["hasConsent"], true);
    assert!(json["consentDate"].is_string());
    assert_eq!(json["preferences"]["functional"], true);
    assert_eq!(json["preferences"]["marketing"], false);
}

#[tokio::test]
async fn preferences_without_timestamp_are_ignored() {
    let app = common::build_test_app();
    let everything = consent_cookie(ConsentRecord::accept_all());
    // Keep only the preferences half.
    let preferences_only = everything.split("; ").nth(1).unwrap().to_string();

    let response = call(Method::GET, "/api/v1/consent")
        .cookie(&preferences_only)
        .send(&app)
        .await;

    let json = body_json(response).await;
    assert_eq!(json["hasConsent"], false);
    assert_eq!(json["preferences"]["analytics"], false);
}

#[tokio::test]
async fn blanked_consent_cookie_is_not_consent() {
    let app = common::build_test_app();
    let everything = consent_cookie(ConsentRecord::accept_all());
    let preferences = everything.split("; ").nth(1).unwrap();
    let cookies = format!("cookie-consent=; {preferences}");

    let status = call(Method::GET, "/api/v1/consent")
        .cookie(&cookies)
        .send(&app)
        .await;
    let json = body_json(status).await;
    assert_eq!(json["hasConsent"], false);
    assert_eq!(json["preferences"]["marketing"], false);

    let write = call(Method::POST, "/api/v1/analytics/page-view")
        .cookie(&cookies)
        .json(&app, json!({"path": "/games/chess"}))
        .await;
    assert!(set_cookies(&write).is_empty());
    assert_eq!(body_json(write).await["stored"], false);
}

// ---------------------------------------------------------------------------
// Test: saving preferences writes both tokens and gates later writes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn save_preferences_sets_consent_cookies() {
    let app = common::build_test_app();
    let response = call(Method::POST, "/api/v1/consent")
        .json(&app, json!({"functional": true}))
        .await;

    assert_eq!(response.status(), StatusCode::OK);

    let consent = set_cookie_named(&response, "cookie-consent").expect("consent cookie");
    assert!(consent.contains("HttpOnly"));
    assert!(consent.contains("Max-Age=86400"));
    assert!(consent.contains("SameSite=Lax"));
    assert!(!consent.contains("Secure"));

    // Disabled categories have their known cookies expired.
    let analytics = set_cookie_named(&response, "analytics_data").expect("analytics expiry");
    assert!(analytics.contains("Max-Age=0"));
    assert_matches!(set_cookie_named(&response, "functional_data"), None);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Cookie preferences saved");
    assert_eq!(json["preferences"]["essential"], true);
    assert_eq!(json["preferences"]["functional"], true);
    assert_eq!(json["preferences"]["marketing"], false);
}

#[tokio::test]
async fn saved_functional_consent_allows_functional_and_refuses_analytics() {
    let app = common::build_test_app();
    let saved = call(Method::POST, "/api/v1/consent")
        .json(&app, json!({"functional": true}))
        .await;
    let cookies = cookie_header_from(&saved);

    let functional = call(Method::PUT, "/api/v1/user/display-settings")
        .cookie(&cookies)
        .json(&app, json!({"theme": "dark", "posts_per_page": 25}))
        .await;
    assert_eq!(functional.status(), StatusCode::OK);
    let written = set_cookie_named(&functional, "functional_data").expect("functional cookie");
    assert!(written.contains("Max-Age=2592000"));
    assert!(!written.contains("HttpOnly"));
    assert_eq!(body_json(functional).await["stored"], true);

    let analytics = call(Method::POST, "/api/v1/analytics/page-view")
        .cookie(&cookies)
        .json(&app, json!({"path": "/games/chess"}))
        .await;
    assert_eq!(analytics.status(), StatusCode::OK);
    assert!(set_cookies(&analytics).is_empty());
    assert_eq!(body_json(analytics).await["stored"], false);
}

#[tokio::test]
async fn gated_write_without_consent_is_refused() {
    let app = common::build_test_app();
    let response = call(Method::PUT, "/api/v1/user/display-settings")
        .json(&app, json!({"theme": "dark", "posts_per_page": 25}))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await["stored"], false);
}

#[tokio::test]
async fn gated_write_validates_body() {
    let app = common::build_test_app();
    let response = call(Method::PUT, "/api/v1/user/display-settings")
        .cookie(&consent_cookie(ConsentRecord::accept_all()))
        .json(&app, json!({"theme": "dark", "posts_per_page": 1000}))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Test: accept-all / reject-all
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accept_all_enables_every_category() {
    let app = common::build_test_app();
    let response = call(Method::POST, "/api/v1/consent/accept-all")
        .send(&app)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    // Nothing is disabled, so nothing is expired.
    assert!(set_cookies(&response).iter().all(|c| !c.contains("Max-Age=0")));

    let json = body_json(response).await;
    assert_eq!(
        json["preferences"],
        json!({"essential": true, "functional": true, "analytics": true, "marketing": true})
    );
}

#[tokio::test]
async fn reject_all_still_records_consent() {
    let app = common::build_test_app();
    let response = call(Method::POST, "/api/v1/consent/reject-all")
        .send(&app)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = cookie_header_from(&response);
    assert!(cookies.contains("cookie-consent="));

    let follow_up = call(Method::GET, "/api/v1/consent")
        .cookie(&cookies)
        .send(&app)
        .await;
    let json = body_json(follow_up).await;
    assert_eq!(json["hasConsent"], true);
    assert_eq!(json["preferences"]["functional"], false);
    assert_eq!(json["preferences"]["essential"], true);
}

// ---------------------------------------------------------------------------
// Test: single-category updates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_category_keeps_other_choices() {
    let app = common::build_test_app();
    let response = call(Method::PATCH, "/api/v1/consent/analytics")
        .cookie(&consent_cookie(functional_only()))
        .json(&app, json!({"enabled": true}))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["preferences"]["functional"], true);
    assert_eq!(json["preferences"]["analytics"], true);
    assert_eq!(json["preferences"]["marketing"], false);
}

#[tokio::test]
async fn essential_category_cannot_be_disabled() {
    let app = common::build_test_app();
    let response = call(Method::PATCH, "/api/v1/consent/essential")
        .json(&app, json!({"enabled": false}))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["preferences"]["essential"], true);
}

#[tokio::test]
async fn unknown_category_is_rejected_without_writes() {
    let app = common::build_test_app();
    let response = call(Method::PATCH, "/api/v1/consent/tracking")
        .json(&app, json!({"enabled": true}))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());

    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_COOKIE_CATEGORY");
}

#[tokio::test]
async fn unknown_category_is_rejected_before_the_body_is_read() {
    let app = common::build_test_app();
    let response = call(Method::PATCH, "/api/v1/consent/tracking")
        .send(&app)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await["code"], "INVALID_COOKIE_CATEGORY");
}

#[tokio::test]
async fn malformed_update_body_is_a_bad_request() {
    let app = common::build_test_app();
    let response = call(Method::PATCH, "/api/v1/consent/analytics")
        .json(&app, json!({"enabled": "yes"}))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Test: withdrawal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn withdraw_expires_every_known_cookie() {
    let app = common::build_test_app();
    let response = call(Method::DELETE, "/api/v1/consent")
        .cookie(&consent_cookie(ConsentRecord::accept_all()))
        .send(&app)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    for descriptor in COOKIE_CATALOGUE {
        let cookie = set_cookie_named(&response, descriptor.name)
            .unwrap_or_else(|| panic!("{} should be expired", descriptor.name));
        assert!(cookie.contains("Max-Age=0"), "{cookie}");
    }

    let json = body_json(response).await;
    assert_eq!(json["message"], "Cookie consent withdrawn");
    assert_eq!(json["action"], "withdrawn");
    assert!(json["timestamp"].is_string());
}

// ---------------------------------------------------------------------------
// Test: catalogue
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cookie_catalogue_lists_categories_and_attributes() {
    let app = common::build_test_app();
    let response = get(&app, "/api/v1/consent/cookies").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let categories = json.as_array().expect("array of categories");
    assert_eq!(categories.len(), 4);

    let essential = &categories[0];
    assert_eq!(essential["category"], "essential");
    assert_eq!(essential["required"], true);
    assert_eq!(essential["attributes"]["httpOnly"], true);
    assert_eq!(essential["attributes"]["maxAge"], 86400);
    assert_eq!(essential["cookies"].as_array().unwrap().len(), 2);

    let marketing = &categories[3];
    assert_eq!(marketing["category"], "marketing");
    assert_eq!(marketing["required"], false);
    assert_eq!(marketing["attributes"]["httpOnly"], false);
}
