use chrono::{DateTime, Utc};
use serde::Serialize;

use super::codec::{self, ConsentTokens};
use super::{ConsentRecord, CookieCategory};
use crate::types::Timestamp;

/// Consent posture of the current request, derived from its cookies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentState {
    pub has_consent: bool,
    pub consent_date: Option<Timestamp>,
    pub preferences: ConsentRecord,
}

impl Default for ConsentState {
    fn default() -> Self {
        Self::none()
    }
}

impl ConsentState {
    /// No consent given: essential only.
    pub fn none() -> Self {
        Self {
            has_consent: false,
            consent_date: None,
            preferences: ConsentRecord::default_deny(),
        }
    }

    /// Build the state from the two decoded consent tokens.
    ///
    /// Without a timestamp token any preferences token is ignored. A blank
    /// timestamp is what withdrawal leaves behind and counts as absent. A
    /// timestamp that is not ISO-8601 still counts as consent but yields no
    /// `consent_date`.
    pub fn build(timestamp_token: Option<&str>, preferences_token: Option<&str>) -> Self {
        let Some(timestamp) = timestamp_token.map(str::trim).filter(|t| !t.is_empty()) else {
            return Self::none();
        };

        let consent_date = DateTime::parse_from_rfc3339(timestamp)
            .ok()
            .map(|d| d.with_timezone(&Utc));

        let preferences = preferences_token
            .and_then(codec::parse_preferences)
            .unwrap_or_default();

        Self {
            has_consent: true,
            consent_date,
            preferences,
        }
    }

    pub fn from_tokens(tokens: &ConsentTokens) -> Self {
        Self::build(tokens.timestamp.as_deref(), tokens.preferences.as_deref())
    }

    pub fn from_cookie_header(raw: &str) -> Self {
        Self::from_tokens(&codec::decode(raw))
    }

    /// Whether cookies of `category` may be written for this request.
    pub fn has_given_consent(&self, category: CookieCategory) -> bool {
        if category.is_required() {
            return true;
        }
        self.has_consent && self.preferences.get(category)
    }
}
