//! Cookie header decoding and preferences token encoding.
//!
//! Decoding never fails: unknown cookies are skipped and a preferences token
//! that does not parse is reported as absent, which callers treat as
//! default-deny.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::json;

use super::ConsentRecord;

/// Essential cookie whose presence signals that consent was given.
pub const CONSENT_COOKIE: &str = "cookie-consent";
/// Essential cookie carrying the JSON-encoded [`ConsentRecord`].
pub const PREFERENCES_COOKIE: &str = "cookie-preferences";

/// Characters left unescaped, matching `encodeURIComponent`.
const COOKIE_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Prefix some frameworks put in front of JSON cookie values.
const JSON_VALUE_PREFIX: &str = "j:";

/// The two raw consent tokens found in a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsentTokens {
    pub timestamp: Option<String>,
    pub preferences: Option<String>,
}

/// Pull the consent tokens out of a `Cookie` header value.
///
/// Later occurrences of a cookie win. Values are percent-decoded; a value
/// that is not valid UTF-8 after decoding is dropped.
pub fn decode(raw_cookie_header: &str) -> ConsentTokens {
    let mut tokens = ConsentTokens::default();

    for pair in raw_cookie_header.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        let slot = match name.trim() {
            CONSENT_COOKIE => &mut tokens.timestamp,
            PREFERENCES_COOKIE => &mut tokens.preferences,
            _ => continue,
        };
        *slot = unescape(value.trim());
    }

    tokens
}

/// Serialize a record into a `cookie-preferences` value.
pub fn encode(record: &ConsentRecord) -> String {
    let record = record.normalized();
    let body = json!({
        "essential": record.essential,
        "functional": record.functional,
        "analytics": record.analytics,
        "marketing": record.marketing,
    })
    .to_string();
    escape(&body)
}

/// Parse a decoded `cookie-preferences` token.
///
/// Returns `None` when the token is not a JSON object of booleans.
pub fn parse_preferences(token: &str) -> Option<ConsentRecord> {
    let token = token.strip_prefix(JSON_VALUE_PREFIX).unwrap_or(token);
    serde_json::from_str::<ConsentRecord>(token)
        .ok()
        .map(ConsentRecord::normalized)
}

/// Percent-encode an arbitrary cookie value.
pub fn escape(value: &str) -> String {
    utf8_percent_encode(value, COOKIE_VALUE).to_string()
}

fn unescape(value: &str) -> Option<String> {
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    percent_decode_str(value)
        .decode_utf8()
        .ok()
        .map(|v| v.into_owned())
}
