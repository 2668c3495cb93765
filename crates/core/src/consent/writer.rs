use chrono::SecondsFormat;

use super::codec::{self, CONSENT_COOKIE, PREFERENCES_COOKIE};
use super::cookies::{cookies_in, CookiePolicy, SetCookie, COOKIE_CATALOGUE};
use super::{ConsentRecord, ConsentState, CookieCategory};
use crate::types::Timestamp;

/// Collects the cookie writes of one request, admitting only those the
/// request's consent allows.
///
/// Handlers never emit `Set-Cookie` themselves; they hand their writes to
/// this value and return it as part of the response. A later write to the
/// same cookie name replaces the earlier one.
#[derive(Debug, Clone)]
pub struct ConsentWriter {
    state: ConsentState,
    policy: CookiePolicy,
    pending: Vec<SetCookie>,
}

impl ConsentWriter {
    pub fn new(state: ConsentState, policy: CookiePolicy) -> Self {
        Self {
            state,
            policy,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> &ConsentState {
        &self.state
    }

    pub fn pending(&self) -> &[SetCookie] {
        &self.pending
    }

    /// Queue a cookie write if consent allows it. Returns whether it was queued.
    pub fn attempt_set_cookie(
        &mut self,
        name: &str,
        value: &str,
        category: CookieCategory,
    ) -> bool {
        if !self.state.has_given_consent(category) {
            tracing::debug!(cookie = name, %category, "Cookie write refused without consent");
            return false;
        }
        let cookie = SetCookie::new(name, codec::escape(value), self.policy.attributes(category));
        self.push(cookie);
        true
    }

    /// Store new preferences as the consent tokens and apply them to the rest
    /// of this request.
    ///
    /// Known cookies of categories that end up disabled are expired in the
    /// same response.
    pub fn set_consent(&mut self, preferences: ConsentRecord, now: Timestamp) -> &ConsentState {
        let preferences = preferences.normalized();
        let essential = self.policy.attributes(CookieCategory::Essential);

        self.push(SetCookie::new(
            CONSENT_COOKIE,
            codec::escape(&now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            essential,
        ));
        self.push(SetCookie::new(
            PREFERENCES_COOKIE,
            codec::encode(&preferences),
            essential,
        ));

        for category in CookieCategory::ALL {
            if preferences.get(category) {
                continue;
            }
            let attrs = self.policy.attributes(category);
            for cookie in cookies_in(category) {
                self.push(SetCookie::expired(cookie.name, attrs));
            }
        }

        self.state = ConsentState {
            has_consent: true,
            consent_date: Some(now),
            preferences,
        };
        &self.state
    }

    /// Expire every known cookie, including both consent tokens.
    pub fn clear_consent(&mut self) {
        for cookie in COOKIE_CATALOGUE {
            let attrs = self.policy.attributes(cookie.category);
            self.push(SetCookie::expired(cookie.name, attrs));
        }
        self.state = ConsentState::none();
    }

    /// Rendered `Set-Cookie` header values.
    pub fn headers(&self) -> Vec<String> {
        self.pending.iter().map(ToString::to_string).collect()
    }

    fn push(&mut self, cookie: SetCookie) {
        match self.pending.iter_mut().find(|c| c.name == cookie.name) {
            Some(existing) => *existing = cookie,
            None => self.pending.push(cookie),
        }
    }
}
