//! Cookie consent: categories, the client-held consent record, and the gate
//! every cookie write goes through.
//!
//! The consent record is never stored server-side. It travels as two
//! essential cookies (`cookie-consent` holding the consent timestamp and
//! `cookie-preferences` holding the JSON record), is decoded once per request
//! into a [`ConsentState`], and is consulted by [`ConsentWriter`] before any
//! non-essential cookie is emitted.

pub mod codec;
pub mod cookies;
pub mod state;
pub mod writer;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub use codec::{ConsentTokens, CONSENT_COOKIE, PREFERENCES_COOKIE};
pub use cookies::{CookieAttributes, CookiePolicy, SameSite, SetCookie, COOKIE_CATALOGUE};
pub use state::ConsentState;
pub use writer::ConsentWriter;

const DAY_SECS: u64 = 24 * 60 * 60;

/// One of the four consent categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieCategory {
    Essential,
    Functional,
    Analytics,
    Marketing,
}

impl CookieCategory {
    pub const ALL: [CookieCategory; 4] = [
        CookieCategory::Essential,
        CookieCategory::Functional,
        CookieCategory::Analytics,
        CookieCategory::Marketing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CookieCategory::Essential => "essential",
            CookieCategory::Functional => "functional",
            CookieCategory::Analytics => "analytics",
            CookieCategory::Marketing => "marketing",
        }
    }

    /// Essential cookies are written without asking.
    pub fn is_required(self) -> bool {
        self == CookieCategory::Essential
    }

    pub fn http_only(self) -> bool {
        self == CookieCategory::Essential
    }

    pub fn max_age(self) -> Duration {
        match self {
            CookieCategory::Essential => Duration::from_secs(DAY_SECS),
            CookieCategory::Functional => Duration::from_secs(30 * DAY_SECS),
            CookieCategory::Analytics => Duration::from_secs(365 * DAY_SECS),
            CookieCategory::Marketing => Duration::from_secs(90 * DAY_SECS),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CookieCategory::Essential => {
                "Required for the site to work: sign-in state and your cookie choices."
            }
            CookieCategory::Functional => {
                "Remember display settings and other conveniences between visits."
            }
            CookieCategory::Analytics => {
                "Help us understand how the forum is used so we can improve it."
            }
            CookieCategory::Marketing => "Used to show relevant promotions for games and VIP plans.",
        }
    }
}

impl fmt::Display for CookieCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CookieCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CookieCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::InvalidCookieCategory(s.to_string()))
    }
}

/// Per-category consent choices.
///
/// `essential` is always `true`; every constructor and mutator restores it.
/// Missing fields deserialize to the default-deny value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentRecord {
    pub essential: bool,
    pub functional: bool,
    pub analytics: bool,
    pub marketing: bool,
}

impl Default for ConsentRecord {
    fn default() -> Self {
        Self::default_deny()
    }
}

impl ConsentRecord {
    /// Essential only.
    pub fn default_deny() -> Self {
        Self {
            essential: true,
            functional: false,
            analytics: false,
            marketing: false,
        }
    }

    pub fn accept_all() -> Self {
        Self {
            essential: true,
            functional: true,
            analytics: true,
            marketing: true,
        }
    }

    /// Return a copy with `essential` forced back to `true`.
    pub fn normalized(mut self) -> Self {
        self.essential = true;
        self
    }

    pub fn get(&self, category: CookieCategory) -> bool {
        match category {
            CookieCategory::Essential => true,
            CookieCategory::Functional => self.functional,
            CookieCategory::Analytics => self.analytics,
            CookieCategory::Marketing => self.marketing,
        }
    }

    /// Update a single category. Attempts to turn essential off are ignored.
    pub fn set(&mut self, category: CookieCategory, enabled: bool) {
        match category {
            CookieCategory::Essential => self.essential = true,
            CookieCategory::Functional => self.functional = enabled,
            CookieCategory::Analytics => self.analytics = enabled,
            CookieCategory::Marketing => self.marketing = enabled,
        }
    }
}
