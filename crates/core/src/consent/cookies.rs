//! Cookie attributes, `Set-Cookie` rendering, and the catalogue of cookies
//! the application knows how to write.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::codec::{CONSENT_COOKIE, PREFERENCES_COOKIE};
use super::CookieCategory;

/// Date used to expire cookies immediately.
const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SameSite {
    Strict,
    Lax,
}

impl SameSite {
    pub fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
        }
    }
}

/// Deployment-wide cookie settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub production: bool,
}

impl CookiePolicy {
    pub fn new(production: bool) -> Self {
        Self { production }
    }

    pub fn same_site(&self) -> SameSite {
        if self.production {
            SameSite::Strict
        } else {
            SameSite::Lax
        }
    }

    /// Cookies are marked `Secure` only in production; local development
    /// runs over plain HTTP.
    pub fn secure(&self) -> bool {
        self.production
    }

    pub fn attributes(&self, category: CookieCategory) -> CookieAttributes {
        CookieAttributes {
            http_only: category.http_only(),
            secure: self.secure(),
            same_site: self.same_site(),
            max_age: category.max_age(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieAttributes {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    #[serde(serialize_with = "serialize_secs")]
    pub max_age: Duration,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

/// A single pending `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub attributes: CookieAttributes,
    /// Expire the cookie instead of setting it.
    pub expire: bool,
}

impl SetCookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        attributes: CookieAttributes,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            attributes,
            expire: false,
        }
    }

    pub fn expired(name: impl Into<String>, attributes: CookieAttributes) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            attributes,
            expire: true,
        }
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; Path=/", self.name, self.value)?;
        if self.expire {
            write!(f, "; Max-Age=0; Expires={EPOCH_EXPIRES}")?;
        } else {
            write!(f, "; Max-Age={}", self.attributes.max_age.as_secs())?;
        }
        if self.attributes.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.attributes.secure {
            f.write_str("; Secure")?;
        }
        write!(f, "; SameSite={}", self.attributes.same_site.as_str())
    }
}

/// A cookie the application may write.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CookieDescriptor {
    pub name: &'static str,
    pub category: CookieCategory,
    pub purpose: &'static str,
}

pub const COOKIE_CATALOGUE: &[CookieDescriptor] = &[
    CookieDescriptor {
        name: CONSENT_COOKIE,
        category: CookieCategory::Essential,
        purpose: "Records when you made your cookie choices.",
    },
    CookieDescriptor {
        name: PREFERENCES_COOKIE,
        category: CookieCategory::Essential,
        purpose: "Stores your cookie choices per category.",
    },
    CookieDescriptor {
        name: "cookie-functional",
        category: CookieCategory::Functional,
        purpose: "Marks that functional features are enabled.",
    },
    CookieDescriptor {
        name: "functional_data",
        category: CookieCategory::Functional,
        purpose: "Display settings such as theme and page size.",
    },
    CookieDescriptor {
        name: "cookie-analytics",
        category: CookieCategory::Analytics,
        purpose: "Marks that usage analytics are enabled.",
    },
    CookieDescriptor {
        name: "analytics_data",
        category: CookieCategory::Analytics,
        purpose: "Anonymous visit identifier and last page viewed.",
    },
    CookieDescriptor {
        name: "cookie-marketing",
        category: CookieCategory::Marketing,
        purpose: "Marks that promotional content is enabled.",
    },
    CookieDescriptor {
        name: "marketing_data",
        category: CookieCategory::Marketing,
        purpose: "Campaign attribution for VIP offers.",
    },
];

/// Known cookies belonging to `category`.
pub fn cookies_in(category: CookieCategory) -> impl Iterator<Item = &'static CookieDescriptor> {
    COOKIE_CATALOGUE
        .iter()
        .filter(move |c| c.category == category)
}
