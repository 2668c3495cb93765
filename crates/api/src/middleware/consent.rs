//! Per-request consent state and the response part that emits cookie writes.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::{IntoResponseParts, ResponseParts};
use guildhall_core::consent::{ConsentState, ConsentWriter};

use crate::error::AppError;
use crate::state::AppState;

/// The request's consent, decoded from its `Cookie` headers, wrapped in the
/// writer every cookie write must go through.
///
/// Never rejects: unreadable consent cookies decode to default-deny.
pub struct Consent(pub ConsentWriter);

impl FromRequestParts<AppState> for Consent {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");
        let consent = ConsentState::from_cookie_header(&raw);
        Ok(Consent(ConsentWriter::new(
            consent,
            state.config.cookie_policy(),
        )))
    }
}

/// Emits the writes queued on a [`ConsentWriter`] as `Set-Cookie` headers.
pub struct SetCookies(pub ConsentWriter);

impl IntoResponseParts for SetCookies {
    type Error = AppError;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for header in self.0.headers() {
            let value = HeaderValue::from_str(&header).map_err(|e| {
                AppError::InternalError(format!("Invalid Set-Cookie header: {e}"))
            })?;
            res.headers_mut().append(SET_COOKIE, value);
        }
        Ok(res)
    }
}
