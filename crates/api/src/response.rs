//! Shared response envelope types for API handlers.
//!
//! Resource endpoints (posts, replies, admin) wrap their payload in a
//! `{ "data": ... }` envelope. Consent endpoints answer with bare objects
//! because their field names are part of the client-facing contract.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
