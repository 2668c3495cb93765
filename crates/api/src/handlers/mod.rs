//! Request handlers.
//!
//! Handlers receive already-admitted requests (limiter layers run first) and
//! declare their access requirements through the RBAC extractors.

pub mod admin;
pub mod auth;
pub mod consent;
pub mod posts;
pub mod tracking;

use guildhall_core::error::CoreError;
use validator::Validate;

use crate::error::AppError;

/// Run `validator` rules on a request body.
pub(crate) fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))
}
