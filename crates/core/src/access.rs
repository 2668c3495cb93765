//! Access control gate.
//!
//! Authorization is a flat set-membership test: every protected operation
//! names the roles it admits, and no role implies another.

use serde::Serialize;

use crate::roles::Role;
use crate::types::DbId;

/// An authenticated caller as supplied by the authentication collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: DbId,
    pub role: Role,
}

/// Why [`authorize`] refused a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    /// No valid identity is attached to the request (401).
    #[error("unauthenticated")]
    Unauthenticated,
    /// An identity exists but its role is not admitted (403).
    #[error("forbidden")]
    Forbidden,
}

/// Check `identity` against the roles an operation admits.
pub fn authorize(identity: Option<&Identity>, required: &[Role]) -> Result<(), AccessDenied> {
    let identity = identity.ok_or(AccessDenied::Unauthenticated)?;
    if required.contains(&identity.role) {
        Ok(())
    } else {
        Err(AccessDenied::Forbidden)
    }
}
