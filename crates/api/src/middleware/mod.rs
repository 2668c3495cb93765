//! Request pipeline pieces.
//!
//! - [`rate_limit`] -- Admission control layers, one per limiter class.
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac`] -- Role-gated extractors (`RequireAdmin`, `RequireModerator`,
//!   `RequireMember`, `RequireAuth`).
//! - [`consent`] -- Per-request consent state and the `Set-Cookie` response part.
//! - [`client`] -- Client address resolution.
//!
//! Admission control runs as a layer, so it sheds load before any role check
//! or handler work happens.

pub mod auth;
pub mod client;
pub mod consent;
pub mod rate_limit;
pub mod rbac;
