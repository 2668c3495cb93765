//! Domain logic for the Guildhall forum backend.
//!
//! Everything in this crate is free of HTTP concerns so the request pipeline
//! pieces (consent, admission control, access control) can be unit tested in
//! isolation and reused by any transport.

pub mod access;
pub mod consent;
pub mod error;
pub mod forum;
pub mod rate_limit;
pub mod roles;
pub mod types;
pub mod users;
