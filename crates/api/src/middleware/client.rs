//! Client address resolution for rate-limit subjects.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap};

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_ADDRESS: &str = "unknown";

/// The caller's network address.
///
/// With `trust_proxy` set, the first `X-Forwarded-For` entry wins. Otherwise
/// the socket peer from [`ConnectInfo`] is used. Requests with neither share
/// a single `unknown` bucket.
pub fn client_address(headers: &HeaderMap, extensions: &Extensions, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(addr) = forwarded {
            return addr.to_string();
        }
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string())
}
