//! Request origin resolution

use http::HeaderMap;
use std::net::SocketAddr;

/// Headers consulted for the client address, in precedence order
const ORIGIN_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// Resolve the originating address of a request.
///
/// Takes the first entry of `x-forwarded-for`, then `x-real-ip`, then
/// `cf-connecting-ip`, then the transport remote address. Values are not
/// validated here; the blocklist check fails open on garbage.
pub fn extract_origin(headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<String> {
    ORIGIN_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .map(|value| value.split(',').next().unwrap_or_default().trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
}
