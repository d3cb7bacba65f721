use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap};
use std::net::SocketAddr;

// Shared bucket for requests that carry no origin hint at all
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Rate-limit identifier for a request.
///
/// Precedence: first hop of `X-Forwarded-For`, then `X-Real-IP`, then the
/// peer address, then [`UNKNOWN_CLIENT`].
pub fn client_identifier(headers: &HeaderMap, extensions: &Extensions) -> String {
    if let Some(forwarded) = header_str(headers, "x-forwarded-for") {
        // first entry is the original client; an empty one is no hint
        if let Some(first) = forwarded.split(',').next().map(str::trim) {
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = header_str(headers, "x-real-ip") {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
