//! Client address resolution shared by the logging, recovery and rate-limit stages.

use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;
use std::fmt;
use std::net::SocketAddr;

/// Address used when neither headers nor the socket reveal the client.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolved client address, stored in the request extensions by the first
/// stage that computes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    /// Returns the address already attached to `req`, or computes it.
    ///
    /// With `behind_proxy` the first `X-Forwarded-For` hop wins, then
    /// `X-Real-IP`. Otherwise only the socket peer address is trusted.
    pub fn resolve(req: &Request, behind_proxy: bool) -> Self {
        if let Some(existing) = req.extensions().get::<ClientIp>() {
            return existing.clone();
        }

        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self(client_address(peer, req.headers(), behind_proxy))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Get the client identifier (IP address) for logging and rate limiting.
pub fn client_address(peer: Option<SocketAddr>, headers: &HeaderMap, behind_proxy: bool) -> String {
    if behind_proxy {
        if let Some(ip) = forwarded_for(headers) {
            return ip;
        }

        if let Some(real_ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return real_ip.to_string();
        }
    }

    peer.map(|a| a.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// First hop of `X-Forwarded-For`, if present and non-empty.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}
