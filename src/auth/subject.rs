// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caller identity used to scope quota counters

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Header carrying an explicit caller identifier
pub const CLIENT_ID_HEADER: &str = "x-client-id";

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
const UNKNOWN_ADDRESS: &str = "0.0.0.0";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Source address of the request: connection peer, then the first
/// `x-forwarded-for` entry, then `0.0.0.0`
pub fn source_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(peer) = peer {
        return peer.ip().to_string();
    }

    header_str(headers, FORWARDED_FOR_HEADER)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_ADDRESS)
        .to_string()
}

/// Quota subject: the `x-client-id` header when present, else `ip:<address>`
pub fn derive_subject(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    match header_str(headers, CLIENT_ID_HEADER) {
        Some(client_id) => client_id.to_string(),
        None => format!("ip:{}", source_address(headers, peer)),
    }
}
