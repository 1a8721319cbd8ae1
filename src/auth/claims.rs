//! Unverified decoding of credential claims.
//!
//! Session tokens are compact three-segment strings whose middle segment is
//! base64url JSON. This module reads that segment for local policy
//! decisions (expiry checks). It never verifies signatures; the backend
//! does that on every authenticated call.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// Number of dot-separated segments in a structurally valid token.
const TOKEN_SEGMENTS: usize = 3;

/// Claims carried in a token's payload segment.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Subject identifier.
    pub sub: Option<String>,
    /// Expiry instant, seconds since the Unix epoch.
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// The expiry claim as an instant, when present and representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}

/// Decode the claims from a token's payload segment.
///
/// Returns `None` unless the token is exactly three dot-separated segments
/// with a base64url JSON object in the middle. An unreadable token is an
/// expected "treat as expired" signal, so there is no error to propagate.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != TOKEN_SEGMENTS {
        return None;
    }

    let payload = decode_segment(parts[1])?;
    let value: serde_json::Value = serde_json::from_slice(&payload).ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Base64url-decode one token segment, restoring the padding the compact
/// encoding strips.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let mut padded = segment.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    URL_SAFE.decode(padded.as_bytes()).ok()
}
