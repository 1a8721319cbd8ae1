//! Session lifecycle: staleness policy and proactive refresh.
//!
//! A stored credential is refreshed before it expires rather than after,
//! so long-lived client sessions never present a token the backend is
//! about to reject. Refresh is strictly best-effort: when it fails the
//! stale credential stays in place and the next 401 tells the caller the
//! session is really gone.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::api::request::to_json_value;
use crate::api::{send_and_decode, ApiError, ApiRequest, HttpTransport};
use crate::auth::claims::decode_claims;
use crate::auth::CredentialStore;
use crate::config::ApiConfig;
use crate::models::{HandshakeResponse, UserProfile};

/// Days before expiry at which a credential counts as stale.
/// A week of headroom keeps long-lived sessions renewed well before the
/// backend would reject them.
const REFRESH_WINDOW_DAYS: i64 = 7;

/// Refresh endpoint path.
const REFRESH_PATH: &str = "auth/refresh";

/// A live session: the credential paired with the identity it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub credential: String,
    pub user: UserProfile,
}

/// Outcome of a freshness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The stored credential is comfortably inside its validity window.
    Fresh,
    /// The credential was stale and has been replaced.
    Refreshed,
    /// The credential was stale and the refresh attempt failed; the stale
    /// value is retained.
    RefreshFailed,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    token: &'a str,
}

/// Owns the expiry policy and refresh orchestration for the credential
/// slot.
pub struct SessionManager {
    credentials: Arc<CredentialStore>,
    transport: Arc<dyn HttpTransport>,
    config: ApiConfig,
    /// Serializes refresh round-trips; at most one may be in flight.
    refresh_gate: Mutex<()>,
}

impl SessionManager {
    pub fn new(
        credentials: Arc<CredentialStore>,
        transport: Arc<dyn HttpTransport>,
        config: ApiConfig,
    ) -> Self {
        Self {
            credentials,
            transport,
            config,
            refresh_gate: Mutex::new(()),
        }
    }

    /// True when the token is expired, expiring within the proactive
    /// window, or unreadable (fail closed).
    pub fn is_stale_or_expired(&self, token: &str) -> bool {
        is_stale_at(token, Utc::now())
    }

    /// Make sure the stored credential is fresh enough to use.
    ///
    /// Fails only when no credential is stored. A failed refresh is logged
    /// and reported as [`Freshness::RefreshFailed`], never as an error: the
    /// stale credential may still be honored for a grace window, and the
    /// refresh endpoint being down must not take otherwise-valid sessions
    /// with it.
    pub async fn ensure_fresh(&self) -> Result<Freshness, ApiError> {
        let token = self.credentials.read().ok_or(ApiError::NoCredential)?;
        if !self.is_stale_or_expired(&token) {
            return Ok(Freshness::Fresh);
        }

        let _gate = self.refresh_gate.lock().await;

        // Re-read after acquiring the gate: a concurrent caller may have
        // finished a refresh while this one waited.
        let token = self.credentials.read().ok_or(ApiError::NoCredential)?;
        if !self.is_stale_or_expired(&token) {
            return Ok(Freshness::Fresh);
        }

        match self.refresh(&token).await {
            Ok(rotated) => {
                self.credentials.save(&rotated);
                info!("Session credential refreshed");
                Ok(Freshness::Refreshed)
            }
            Err(e) => {
                warn!(error = %e, "Credential refresh failed, keeping the stale credential");
                Ok(Freshness::RefreshFailed)
            }
        }
    }

    /// One refresh round-trip: post the current credential, get a rotated
    /// one back. Goes out unauthenticated so it cannot re-enter the
    /// freshness check. The store is only written by the caller after this
    /// returns, so a dropped refresh leaves the slot untouched.
    async fn refresh(&self, token: &str) -> Result<String, ApiError> {
        let request = ApiRequest::post(REFRESH_PATH)
            .unauthenticated()
            .json(to_json_value(&RefreshRequest { token })?)
            .prepare(&self.config, None)?;

        let response: HandshakeResponse =
            send_and_decode(self.transport.as_ref(), request).await?;
        if response.token.trim().is_empty() {
            return Err(ApiError::Decode("refresh returned an empty token".to_string()));
        }
        Ok(response.token)
    }
}

/// Staleness policy at a given instant. A missing or unreadable expiry
/// counts as expired.
fn is_stale_at(token: &str, now: DateTime<Utc>) -> bool {
    let Some(claims) = decode_claims(token) else {
        return true;
    };
    let Some(expires_at) = claims.expires_at() else {
        return true;
    };
    expires_at <= now + Duration::days(REFRESH_WINDOW_DAYS)
}
