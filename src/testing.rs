//! Shared test fixtures: a canned config, minted tokens, and a scripted
//! transport that records everything the gateway sends.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use reqwest::StatusCode;

use crate::api::{ApiError, HttpTransport, PreparedRequest, RawResponse};
use crate::config::ApiConfig;

pub(crate) fn config() -> ApiConfig {
    ApiConfig {
        api_root: "https://api.example.com".to_string(),
        mobile_prefix: "mobile/v1".to_string(),
        timeout: Duration::from_secs(5),
    }
}

/// Unix timestamp `days` from now.
pub(crate) fn days_from_now(days: i64) -> i64 {
    (Utc::now() + chrono::Duration::days(days)).timestamp()
}

/// Mint a structurally valid token with the given subject and expiry.
pub(crate) fn make_token(sub: &str, exp: i64) -> String {
    make_token_with_payload(&format!(r#"{{"sub": "{sub}", "exp": {exp}}}"#))
}

/// Mint a token around an arbitrary payload segment. The signature is
/// garbage; nothing in this crate checks it.
pub(crate) fn make_token_with_payload(payload: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg": "HS256", "typ": "JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(payload);
    format!("{header}.{claims}.signature")
}

pub(crate) fn json_response(status: u16, body: serde_json::Value) -> RawResponse {
    RawResponse {
        status: StatusCode::from_u16(status).expect("invalid status code"),
        body: body.to_string().into_bytes(),
    }
}

/// The body every credential-producing endpoint answers with.
pub(crate) fn handshake_body(token: &str) -> serde_json::Value {
    serde_json::json!({
        "token": token,
        "user": {
            "id": "u-1",
            "username": "reader",
            "displayName": "Reader",
            "avatarUrl": null,
        }
    })
}

type Responder = dyn Fn(&PreparedRequest) -> Result<RawResponse, ApiError> + Send + Sync;

/// Transport double: answers from a closure, records every request in
/// order, and can hold responses back to widen race windows.
pub(crate) struct StubTransport {
    responder: Box<Responder>,
    seen: Mutex<Vec<PreparedRequest>>,
    delay: Option<Duration>,
}

impl StubTransport {
    pub(crate) fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&PreparedRequest) -> Result<RawResponse, ApiError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            seen: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    /// Like `new`, but each response is held back for `delay_ms` first.
    pub(crate) fn delayed<F>(delay_ms: u64, responder: F) -> Arc<Self>
    where
        F: Fn(&PreparedRequest) -> Result<RawResponse, ApiError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            seen: Mutex::new(Vec::new()),
            delay: Some(Duration::from_millis(delay_ms)),
        })
    }

    /// Every request seen so far, in send order.
    pub(crate) fn requests(&self) -> Vec<PreparedRequest> {
        self.seen.lock().unwrap().clone()
    }

    /// How many recorded requests have a URL containing `fragment`.
    pub(crate) fn count_containing(&self, fragment: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn execute(&self, request: PreparedRequest) -> Result<RawResponse, ApiError> {
        self.seen.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(&request)
    }
}
