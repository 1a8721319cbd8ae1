//! Request gateway for the Readbound backend.
//!
//! This module provides the `ApiClient` struct that turns [`ApiRequest`]
//! descriptors into HTTP calls: it assembles URLs for the mobile and legacy
//! surfaces, keeps the session fresh, injects the stored credential under
//! both header names, and maps every outcome onto [`ApiError`].

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::{CredentialStore, SessionManager};
use crate::config::ApiConfig;

use super::request::{is_auth_path, to_json_value, ApiRequest, PreparedRequest, UploadPart};
use super::transport::{HttpTransport, RawResponse, ReqwestTransport};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of retries for rate-limited (429) requests.
/// 3 retries with exponential backoff usually succeeds without excessive delay.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
/// 1 second is polite to the server while not making users wait too long.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Request gateway for the Readbound API.
/// Clone is cheap - the transport, store, and session manager are shared
/// through `Arc`.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<CredentialStore>,
    session: Arc<SessionManager>,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a gateway with the `reqwest` transport.
    pub fn new(config: ApiConfig, credentials: Arc<CredentialStore>) -> Result<Self, ApiError> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(config, credentials, transport))
    }

    /// Create a gateway over an explicit transport.
    pub fn with_transport(
        config: ApiConfig,
        credentials: Arc<CredentialStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let session = Arc::new(SessionManager::new(
            Arc::clone(&credentials),
            Arc::clone(&transport),
            config.clone(),
        ));
        Self {
            transport,
            credentials,
            session,
            config,
        }
    }

    /// The session manager coordinating proactive refresh for this gateway.
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Execute one descriptor and decode its 2xx body as `T`.
    ///
    /// Authenticated descriptors get a freshness check first (skipped on
    /// auth paths, which must not refresh mid-handshake) and then carry the
    /// stored credential. The freshness check never blocks the call: its
    /// failures are logged and the request goes out with whatever
    /// credential is stored.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let credential = if request.is_authenticated() {
            if !is_auth_path(request.path()) {
                if let Err(e) = self.session.ensure_fresh().await {
                    // Only NoCredential lands here; refresh failures are
                    // absorbed and logged by the session manager.
                    debug!(error = %e, path = request.path(), "Proceeding without a freshness check");
                }
            }
            self.credentials.read()
        } else {
            None
        };

        let prepared = request.prepare(&self.config, credential.as_deref())?;
        send_and_decode(self.transport.as_ref(), prepared).await
    }

    // ===== Convenience verbs (mobile surface, authenticated) =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(ApiRequest::post(path).json(to_json_value(body)?)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(ApiRequest::patch(path).json(to_json_value(body)?)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::delete(path)).await
    }

    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        part: UploadPart,
    ) -> Result<T, ApiError> {
        self.execute(ApiRequest::upload(path, part)).await
    }
}

/// Send a prepared request and decode the 2xx body as `T`.
///
/// This is the dispatch path shared by the gateway and the session
/// manager's refresh round-trip, which must not re-enter the freshness
/// check. Non-2xx statuses always surface as `UnexpectedStatus`; callers
/// that want the server's message parse it from the retained body.
pub(crate) async fn send_and_decode<T: DeserializeOwned>(
    transport: &dyn HttpTransport,
    request: PreparedRequest,
) -> Result<T, ApiError> {
    let response = send_with_backoff(transport, request).await?;
    if !response.status.is_success() {
        return Err(ApiError::from_status(response.status, &response.body_text()));
    }

    // Some mutations answer 2xx with no body; decode that as JSON null so
    // unit and Option targets work.
    let body: &[u8] = if response.body.is_empty() {
        b"null"
    } else {
        &response.body
    };
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Execute with retries for rate-limited responses.
///
/// 429 is the one status retried here; after the retry budget it is
/// returned like any other response and surfaces as `UnexpectedStatus`.
async fn send_with_backoff(
    transport: &dyn HttpTransport,
    request: PreparedRequest,
) -> Result<RawResponse, ApiError> {
    let mut retries = 0;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        let response = transport.execute(request.clone()).await?;
        if response.status.as_u16() != 429 {
            return Ok(response);
        }

        retries += 1;
        if retries > MAX_RATE_LIMIT_RETRIES {
            return Ok(response);
        }
        warn!(url = %request.url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        backoff_ms *= 2; // Exponential backoff
    }
}
