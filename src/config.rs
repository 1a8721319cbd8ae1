//! Backend endpoint configuration.
//!
//! The client core is constructed with an explicit `ApiConfig` instead of
//! reading ambient globals, so tests and staging deployments can point it
//! at a different backend without process-wide state.

use std::time::Duration;

/// Production API root.
const DEFAULT_API_ROOT: &str = "https://api.readbound.app";

/// Path prefix for the mobile API surface.
const DEFAULT_MOBILE_PREFIX: &str = "mobile/v1";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Endpoints and transport settings for one backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bare API root, no trailing slash. Legacy web endpoints hang directly
    /// off this root.
    pub api_root: String,
    /// Prefix inserted between the root and mobile-surface paths.
    pub mobile_prefix: String,
    /// Per-request transport timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            mobile_prefix: DEFAULT_MOBILE_PREFIX.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Base URL for the mobile surface.
    pub fn mobile_base(&self) -> String {
        format!(
            "{}/{}",
            self.api_root.trim_end_matches('/'),
            self.mobile_prefix.trim_matches('/')
        )
    }

    /// Base URL for the legacy web surface.
    pub fn legacy_base(&self) -> String {
        self.api_root.trim_end_matches('/').to_string()
    }
}
