//! Request descriptors and URL assembly for the two backend surfaces.
//!
//! An [`ApiRequest`] declares one outbound call as a value: path, verb,
//! query, body, target surface, and whether the stored credential should be
//! attached. [`ApiRequest::prepare`] turns it into a [`PreparedRequest`]
//! for the transport, applying the backend's path conventions and the
//! dual-header credential policy.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::Serialize;

use crate::config::ApiConfig;

use super::ApiError;

/// Fallback credential header. The hosting edge network has been seen
/// dropping `Authorization` on certain redirect hops; the backend checks
/// this header when the standard one is missing, so both carry the same
/// bearer value.
pub const FALLBACK_AUTH_HEADER: &str = "x-readbound-authorization";

/// Path segment that marks a route as part of the authentication flows.
const AUTH_SEGMENT: &str = "auth";

/// Registration lives under `users/` but is served by the same backend
/// router as the auth endpoints and follows their path rules.
const REGISTER_PATH: &str = "users/register";

/// Which backend surface a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// The mobile API: `{root}/{mobile_prefix}/{path}`.
    Mobile,
    /// The legacy web API: `{root}/{path}`. Used for avatar upload, profile
    /// update, username checks, account deletion, and diary mutation.
    Legacy,
}

/// One file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Request payload.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(UploadPart),
}

/// A single outbound call, before URL assembly and credential injection.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    authenticated: bool,
    surface: Surface,
}

/// A fully assembled request, ready for the transport.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl ApiRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: Vec::new(),
            body: RequestBody::Empty,
            authenticated: true,
            surface: Surface::Mobile,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Multipart POST carrying one file part.
    pub fn upload(path: &str, part: UploadPart) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = RequestBody::Multipart(part);
        request
    }

    /// Send without the stored credential. Login, registration, and
    /// identity-token exchange go out this way even when a stale credential
    /// is still stored.
    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Target a different surface than the mobile default.
    pub fn surface(mut self, surface: Surface) -> Self {
        self.surface = surface;
        self
    }

    /// Append one query parameter.
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    /// Assemble the final URL and headers.
    ///
    /// The credential, when given, is trimmed and attached under both
    /// header names; a blank credential attaches nothing.
    pub(crate) fn prepare(
        &self,
        config: &ApiConfig,
        credential: Option<&str>,
    ) -> Result<PreparedRequest, ApiError> {
        let path = normalize_path(&self.path);
        if path.is_empty() {
            return Err(ApiError::MalformedRequest("empty request path".to_string()));
        }

        let base = match self.surface {
            Surface::Mobile => config.mobile_base(),
            Surface::Legacy => config.legacy_base(),
        };
        let mut url = reqwest::Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| ApiError::MalformedRequest(format!("invalid URL: {}", e)))?;
        for (key, value) in &self.query {
            url.query_pairs_mut().append_pair(key, value);
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = credential {
            let token = token.trim();
            if !token.is_empty() {
                let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ApiError::MalformedRequest(format!("credential is not header-safe: {}", e)))?;
                headers.insert(AUTHORIZATION, bearer.clone());
                headers.insert(FALLBACK_AUTH_HEADER, bearer);
            }
        }

        Ok(PreparedRequest {
            method: self.method.clone(),
            url: url.to_string(),
            headers,
            body: self.body.clone(),
        })
    }
}

/// True when the path belongs to the authentication flows.
pub(crate) fn is_auth_path(path: &str) -> bool {
    let trimmed = path.trim_matches('/');
    trimmed == REGISTER_PATH || trimmed.split('/').any(|segment| segment == AUTH_SEGMENT)
}

/// Apply the backend's path conventions.
///
/// The routing layer redirects most paths that lack a trailing slash, and
/// the redirect drops the `Authorization` header, so ordinary paths always
/// get exactly one trailing slash. The auth router instead answers
/// method-not-allowed when a trailing slash is added, so auth paths are
/// sent bare.
pub(crate) fn normalize_path(path: &str) -> String {
    let bare = path.trim_start_matches('/').trim_end_matches('/');
    if bare.is_empty() {
        return String::new();
    }
    if is_auth_path(bare) {
        bare.to_string()
    } else {
        format!("{}/", bare)
    }
}

/// Serialize a typed body into the JSON payload a descriptor carries.
pub(crate) fn to_json_value<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::MalformedRequest(format!("unserializable request body: {}", e)))
}
