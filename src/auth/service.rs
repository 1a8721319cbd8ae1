//! Authentication handshakes: password login, registration, and
//! identity-token exchange.
//!
//! Each handshake produces a credential and the identity it belongs to.
//! The credential is persisted inside this service before the session is
//! handed back, so callers cannot forget to.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::api::request::to_json_value;
use crate::api::{ApiClient, ApiError, ApiRequest};
use crate::auth::{CredentialStore, Session};
use crate::models::{HandshakeResponse, UserProfile, VerifyResponse};

/// Login endpoint path.
const LOGIN_PATH: &str = "auth/login";

/// Registration endpoint path. Served by the auth router despite the
/// prefix.
const REGISTER_PATH: &str = "users/register";

/// Identity-token exchange endpoint path.
const IDENTITY_EXCHANGE_PATH: &str = "auth/identity-exchange";

/// Session verification endpoint path.
const VERIFY_PATH: &str = "auth/verify";

/// User-facing authentication failures.
///
/// Handshake rejections map to messages a UI can show verbatim; everything
/// else wraps the gateway error and belongs behind a generic "try again".
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    DuplicateAccount,

    #[error("Sign-in with this provider was rejected - please try again")]
    IdentityTokenRejected,

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct IdentityExchangeRequest<'a> {
    #[serde(rename = "idToken")]
    id_token: &'a str,
}

/// The credential-producing handshakes, plus session verification and
/// logout.
pub struct AuthService {
    api: Arc<ApiClient>,
    credentials: Arc<CredentialStore>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>, credentials: Arc<CredentialStore>) -> Self {
        Self { api, credentials }
    }

    /// Password login.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .unauthenticated()
            .json(to_json_value(&LoginRequest { email, password })?);

        let session = self.complete_handshake(request).await.map_err(|e| match e {
            ApiError::UnexpectedStatus { status: 400 | 401, .. } => AuthError::InvalidCredentials,
            other => AuthError::Api(other),
        })?;
        info!(user = %session.user.username, "Signed in");
        Ok(session)
    }

    /// Create an account.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let request = ApiRequest::post(REGISTER_PATH)
            .unauthenticated()
            .json(to_json_value(&RegisterRequest { name, email, password })?);

        let session = self.complete_handshake(request).await.map_err(|e| match e {
            ApiError::UnexpectedStatus { status: 400 | 409, .. } => AuthError::DuplicateAccount,
            other => AuthError::Api(other),
        })?;
        info!(user = %session.user.username, "Account created");
        Ok(session)
    }

    /// Exchange a token from a third-party identity provider for a session.
    ///
    /// The backend verifies the token with the provider and creates or
    /// reuses the identity keyed by the verified email claim.
    pub async fn exchange_identity_token(&self, id_token: &str) -> Result<Session, AuthError> {
        let request = ApiRequest::post(IDENTITY_EXCHANGE_PATH)
            .unauthenticated()
            .json(to_json_value(&IdentityExchangeRequest { id_token })?);

        let session = self.complete_handshake(request).await.map_err(|e| match e {
            ApiError::UnexpectedStatus { status: 401, .. } => AuthError::IdentityTokenRejected,
            other => AuthError::Api(other),
        })?;
        info!(user = %session.user.username, "Signed in via identity provider");
        Ok(session)
    }

    /// Resolve the identity behind the stored credential.
    ///
    /// A 401 here means the stored credential is dead; the caller should
    /// `logout` and prompt for sign-in.
    pub async fn verify(&self) -> Result<UserProfile, AuthError> {
        let response: VerifyResponse = self.api.execute(ApiRequest::get(VERIFY_PATH)).await?;
        Ok(response.user)
    }

    /// Drop the stored credential.
    pub fn logout(&self) {
        self.credentials.delete();
        info!("Signed out");
    }

    /// Run one handshake: execute, validate the returned token, persist it.
    async fn complete_handshake(&self, request: ApiRequest) -> Result<Session, ApiError> {
        let response: HandshakeResponse = self.api.execute(request).await?;
        let token = response.token.trim();
        if token.is_empty() {
            return Err(ApiError::Decode("handshake returned an empty token".to_string()));
        }

        self.credentials.save(token);
        Ok(Session {
            credential: token.to_string(),
            user: response.user,
        })
    }
}
