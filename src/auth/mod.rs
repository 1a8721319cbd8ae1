//! Authentication: credential storage, token claims, session freshness,
//! and the sign-in handshakes.
//!
//! This module provides:
//! - `CredentialStore`: one durable slot for the session credential
//! - `SessionManager`: proactive refresh of credentials nearing expiry
//! - `AuthService`: login, registration, and identity-token exchange

pub mod claims;
pub mod credentials;
pub mod service;
pub mod session;

pub use claims::{decode_claims, TokenClaims};
pub use credentials::{CredentialStore, KeyringStore, MemoryStore, SecureStore};
pub use service::{AuthError, AuthService};
pub use session::{Freshness, Session, SessionManager};
