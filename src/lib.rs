//! Core client library for Readbound.
//!
//! Everything an app shell needs to talk to the Readbound backend:
//! a request gateway ([`ApiClient`]) that assembles URLs, injects the
//! session credential, and decodes responses; a session layer
//! ([`SessionManager`], [`AuthService`]) that keeps that credential
//! fresh across sign-in, proactive refresh, and sign-out; and durable
//! credential storage ([`CredentialStore`]) over the OS keyring.
//!
//! UI concerns live in the shells that embed this crate.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, ApiRequest, Surface};
pub use auth::{AuthError, AuthService, CredentialStore, SessionManager};
pub use config::ApiConfig;
