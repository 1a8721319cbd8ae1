//! Wire-level data models for the Readbound backend.
//!
//! This module contains the structures shared across the auth and gateway
//! code:
//!
//! - `UserProfile`: the account identity returned by auth endpoints
//! - `HandshakeResponse`: the `{token, user}` body of every
//!   credential-producing call
//! - `VerifyResponse`: the `{user}` body of the verify endpoint
//!
//! Endpoint-specific request bodies stay private to the module that sends
//! them.

pub mod user;

pub use user::{HandshakeResponse, UserProfile, VerifyResponse};
