//! Request gateway module for the Readbound backend.
//!
//! This module provides the `ApiClient` for executing calls against the
//! backend's mobile and legacy web surfaces.
//!
//! The API uses bearer-token authentication; the stored credential rides
//! under two header names because an edge network strips the standard one
//! on some redirect hops.

pub mod client;
pub mod error;
pub mod request;
pub mod transport;

pub(crate) use client::send_and_decode;
pub use client::ApiClient;
pub use error::ApiError;
pub use request::{ApiRequest, PreparedRequest, RequestBody, Surface, UploadPart, FALLBACK_AUTH_HEADER};
pub use transport::{HttpTransport, RawResponse, ReqwestTransport};
