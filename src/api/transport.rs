//! Transport seam between request assembly and the network.
//!
//! The gateway and the session manager talk to [`HttpTransport`] rather
//! than to `reqwest` directly, so tests can substitute recording stubs and
//! drive every status/decoding path without a server.

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};

use crate::config::ApiConfig;

use super::request::{PreparedRequest, RequestBody};
use super::ApiError;

/// Raw transport-level response: status plus body bytes, no decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// The body as text, lossily, for error values and logs.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes prepared requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: PreparedRequest) -> Result<RawResponse, ApiError>;
}

/// `reqwest`-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: PreparedRequest) -> Result<RawResponse, ApiError> {
        let PreparedRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url.as_str()).headers(headers);
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(part) => {
                let file = multipart::Part::bytes(part.bytes)
                    .file_name(part.file_name)
                    .mime_str(&part.mime)
                    .map_err(|e| {
                        ApiError::MalformedRequest(format!("invalid mime type: {}", e))
                    })?;
                builder.multipart(multipart::Form::new().part(part.field, file))
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }
}
