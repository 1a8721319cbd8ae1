use serde::Deserialize;
use thiserror::Error;

/// Errors produced by the request gateway.
///
/// Each call maps onto exactly one variant; the gateway never silently
/// defaults a bad response and never retries on the caller's behalf
/// (rate-limit backoff excepted).
#[derive(Error, Debug)]
pub enum ApiError {
    /// No credential is stored; the caller must authenticate first.
    #[error("No credential stored - not signed in")]
    NoCredential,

    /// The descriptor could not be turned into a request. Programmer
    /// error, not retried.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The call failed below HTTP: DNS, connect, TLS, or timeout.
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status. 401 means the credential
    /// is dead and the caller should re-authenticate; every other code
    /// surfaces as-is.
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A 2xx response whose body does not match the expected shape.
    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Maximum length for error response bodies retained in error values
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error payload shape the backend uses for most non-2xx responses.
#[derive(Debug, Deserialize)]
struct ServerMessage {
    error: String,
}

impl ApiError {
    /// Truncate a response body to avoid carrying excessive data around
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::UnexpectedStatus {
            status: status.as_u16(),
            body: Self::truncate_body(body),
        }
    }

    /// True for 401 responses, which should send the caller into the
    /// logout/re-auth flow.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::UnexpectedStatus { status: 401, .. })
    }

    /// Best-effort extraction of the server's `{"error": "..."}` message
    /// from a rejected call. `None` when the body is any other shape.
    pub fn server_message(&self) -> Option<String> {
        match self {
            ApiError::UnexpectedStatus { body, .. } => {
                serde_json::from_str::<ServerMessage>(body).ok().map(|m| m.error)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
