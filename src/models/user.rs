use serde::{Deserialize, Serialize};

/// A Readbound account as the backend returns it from the auth and profile
/// endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Name to show in UI chrome: the display name when set, otherwise the
    /// handle.
    pub fn shown_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// Body of every credential-producing handshake: login, registration,
/// identity-token exchange, and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct HandshakeResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Body of the verify endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub user: UserProfile,
}
