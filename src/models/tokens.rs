use serde::{Deserialize, Serialize};

/// Body of a successful `POST {base}/login/` response. The backend may
/// include user claims alongside the token pair; when it does not, claims
/// are decoded from the access token instead.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub role: Option<String>,
    pub user_id: Option<serde_json::Value>,
    pub email: Option<String>,
}

/// Body of a successful `POST {base}/token/refresh/` response. The refresh
/// token is only present when the backend rotates it.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RefreshResponse {
    #[serde(default)]
    pub access: String,
    pub refresh: Option<String>,
}
