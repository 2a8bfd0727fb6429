use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::AuthFailure;
use crate::models::{LoginResponse, RefreshResponse};

/// Stateless client for the two auth endpoints: login and token refresh.
///
/// One HTTP request per call, no internal retries; retry policy belongs to
/// the caller (the session controller and the interceptor).
pub struct AuthClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl AuthClient {
    pub fn new(config: &ApiConfig) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = config.timeout_in_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        AuthClient {
            http: builder.build().expect("failed to build HTTP client"),
            config: config.clone(),
        }
    }

    /// Exchange credentials for a token pair via `POST {base}/login/`.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<LoginResponse, AuthFailure> {
        let url = self.config.url(&self.config.login_path);
        debug!("Sending login request to {}", url);

        let response = self
            .http
            .post(&url)
            .json(&json!({ "email": identifier, "password": password }))
            .send()
            .await
            .map_err(|e| {
                warn!("Login request failed before a response: {}", e);
                AuthFailure::connection()
            })?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<LoginResponse>()
                .await
                .map_err(|e| {
                    warn!("Login response body did not parse: {}", e);
                    AuthFailure::new(status.as_u16(), None)
                })
        } else {
            Err(AuthFailure::new(
                status.as_u16(),
                read_detail(response).await,
            ))
        }
    }

    /// Exchange a refresh token for a new access token via
    /// `POST {base}/token/refresh/`. The response may rotate the refresh
    /// token; when it does not, the caller keeps the old one.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthFailure> {
        let url = self.config.url(&self.config.refresh_path);
        debug!("Sending token refresh request to {}", url);

        let response = self
            .http
            .post(&url)
            .json(&json!({ "refresh": refresh_token }))
            .send()
            .await
            .map_err(|e| {
                warn!("Refresh request failed before a response: {}", e);
                AuthFailure::connection()
            })?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<RefreshResponse>()
                .await
                .map_err(|e| {
                    warn!("Refresh response body did not parse: {}", e);
                    AuthFailure::new(status.as_u16(), None)
                })
        } else {
            Err(AuthFailure::new(
                status.as_u16(),
                read_detail(response).await,
            ))
        }
    }
}

/// Pull the backend's "detail" field out of an error body, when present.
async fn read_detail(response: reqwest::Response) -> Option<String> {
    let body = response.json::<Value>().await.ok()?;
    body.get("detail")
        .and_then(|d| d.as_str())
        .map(str::to_string)
}
