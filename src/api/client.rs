use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use reqwest::Response;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{ExpiryNotifier, RefreshOutcome, SessionController};
use crate::config::ApiConfig;
use crate::error::AuthError;

/// The authenticated HTTP client for the MetaScan API.
///
/// Every request flows through [`ApiClient::execute`], which attaches the
/// bearer token and classifies each completed exchange into one of: pass
/// through, retry once after a token refresh, relabel as an upstream
/// integration error, or escalate to session expiry.
///
/// `Ok(Some(response))` may carry any non-401 status; business errors are
/// the feature layer's problem and pass through untouched. `Ok(None)` means
/// the session expired and was torn down: the request resolves empty and no
/// error should be shown for it, since the logged-out event is the
/// resolution.
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    session: Arc<SessionController>,
    notifier: Arc<dyn ExpiryNotifier>,
}

impl ApiClient {
    pub fn new(
        config: &ApiConfig,
        session: Arc<SessionController>,
        notifier: Arc<dyn ExpiryNotifier>,
    ) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = config.timeout_in_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        ApiClient {
            http: builder.build().expect("failed to build HTTP client"),
            config: config.clone(),
            session,
            notifier,
        }
    }

    pub async fn get(&self, path: &str) -> Result<Option<Response>, AuthError> {
        self.execute(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Option<Response>, AuthError> {
        self.execute(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Option<Response>, AuthError> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Option<Response>, AuthError> {
        self.execute(Method::DELETE, path, None).await
    }

    /// Dispatch one request and drive the refresh-or-expire protocol on 401.
    ///
    /// Exactly one retry per original request and exactly one refresh call
    /// triggered by its failure; the retried exchange's outcome is returned
    /// as-is, a second 401 included.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Response>, AuthError> {
        let request_id = Uuid::new_v4();
        let open = self.is_open_path(path);
        let refresh_call = self.is_refresh_path(path);

        // Login/registration/password-reset and the refresh endpoint itself
        // go out unauthenticated.
        let token = if open || refresh_call {
            None
        } else {
            self.session.access_token()
        };

        debug!(
            "[{}] Dispatching {} {} (authenticated: {})",
            request_id,
            method,
            path,
            token.is_some()
        );
        let response = self
            .dispatch(method.clone(), path, body.as_ref(), token.as_deref())
            .await?;

        let status = response.status();
        if status != StatusCode::UNAUTHORIZED {
            // Success and non-auth failures alike belong to the caller.
            return Ok(Some(response));
        }

        // A rejected refresh call is fatal for the session; never chase it
        // with another refresh.
        if refresh_call {
            warn!("[{}] Refresh endpoint returned 401.", request_id);
            return self.expire(request_id).await;
        }

        // Login-type failures surface directly to the caller; they are not
        // session expiry.
        if open {
            debug!("[{}] 401 on open path {}; not intercepting.", request_id, path);
            return Err(AuthError::InvalidCredentials);
        }

        // A 401 from a downstream integration concerns its credentials,
        // not our session.
        if self.is_upstream_path(path) {
            let message = read_detail(response)
                .await
                .unwrap_or_else(|| "credenciais da integração rejeitadas".to_string());
            warn!("[{}] Upstream integration 401 on {}: {}", request_id, path, message);
            return Err(AuthError::Upstream { message });
        }

        debug!("[{}] 401 on {}; attempting token refresh.", request_id, path);
        match self.session.refresh_access_token().await {
            Ok(RefreshOutcome::Refreshed(access)) => {
                debug!("[{}] Refresh succeeded; retrying original request once.", request_id);
                let retried = self
                    .dispatch(method, path, body.as_ref(), Some(&access))
                    .await?;
                Ok(Some(retried))
            }
            Ok(RefreshOutcome::NoSession) => {
                debug!("[{}] No refresh token available.", request_id);
                self.expire(request_id).await
            }
            Err(e) => {
                warn!("[{}] Refresh failed: {}", request_id, e);
                self.expire(request_id).await
            }
        }
    }

    /// Build and send one request. Transport-level failures (the request
    /// never completed) become connection errors.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> Result<Response, AuthError> {
        let url = self.config.url(path);
        let mut request = self.http.request(method, &url);
        if let Some(token) = bearer {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| AuthError::Connection(e.to_string()))
    }

    /// Terminal handling for an unsalvageable session: notify, then log out
    /// once the notice is acknowledged. The original request resolves empty.
    async fn expire(&self, request_id: Uuid) -> Result<Option<Response>, AuthError> {
        warn!("[{}] Session cannot be salvaged; expiring.", request_id);
        if self.notifier.session_expired().await {
            self.session.logout();
        }
        Ok(None)
    }

    fn is_refresh_path(&self, path: &str) -> bool {
        normalize(path) == normalize(&self.config.refresh_path)
    }

    fn is_open_path(&self, path: &str) -> bool {
        let normalized = normalize(path);
        normalized == normalize(&self.config.login_path)
            || self
                .config
                .open_paths
                .iter()
                .any(|open| normalize(open) == normalized)
    }

    fn is_upstream_path(&self, path: &str) -> bool {
        let normalized = normalize(path);
        // Segment-wise match: "sankhya" covers "sankhya/produtos/" but not
        // an unrelated "sankhyafoo/".
        self.config.upstream_paths.iter().any(|prefix| {
            let prefix = normalize(prefix);
            normalized == prefix || normalized.starts_with(&format!("{prefix}/"))
        })
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

/// Pull the backend's "detail" field out of an error body, when present.
async fn read_detail(response: Response) -> Option<String> {
    let body = response.json::<Value>().await.ok()?;
    body.get("detail")
        .and_then(|d| d.as_str())
        .map(str::to_string)
}
