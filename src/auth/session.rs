use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::auth::AuthClient;
use crate::error::AuthError;
use crate::models::SessionClaims;
use crate::store::{keys, TokenStore};

/// Session lifecycle changes, broadcast so the embedding UI can react
/// (typically by navigating to or away from the login screen).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
}

/// Result of a refresh attempt that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A usable access token, either freshly obtained by this call or
    /// adopted from a refresh that completed while this caller waited.
    Refreshed(String),
    /// There is no refresh token, so there is no session to refresh.
    /// No network call was made.
    NoSession,
}

/// Single authority for the session lifecycle. All token reads and writes
/// go through here, never through the store directly, so the pairing and
/// single-flight invariants are enforced in one place.
pub struct SessionController {
    client: AuthClient,
    store: Arc<dyn TokenStore>,
    /// Serializes refresh attempts: concurrent 401 handlers queue here and
    /// adopt the winning flight's token instead of issuing their own call.
    refresh_gate: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(client: AuthClient, store: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(16);
        SessionController {
            client,
            store,
            refresh_gate: Mutex::new(()),
            events,
        }
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Authenticate against the login endpoint and persist the session.
    ///
    /// No retry. Failures map onto the error taxonomy: 401 is invalid
    /// credentials, status 0 is a connection error, 5xx is a server error,
    /// anything else is unexpected.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .login(identifier, password)
            .await
            .map_err(|failure| {
                let error = AuthError::from_login_failure(&failure);
                warn!("Login failed (status {}): {}", failure.status, error);
                error
            })?;

        // Prefer claims the backend sent alongside the tokens; fall back to
        // the token payload for anything missing.
        let decoded = SessionClaims::decode_unverified(&response.access).unwrap_or_default();
        let claims = SessionClaims {
            role: response.role.clone().or(decoded.role),
            user_id: response.user_id.clone().or(decoded.user_id),
            email: response.email.clone().or(decoded.email),
            exp: decoded.exp,
        };

        self.save_tokens(&response.access, &response.refresh, Some(&claims));

        if let Some(expiry) = claims.expires_at() {
            debug!("Session established; access token expires at {}", expiry);
        }
        info!("User logged in.");
        let _ = self.events.send(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Persist a token pair (and optionally cached claims).
    ///
    /// Tokens are only ever saved as a pair: if either value is empty the
    /// call is a no-op and any existing pair stays intact.
    pub fn save_tokens(&self, access: &str, refresh: &str, claims: Option<&SessionClaims>) {
        if access.is_empty() || refresh.is_empty() {
            warn!("Refusing to save an incomplete token pair.");
            return;
        }

        self.store.set(keys::ACCESS_TOKEN, access);
        self.store.set(keys::REFRESH_TOKEN, refresh);

        if let Some(claims) = claims {
            if let Some(role) = &claims.role {
                self.store.set(keys::USER_ROLE, role);
            }
            if let Some(id) = claims.user_id_string() {
                self.store.set(keys::USER_ID, &id);
            }
            if let Some(email) = &claims.email {
                self.store.set(keys::USER_EMAIL, email);
            }
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get(keys::ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(keys::REFRESH_TOKEN)
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// The user's role: cached copy first, token payload as fallback.
    /// Absent (never an error) when neither source has it.
    pub fn user_role(&self) -> Option<String> {
        self.claim(keys::USER_ROLE, |claims| claims.role.clone())
    }

    /// The user's id, same resolution order as [`Self::user_role`].
    pub fn user_id(&self) -> Option<String> {
        self.claim(keys::USER_ID, |claims| claims.user_id_string())
    }

    /// The user's email, same resolution order as [`Self::user_role`].
    pub fn user_email(&self) -> Option<String> {
        self.claim(keys::USER_EMAIL, |claims| claims.email.clone())
    }

    fn claim<F>(&self, key: &str, extract: F) -> Option<String>
    where
        F: Fn(&SessionClaims) -> Option<String>,
    {
        if let Some(cached) = self.store.get(key) {
            return Some(cached);
        }
        let token = self.access_token()?;
        let claims = SessionClaims::decode_unverified(&token)?;
        extract(&claims)
    }

    /// Obtain a fresh access token, serialized across concurrent callers.
    ///
    /// Without a refresh token this resolves to [`RefreshOutcome::NoSession`]
    /// immediately, no network call. Otherwise at most one refresh request is
    /// in flight at a time: callers that queued behind it adopt its result.
    /// Any refresh failure (including connectivity loss) is terminal for the
    /// session and reported as [`AuthError::SessionExpired`].
    pub async fn refresh_access_token(&self) -> Result<RefreshOutcome, AuthError> {
        if self.refresh_token().is_none() {
            debug!("No refresh token present; nothing to refresh.");
            return Ok(RefreshOutcome::NoSession);
        }

        let stale = self.access_token();
        let _flight = self.refresh_gate.lock().await;

        // A refresh that completed while we queued already replaced the
        // token; use it instead of spending another call.
        if let Some(current) = self.access_token() {
            if stale.as_deref() != Some(current.as_str()) {
                debug!("Adopting access token from a concurrent refresh.");
                return Ok(RefreshOutcome::Refreshed(current));
            }
        }

        // Re-read under the gate: an interleaved logout may have cleared it.
        let refresh = match self.refresh_token() {
            Some(token) => token,
            None => return Ok(RefreshOutcome::NoSession),
        };

        match self.client.refresh(&refresh).await {
            Ok(response) if !response.access.is_empty() => {
                // Keep the old refresh token unless the backend rotated it.
                let next_refresh = response.refresh.clone().unwrap_or(refresh);
                self.save_tokens(&response.access, &next_refresh, None);
                info!("Access token refreshed.");
                Ok(RefreshOutcome::Refreshed(response.access))
            }
            Ok(_) => {
                warn!("Refresh response carried no access token; session is dead.");
                Err(AuthError::SessionExpired)
            }
            Err(failure) => {
                warn!(
                    "Token refresh failed (status {}); session is dead.",
                    failure.status
                );
                Err(AuthError::SessionExpired)
            }
        }
    }

    /// Clear every persisted session key, then broadcast the logged-out
    /// event so the embedding UI can navigate to the login screen.
    /// Storage only; no network call.
    pub fn logout(&self) {
        for key in keys::ALL {
            self.store.remove(key);
        }
        info!("Session cleared; user logged out.");
        let _ = self.events.send(SessionEvent::LoggedOut);
    }
}
