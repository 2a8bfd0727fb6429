use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// User attributes carried by (or cached alongside) the access token.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SessionClaims {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl SessionClaims {
    /// Decode claims from a JWT's payload segment without verifying the
    /// signature. Verification is the backend's job; the client only reads
    /// display attributes out of a token it already trusts.
    ///
    /// Returns None for anything that is not a syntactically valid token;
    /// never fails louder than that.
    pub fn decode_unverified(token: &str) -> Option<SessionClaims> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        match serde_json::from_slice::<SessionClaims>(&bytes) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!("Token payload is not claim JSON: {}", e);
                None
            }
        }
    }

    /// The user id as a string, whatever JSON type the backend used.
    pub fn user_id_string(&self) -> Option<String> {
        self.user_id.as_ref().map(value_to_string)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
    }
}

/// Convert arbitrary JSON claim values into string form.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
