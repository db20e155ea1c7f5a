use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Seconds before expiry at which an access token is refreshed.
pub const REFRESH_MARGIN_SECS: f64 = 300.0;

/// Current wall-clock time as fractional unix seconds.
pub fn unix_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Token set issued by a successful OTP verification.
///
/// # Example
/// ```
/// use livly::auth::TokenBundle;
///
/// let bundle = TokenBundle {
///     access_token: "access".to_string(),
///     refresh_token: "refresh".to_string(),
///     id_token: "id".to_string(),
///     expires_in: 3600.0,
/// };
/// assert_eq!(bundle.expires_in, 3600.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub id_token: String,
    /// Seconds; integral or fractional on the wire.
    pub expires_in: f64,
}

/// In-memory credentials held by a [`crate::api::LivlyClient`].
///
/// A missing access token means the client is unauthenticated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialSet {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    /// Unix seconds; `0.0` when unknown.
    pub expires_at: f64,
    pub user_id: Option<i64>,
}

impl CredentialSet {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// True when the access token expires within `margin_secs` of `now`, or already has.
    pub fn expires_within(&self, now: f64, margin_secs: f64) -> bool {
        now > self.expires_at - margin_secs
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        let millis = (self.expires_at * 1000.0) as i64;
        Utc.timestamp_millis_opt(millis).single()
    }

    pub fn set_tokens(
        &mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        id_token: impl Into<String>,
        expires_at: f64,
    ) {
        self.access_token = Some(access_token.into());
        self.refresh_token = Some(refresh_token.into());
        self.id_token = Some(id_token.into());
        self.expires_at = expires_at;
    }

    pub(crate) fn apply_bundle(&mut self, bundle: &TokenBundle, now: f64) {
        self.set_tokens(
            bundle.access_token.clone(),
            bundle.refresh_token.clone(),
            bundle.id_token.clone(),
            now + bundle.expires_in,
        );
    }

    /// Applies a refresh-grant response; absent refresh/id tokens keep their current values.
    pub(crate) fn apply_refresh(
        &mut self,
        access_token: String,
        refresh_token: Option<String>,
        id_token: Option<String>,
        expires_at: f64,
    ) {
        self.access_token = Some(access_token);
        if let Some(refresh_token) = refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        if let Some(id_token) = id_token {
            self.id_token = Some(id_token);
        }
        self.expires_at = expires_at;
    }
}
