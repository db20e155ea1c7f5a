use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{RequestBuilder, StatusCode};
use tracing::{debug, error};

use super::endpoints::{self, Endpoints};
use super::error::ApiError;
use super::types::{
    Envelope, OtpGrantRequest, Package, PackagesQuery, PasswordlessStartRequest,
    RefreshGrantRequest, RefreshGrantResponse, UserData,
};
use crate::auth::credentials::{unix_now, CredentialSet, TokenBundle, REFRESH_MARGIN_SECS};
use crate::auth::AuthError;
use crate::config::LivlyConfig;

/// Client for the Livly login service and resident API.
///
/// Owns the [`CredentialSet`]; every authenticated call first makes sure the
/// access token is valid for at least another five minutes, refreshing it
/// in place when it is not.
///
/// # Example
/// ```no_run
/// use livly::api::LivlyClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut client = LivlyClient::new();
/// client.request_otp("+15551234567").await?;
/// client.verify_otp("+15551234567", "123456").await?;
/// let packages = client.get_pending_packages().await?;
/// println!("{} packages waiting", packages.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LivlyClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    credentials: CredentialSet,
}

impl Default for LivlyClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LivlyClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints: Endpoints::default(),
            credentials: CredentialSet::default(),
        }
    }

    pub fn from_config(config: &LivlyConfig) -> Self {
        Self::new().with_endpoints(config.endpoints())
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.endpoints.auth_base_url = url.into();
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.endpoints.api_base_url = url.into();
        self
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    pub fn access_token(&self) -> Option<&str> {
        self.credentials.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.credentials.refresh_token.as_deref()
    }

    pub fn id_token(&self) -> Option<&str> {
        self.credentials.id_token.as_deref()
    }

    pub fn token_expires_at(&self) -> f64 {
        self.credentials.expires_at
    }

    pub fn user_id(&self) -> Option<i64> {
        self.credentials.user_id
    }

    pub fn set_tokens(
        &mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        id_token: impl Into<String>,
        expires_at: f64,
    ) {
        self.credentials
            .set_tokens(access_token, refresh_token, id_token, expires_at);
    }

    pub fn set_credentials(&mut self, credentials: CredentialSet) {
        self.credentials = credentials;
    }

    pub fn set_user_id(&mut self, user_id: i64) {
        self.credentials.user_id = Some(user_id);
    }

    /// Ask the login service to text a one-time code to `phone_number`.
    pub async fn request_otp(&self, phone_number: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.endpoints.passwordless_start())
            .json(&PasswordlessStartRequest::sms(phone_number))
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, "OTP request error");
                AuthError::from(err)
            })?;
        let status = response.status();
        if status != StatusCode::OK {
            error!(status = %status, "OTP request failed");
            return Err(AuthError::Status {
                operation: "Send OTP",
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// Exchange the texted code for a token set.
    ///
    /// Credentials are only replaced once the full response has decoded.
    pub async fn verify_otp(
        &mut self,
        phone_number: &str,
        otp_code: &str,
    ) -> Result<TokenBundle, AuthError> {
        let response = self
            .http
            .post(self.endpoints.oauth_token())
            .json(&OtpGrantRequest::new(phone_number, otp_code))
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, "OTP verification error");
                AuthError::from(err)
            })?;
        let status = response.status();
        if status != StatusCode::OK {
            error!(status = %status, "OTP verification failed");
            return Err(AuthError::Status {
                operation: "Verify OTP",
                status: status.as_u16(),
            });
        }
        let bundle: TokenBundle = response.json().await.map_err(|err| {
            error!(error = %err, "OTP verification returned an unreadable token set");
            AuthError::from(err)
        })?;
        self.credentials.apply_bundle(&bundle, unix_now());
        debug!(expires_in = bundle.expires_in, "OTP verified");
        Ok(bundle)
    }

    /// Trade the refresh token for a new access token.
    pub async fn refresh_access_token(&mut self) -> Result<(), AuthError> {
        let refresh_token = self
            .credentials
            .refresh_token
            .clone()
            .ok_or(AuthError::MissingRefreshToken)?;

        let response = self
            .http
            .post(self.endpoints.oauth_token())
            .json(&RefreshGrantRequest::new(&refresh_token))
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, "Token refresh error");
                AuthError::from(err)
            })?;
        let status = response.status();
        if status != StatusCode::OK {
            error!(status = %status, "Token refresh failed");
            return Err(AuthError::Status {
                operation: "Token refresh",
                status: status.as_u16(),
            });
        }
        let payload: RefreshGrantResponse = response.json().await.map_err(|err| {
            error!(error = %err, "Token refresh returned an unreadable token set");
            AuthError::from(err)
        })?;
        let rotated = payload.refresh_token.is_some();
        self.credentials.apply_refresh(
            payload.access_token,
            payload.refresh_token,
            payload.id_token,
            unix_now() + payload.expires_in,
        );
        debug!(
            expires_in = payload.expires_in,
            rotated_refresh_token = rotated,
            "Access token refreshed"
        );
        Ok(())
    }

    /// Fail when unauthenticated; refresh when the token expires within five minutes.
    pub async fn ensure_valid_token(&mut self) -> Result<(), AuthError> {
        if !self.credentials.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        if self
            .credentials
            .expires_within(unix_now(), REFRESH_MARGIN_SECS)
        {
            debug!("Access token expiring, refreshing");
            self.refresh_access_token().await?;
        }
        Ok(())
    }

    /// Fetch the signed-in resident and remember their user id.
    pub async fn get_user_info(&mut self) -> Result<UserData, ApiError> {
        self.ensure_valid_token().await?;

        let request = self
            .http
            .get(self.endpoints.user_me())
            .query(&[("v", endpoints::USER_ME_API_VERSION)]);
        let response = self.authorized(request)?.send().await.map_err(|err| {
            error!(error = %err, "Get user info error");
            ApiError::from(err)
        })?;
        let status = response.status();
        if status != StatusCode::OK {
            error!(status = %status, "Get user info failed");
            return Err(ApiError::Status {
                operation: "Get user info",
                status: status.as_u16(),
            });
        }
        let envelope: Envelope<UserData> = response.json().await.map_err(|err| {
            error!(error = %err, "Get user info returned an unreadable body");
            ApiError::from(err)
        })?;
        let user = envelope
            .data
            .ok_or_else(|| ApiError::InvalidResponse("user payload missing Data".to_string()))?;
        self.credentials.user_id = Some(user.user_id);
        debug!(user_id = user.user_id, "Resolved Livly user");
        Ok(user)
    }

    /// Packages waiting for pickup, newest scan first.
    pub async fn get_pending_packages(&mut self) -> Result<Vec<Package>, ApiError> {
        self.ensure_valid_token().await?;

        let user_id = match self.credentials.user_id {
            Some(user_id) => user_id,
            None => self.get_user_info().await?.user_id,
        };

        let request = self
            .http
            .post(self.endpoints.packages_filtered(user_id))
            .json(&PackagesQuery::inventory());
        let response = self.authorized(request)?.send().await.map_err(|err| {
            error!(error = %err, "Get packages error");
            ApiError::from(err)
        })?;
        let status = response.status();
        if status != StatusCode::OK {
            error!(status = %status, "Get packages failed");
            return Err(ApiError::Status {
                operation: "Get packages",
                status: status.as_u16(),
            });
        }
        let envelope: Envelope<Vec<Package>> = response.json().await.map_err(|err| {
            error!(error = %err, "Get packages returned an unreadable body");
            ApiError::from(err)
        })?;
        Ok(envelope.data.unwrap_or_default())
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, AuthError> {
        let token = self
            .credentials
            .access_token
            .as_deref()
            .ok_or(AuthError::NotAuthenticated)?;
        Ok(request.headers(default_headers()).bearer_auth(token))
    }
}

/// Headers the resident app sends on every API call.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(endpoints::USER_AGENT));
    headers.insert(
        HeaderName::from_static(endpoints::APP_ID_HEADER),
        HeaderValue::from_static(endpoints::APP_ID),
    );
    headers
}
