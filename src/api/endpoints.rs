//! Fixed vendor constants for the Livly resident app backend.

pub const DEFAULT_AUTH_BASE_URL: &str = "https://login.livly.io";
pub const DEFAULT_API_BASE_URL: &str = "https://api.livly.io";

pub const PASSWORDLESS_START_PATH: &str = "/passwordless/start";
pub const OAUTH_TOKEN_PATH: &str = "/oauth/token";
pub const USER_ME_PATH: &str = "/api/livly/users/me";
pub const USER_ME_API_VERSION: &str = "202404";

pub const AUTH_CLIENT_ID: &str = "ubEvB5okpRuQswblDO2MPYyDScnI2hGn";
pub const OAUTH_SCOPE: &str = "openid profile email offline_access";
pub const GRANT_TYPE_OTP: &str = "http://auth0.com/oauth/grant-type/passwordless/otp";
pub const GRANT_TYPE_REFRESH: &str = "refresh_token";
pub const OTP_REALM: &str = "sms";

pub const APP_ID_HEADER: &str = "x-app-id";
pub const APP_ID: &str = "com.livly.android.livly_resident";
pub const USER_AGENT: &str = "okhttp/4.12.0";

pub fn packages_filtered_path(user_id: i64) -> String {
    format!("/api/livly/packages/user/{user_id}/filtered")
}

/// Base URLs the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth_base_url: String,
    pub api_base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn passwordless_start(&self) -> String {
        join(&self.auth_base_url, PASSWORDLESS_START_PATH)
    }

    pub fn oauth_token(&self) -> String {
        join(&self.auth_base_url, OAUTH_TOKEN_PATH)
    }

    pub fn user_me(&self) -> String {
        join(&self.api_base_url, USER_ME_PATH)
    }

    pub fn packages_filtered(&self, user_id: i64) -> String {
        join(&self.api_base_url, &packages_filtered_path(user_id))
    }
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
