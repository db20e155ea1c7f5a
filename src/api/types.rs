//! Typed records at the HTTP boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::endpoints::{AUTH_CLIENT_ID, GRANT_TYPE_OTP, GRANT_TYPE_REFRESH, OAUTH_SCOPE, OTP_REALM};

/// A pending package as returned by the backend; fields are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Package(Map<String, Value>);

impl Package {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Payload of the authenticated "current user" resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The vendor wraps every API payload under a `Data` key.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(rename = "Data")]
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordlessStartRequest<'a> {
    pub client_id: &'static str,
    pub phone_number: &'a str,
    pub send: &'static str,
    pub connection: &'static str,
}

impl<'a> PasswordlessStartRequest<'a> {
    pub fn sms(phone_number: &'a str) -> Self {
        Self {
            client_id: AUTH_CLIENT_ID,
            phone_number,
            send: "code",
            connection: OTP_REALM,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OtpGrantRequest<'a> {
    pub client_id: &'static str,
    pub scope: &'static str,
    pub username: &'a str,
    pub grant_type: &'static str,
    pub otp: &'a str,
    pub realm: &'static str,
}

impl<'a> OtpGrantRequest<'a> {
    pub fn new(phone_number: &'a str, otp: &'a str) -> Self {
        Self {
            client_id: AUTH_CLIENT_ID,
            scope: OAUTH_SCOPE,
            username: phone_number,
            grant_type: GRANT_TYPE_OTP,
            otp,
            realm: OTP_REALM,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshGrantRequest<'a> {
    pub client_id: &'static str,
    pub grant_type: &'static str,
    pub refresh_token: &'a str,
}

impl<'a> RefreshGrantRequest<'a> {
    pub fn new(refresh_token: &'a str) -> Self {
        Self {
            client_id: AUTH_CLIENT_ID,
            grant_type: GRANT_TYPE_REFRESH,
            refresh_token,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshGrantResponse {
    pub access_token: String,
    pub expires_in: f64,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PackagesQuery {
    pub history_or_inventory: &'static str,
    pub sort: PackagesSort,
}

#[derive(Debug, Serialize)]
pub(crate) struct PackagesSort {
    pub direction: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl PackagesQuery {
    /// Packages still in the leasing office, newest scan first.
    pub fn inventory() -> Self {
        Self {
            history_or_inventory: "Inventory",
            sort: PackagesSort {
                direction: "Desc",
                kind: "ScannedByTimestamp",
            },
        }
    }
}
