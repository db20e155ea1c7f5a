//! SMS one-time-passcode login, producing a persisted configuration entry.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{error, info};

use super::error::{AuthError, StoreError};
use super::store::{ConfigStore, PersistedConfig};
use crate::api::{ApiError, LivlyClient};

/// Dial prefixes offered when entering a phone number: (prefix, label).
pub const COUNTRY_CODES: &[(&str, &str)] = &[
    ("+1", "+1 (US/Canada)"),
    ("+44", "+44 (UK)"),
    ("+61", "+61 (Australia)"),
    ("+49", "+49 (Germany)"),
    ("+33", "+33 (France)"),
    ("+39", "+39 (Italy)"),
    ("+34", "+34 (Spain)"),
    ("+31", "+31 (Netherlands)"),
    ("+46", "+46 (Sweden)"),
    ("+47", "+47 (Norway)"),
    ("+45", "+45 (Denmark)"),
    ("+358", "+358 (Finland)"),
    ("+41", "+41 (Switzerland)"),
    ("+43", "+43 (Austria)"),
    ("+32", "+32 (Belgium)"),
    ("+48", "+48 (Poland)"),
    ("+351", "+351 (Portugal)"),
    ("+353", "+353 (Ireland)"),
    ("+81", "+81 (Japan)"),
    ("+82", "+82 (South Korea)"),
    ("+86", "+86 (China)"),
    ("+91", "+91 (India)"),
    ("+65", "+65 (Singapore)"),
    ("+64", "+64 (New Zealand)"),
    ("+55", "+55 (Brazil)"),
    ("+52", "+52 (Mexico)"),
];

pub const DEFAULT_COUNTRY_CODE: &str = "+1";

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Phone number must contain digits")]
    InvalidPhoneFormat,
    #[error("Code must be exactly 6 digits")]
    InvalidOtpFormat,
    #[error("Failed to send code: {0}")]
    OtpSendFailed(#[source] AuthError),
    #[error("Invalid code: {0}")]
    InvalidOtp(#[source] ApiError),
    #[error("No code has been requested yet")]
    NotStarted,
    #[error("Account {0} is already configured")]
    AlreadyConfigured(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn non_digits() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^0-9]").expect("valid regex"))
}

fn otp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{6}$").expect("valid regex"))
}

/// Country code followed by the digits of `local`; punctuation and spaces are dropped.
pub fn normalize_phone(country_code: &str, local: &str) -> Result<String, LoginError> {
    let digits = non_digits().replace_all(local, "");
    if digits.is_empty() {
        return Err(LoginError::InvalidPhoneFormat);
    }
    Ok(format!("{}{digits}", country_code.trim()))
}

/// Trimmed code, provided it is exactly six digits.
pub fn validate_otp(code: &str) -> Result<String, LoginError> {
    let code = code.trim();
    if !otp_pattern().is_match(code) {
        return Err(LoginError::InvalidOtpFormat);
    }
    Ok(code.to_string())
}

fn last_four(phone_number: &str) -> &str {
    let start = phone_number
        .char_indices()
        .rev()
        .nth(3)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &phone_number[start..]
}

pub fn masked_phone(phone_number: &str) -> String {
    format!("***{}", last_four(phone_number))
}

/// Stable identifier for the entry created from `phone_number`.
pub fn unique_id(phone_number: &str) -> String {
    format!("livly_{}", last_four(phone_number))
}

pub fn entry_title(phone_number: &str) -> String {
    format!("Livly ({})", masked_phone(phone_number))
}

/// Rejects a login that would duplicate the stored entry.
pub fn ensure_not_configured(
    store: &dyn ConfigStore,
    phone_number: &str,
) -> Result<(), LoginError> {
    let wanted = unique_id(phone_number);
    match store.load()? {
        Some(existing) if unique_id(&existing.phone_number) == wanted => {
            Err(LoginError::AlreadyConfigured(entry_title(phone_number)))
        }
        _ => Ok(()),
    }
}

/// Two-step login: [`LoginFlow::start`] texts a code, [`LoginFlow::verify`] redeems it.
///
/// # Example
/// ```no_run
/// use livly::api::LivlyClient;
/// use livly::auth::LoginFlow;
///
/// # async fn example() -> Result<(), livly::auth::LoginError> {
/// let mut flow = LoginFlow::new(LivlyClient::new());
/// flow.start("+1", "(555) 123-4567").await?;
/// let entry = flow.verify("123456").await?;
/// assert_eq!(entry.phone_number, "+15551234567");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LoginFlow {
    client: LivlyClient,
    phone_number: Option<String>,
}

impl LoginFlow {
    pub fn new(client: LivlyClient) -> Self {
        Self {
            client,
            phone_number: None,
        }
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn client(&self) -> &LivlyClient {
        &self.client
    }

    /// Normalize the number and request a code for it.
    pub async fn start(&mut self, country_code: &str, local: &str) -> Result<(), LoginError> {
        let phone_number = normalize_phone(country_code, local)?;
        self.client
            .request_otp(&phone_number)
            .await
            .map_err(LoginError::OtpSendFailed)?;
        info!(phone = %masked_phone(&phone_number), "Login code sent");
        self.phone_number = Some(phone_number);
        Ok(())
    }

    /// Redeem the code, resolve the user id, and build the entry to persist.
    pub async fn verify(&mut self, otp_code: &str) -> Result<PersistedConfig, LoginError> {
        let phone_number = self.phone_number.clone().ok_or(LoginError::NotStarted)?;
        let otp_code = validate_otp(otp_code)?;

        self.client
            .verify_otp(&phone_number, &otp_code)
            .await
            .map_err(|err| {
                error!("OTP verification failed");
                LoginError::InvalidOtp(ApiError::Auth(err))
            })?;
        self.client
            .get_user_info()
            .await
            .map_err(LoginError::InvalidOtp)?;

        let credentials = self.client.credentials();
        info!(phone = %masked_phone(&phone_number), "Login complete");
        Ok(PersistedConfig {
            phone_number,
            access_token: credentials.access_token.clone(),
            refresh_token: credentials.refresh_token.clone(),
            id_token: credentials.id_token.clone(),
            token_expires_at: credentials.expires_at,
            user_id: credentials.user_id,
        })
    }
}
