//! Bridge requests
//!
//! Messages arrive from the browser extension as loosely typed JSON objects.
//! [`BridgeRequest::from_value`] checks every required field once and turns
//! the object into a closed set of variants.

use serde_json::Value;
use thiserror::Error;

use crate::models::LoginMethod;
use crate::security::{Sanitizer, SanitizerError};
use crate::store::StoreError;

/// Keys that may carry the message kind, checked in order
pub const KIND_KEYS: [&str; 3] = ["name", "kind", "type"];

/// Protocol failures, reported to the caller as `{error: ...}`
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Invalid message: expected a JSON object")]
    NotAnObject,

    #[error("Invalid message: {0}")]
    Malformed(String),

    /// Missing, non-string or unrecognized kind tag
    #[error("Unknown message type")]
    UnknownKind,

    #[error("Missing site parameter")]
    MissingSite,

    #[error("Missing or invalid parameters")]
    MissingParameters,

    #[error("Invalid site: {0}")]
    InvalidSite(#[from] SanitizerError),

    #[error("Unknown login method: {0}")]
    InvalidMethod(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error")]
    Internal,
}

/// A validated bridge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeRequest {
    /// Look up the remembered method for `site`
    GetPreference { site: String },
    /// Remember that `method` was used on `site`
    RecordLogin { site: String, method: LoginMethod },
    GetSettings,
}

impl BridgeRequest {
    /// Parses a JSON message
    ///
    /// `site` values are validated here but not normalized; that is left to
    /// the dispatcher.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use whichlogin::bridge::BridgeRequest;
    /// use whichlogin::models::LoginMethod;
    ///
    /// let request = BridgeRequest::from_value(&json!({
    ///     "name": "recordLogin",
    ///     "site": "example.com",
    ///     "method": "google",
    /// }))
    /// .unwrap();
    ///
    /// assert_eq!(
    ///     request,
    ///     BridgeRequest::RecordLogin {
    ///         site: "example.com".into(),
    ///         method: LoginMethod::Google,
    ///     }
    /// );
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, BridgeError> {
        let object = value.as_object().ok_or(BridgeError::NotAnObject)?;

        let kind = KIND_KEYS
            .iter()
            .find_map(|key| object.get(*key))
            .and_then(Value::as_str)
            .ok_or(BridgeError::UnknownKind)?;

        match kind {
            "getPreference" => {
                let site = string_field(value, "site").ok_or(BridgeError::MissingSite)?;
                Sanitizer::validate_site(site)?;
                Ok(BridgeRequest::GetPreference {
                    site: site.to_string(),
                })
            }
            "recordLogin" => {
                let (site, method) = string_field(value, "site")
                    .zip(string_field(value, "method"))
                    .ok_or(BridgeError::MissingParameters)?;
                Sanitizer::validate_site(site)?;
                let method = method
                    .parse::<LoginMethod>()
                    .map_err(|_| BridgeError::InvalidMethod(method.to_string()))?;
                Ok(BridgeRequest::RecordLogin {
                    site: site.to_string(),
                    method,
                })
            }
            "getSettings" => Ok(BridgeRequest::GetSettings),
            _ => Err(BridgeError::UnknownKind),
        }
    }

    /// Parses a raw JSON message
    pub fn from_slice(data: &[u8]) -> Result<Self, BridgeError> {
        let value: Value =
            serde_json::from_slice(data).map_err(|e| BridgeError::Malformed(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeRequest::GetPreference { .. } => "getPreference",
            BridgeRequest::RecordLogin { .. } => "recordLogin",
            BridgeRequest::GetSettings => "getSettings",
        }
    }
}

fn string_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}
