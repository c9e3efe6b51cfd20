//! Login method tags
//!
//! The closed set of ways a user can sign in to a site. Wire and on-disk
//! form is the snake_case tag (`email_password`, `sms_otp`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a tag is not one of the known login methods
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown login method: {0}")]
pub struct UnknownMethod(pub String);

/// A way of signing in to a website
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginMethod {
    Apple,
    Google,
    Microsoft,
    #[serde(rename = "github")]
    GitHub,
    Facebook,
    #[serde(rename = "linkedin")]
    LinkedIn,
    EmailPassword,
    MagicLink,
    SmsOtp,
    Other,
}

impl LoginMethod {
    /// Every method, in display order
    pub const ALL: [LoginMethod; 10] = [
        LoginMethod::Apple,
        LoginMethod::Google,
        LoginMethod::Microsoft,
        LoginMethod::GitHub,
        LoginMethod::Facebook,
        LoginMethod::LinkedIn,
        LoginMethod::EmailPassword,
        LoginMethod::MagicLink,
        LoginMethod::SmsOtp,
        LoginMethod::Other,
    ];

    /// Returns the wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMethod::Apple => "apple",
            LoginMethod::Google => "google",
            LoginMethod::Microsoft => "microsoft",
            LoginMethod::GitHub => "github",
            LoginMethod::Facebook => "facebook",
            LoginMethod::LinkedIn => "linkedin",
            LoginMethod::EmailPassword => "email_password",
            LoginMethod::MagicLink => "magic_link",
            LoginMethod::SmsOtp => "sms_otp",
            LoginMethod::Other => "other",
        }
    }

    /// Returns the human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            LoginMethod::Apple => "Apple",
            LoginMethod::Google => "Google",
            LoginMethod::Microsoft => "Microsoft",
            LoginMethod::GitHub => "GitHub",
            LoginMethod::Facebook => "Facebook",
            LoginMethod::LinkedIn => "LinkedIn",
            LoginMethod::EmailPassword => "Email/Password",
            LoginMethod::MagicLink => "Magic Link",
            LoginMethod::SmsOtp => "SMS/OTP",
            LoginMethod::Other => "Other",
        }
    }
}

impl FromStr for LoginMethod {
    type Err = UnknownMethod;

    /// Parses a wire tag. Matching is exact: tags are lowercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_parse_back() {
        for method in LoginMethod::ALL {
            assert_eq!(method.as_str().parse::<LoginMethod>(), Ok(method));
        }
    }

    #[test]
    fn test_serde_uses_wire_tags() {
        for method in LoginMethod::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        assert_eq!(
            "not_a_real_method".parse::<LoginMethod>(),
            Err(UnknownMethod("not_a_real_method".to_string()))
        );
        assert!("Google".parse::<LoginMethod>().is_err());
        assert!("".parse::<LoginMethod>().is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(LoginMethod::EmailPassword.display_name(), "Email/Password");
        assert_eq!(LoginMethod::SmsOtp.display_name(), "SMS/OTP");
        assert_eq!(LoginMethod::GitHub.to_string(), "github");
    }
}
