//! Input validation and log redaction for site names
//!
//! Site names are browsing history. Anything arriving from the extension is
//! validated before use, and sites are redacted before they reach a log line.

use thiserror::Error;

/// Longest accepted `site` field, in bytes
pub const MAX_SITE_LEN: usize = 2048;

/// Errors that can occur during input validation
#[derive(Debug, Error, PartialEq)]
pub enum SanitizerError {
    /// Input contains control characters
    #[error("Invalid input: contains control characters")]
    InvalidInput,

    /// Input is empty when it shouldn't be
    #[error("Input cannot be empty")]
    EmptyInput,

    /// Input exceeds maximum allowed length
    #[error("Input exceeds maximum length of {0}")]
    TooLong(usize),
}

/// Sanitizer for site names
pub struct Sanitizer;

impl Sanitizer {
    /// Validates a raw `site` value received over the bridge
    ///
    /// # Examples
    ///
    /// ```
    /// use whichlogin::security::Sanitizer;
    ///
    /// assert!(Sanitizer::validate_site("https://example.com/login").is_ok());
    /// assert!(Sanitizer::validate_site("   ").is_err());
    /// assert!(Sanitizer::validate_site("exa\u{0}mple.com").is_err());
    /// ```
    pub fn validate_site(input: &str) -> Result<(), SanitizerError> {
        if input.len() > MAX_SITE_LEN {
            return Err(SanitizerError::TooLong(MAX_SITE_LEN));
        }
        if input.trim().is_empty() {
            return Err(SanitizerError::EmptyInput);
        }
        if input.chars().any(char::is_control) {
            return Err(SanitizerError::InvalidInput);
        }
        Ok(())
    }

    /// Redacts a normalized site for safe logging
    ///
    /// Keeps the first two characters of the leftmost label and everything
    /// from the first dot onward.
    ///
    /// # Examples
    ///
    /// ```
    /// use whichlogin::security::Sanitizer;
    ///
    /// assert_eq!(Sanitizer::redact_site("example.com"), "ex***.com");
    /// assert_eq!(Sanitizer::redact_site("bbc.co.uk"), "bb***.co.uk");
    /// assert_eq!(Sanitizer::redact_site("localhost"), "***");
    /// ```
    pub fn redact_site(site: &str) -> String {
        match site.find('.') {
            Some(dot) if dot > 0 => {
                let (label, rest) = site.split_at(dot);
                let visible: String = label.chars().take(2).collect();
                format!("{}***{}", visible, rest)
            }
            _ => "***".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_site_normal() {
        assert!(Sanitizer::validate_site("example.com").is_ok());
        assert!(Sanitizer::validate_site("https://app.notion.so/path?x=1").is_ok());
        assert!(Sanitizer::validate_site("localhost:3000").is_ok());
    }

    #[test]
    fn test_validate_site_empty() {
        assert_eq!(Sanitizer::validate_site(""), Err(SanitizerError::EmptyInput));
        assert_eq!(Sanitizer::validate_site(" \t "), Err(SanitizerError::EmptyInput));
        assert_eq!(Sanitizer::validate_site("   "), Err(SanitizerError::EmptyInput));
    }

    #[test]
    fn test_validate_site_control_chars() {
        assert_eq!(
            Sanitizer::validate_site("hello\0world"),
            Err(SanitizerError::InvalidInput)
        );
        assert_eq!(
            Sanitizer::validate_site("example.com\n"),
            Err(SanitizerError::InvalidInput)
        );
    }

    #[test]
    fn test_validate_site_too_long() {
        let long = "a".repeat(MAX_SITE_LEN + 1);
        assert_eq!(
            Sanitizer::validate_site(&long),
            Err(SanitizerError::TooLong(MAX_SITE_LEN))
        );
        assert!(Sanitizer::validate_site(&"a".repeat(MAX_SITE_LEN)).is_ok());
    }

    #[test]
    fn test_redact_site() {
        assert_eq!(Sanitizer::redact_site("example.com"), "ex***.com");
        assert_eq!(Sanitizer::redact_site("x.io"), "x***.io");
        assert_eq!(Sanitizer::redact_site("localhost"), "***");
        assert_eq!(Sanitizer::redact_site(".com"), "***");
        assert_eq!(Sanitizer::redact_site(""), "***");
    }

    #[test]
    fn test_redact_site_multibyte() {
        assert_eq!(Sanitizer::redact_site("ñandú.es"), "ña***.es");
    }
}
