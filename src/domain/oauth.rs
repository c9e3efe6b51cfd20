//! OAuth provider detection
//!
//! Recognises top-level navigations to the authorization endpoints of the
//! identity providers in [`LoginMethod`], so a pending sign-in can be
//! attributed to the right provider once the browser returns to the site.

use crate::models::LoginMethod;

/// Provider authorization endpoints, matched against `host + path`
///
/// Each entry is (provider, required host suffix, required path fragment).
const AUTH_ENDPOINTS: &[(LoginMethod, &str, &str)] = &[
    (LoginMethod::Apple, "appleid.apple.com", "/auth"),
    (LoginMethod::Google, "accounts.google.com", "/o/oauth2"),
    (LoginMethod::Microsoft, "login.microsoftonline.com", ""),
    (LoginMethod::GitHub, "github.com", "/login/oauth"),
    (LoginMethod::Facebook, "facebook.com", "oauth"),
    (LoginMethod::LinkedIn, "linkedin.com", "/oauth"),
];

/// Returns the identity provider whose authorization flow `url` belongs to
///
/// # Examples
///
/// ```
/// use whichlogin::domain::detect_oauth_provider;
/// use whichlogin::models::LoginMethod;
///
/// assert_eq!(
///     detect_oauth_provider("https://accounts.google.com/o/oauth2/v2/auth?client_id=x"),
///     Some(LoginMethod::Google)
/// );
/// assert_eq!(detect_oauth_provider("https://example.com/login"), None);
/// ```
pub fn detect_oauth_provider(url: &str) -> Option<LoginMethod> {
    let lower = url.trim().to_lowercase();
    let rest = match lower.find("://") {
        Some(pos) => &lower[pos + 3..],
        None => lower.as_str(),
    };

    let (authority, path) = match rest.find('/') {
        Some(pos) => rest.split_at(pos),
        None => (rest, ""),
    };
    let host = authority
        .rsplit('@')
        .next()
        .unwrap_or(authority)
        .split(':')
        .next()
        .unwrap_or_default();

    AUTH_ENDPOINTS
        .iter()
        .find(|(_, suffix, fragment)| host_matches(host, suffix) && path.contains(fragment))
        .map(|(method, _, _)| *method)
}

/// True if `host` is `suffix` or a subdomain of it
fn host_matches(host: &str, suffix: &str) -> bool {
    host == suffix
        || host
            .strip_suffix(suffix)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
