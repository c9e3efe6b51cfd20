//! Registrable-domain normalization
//!
//! Collapses hosts and URLs to an eTLD+1-style key so that every subdomain of
//! a site shares a single preference entry (`app.notion.so` -> `notion.so`).
//!
//! The suffix table is a static approximation of the Public Suffix List.
//! Hosts under a suffix that is not in the table fall back to their last two
//! labels, which misclassifies some ccTLD registrations. That behavior is
//! relied on by stored data and must stay stable.

use std::collections::HashSet;
use std::sync::OnceLock;

/// Known public suffixes
const PUBLIC_SUFFIXES: &[&str] = &[
    "com", "org", "net", "edu", "gov", "mil", "int",
    "co.uk", "org.uk", "ac.uk", "gov.uk",
    "com.au", "org.au", "net.au", "edu.au",
    "co.nz", "org.nz", "net.nz",
    "co.za", "org.za", "net.za",
    "com.br", "org.br", "net.br",
    "co.jp", "or.jp", "ne.jp", "ac.jp",
    "co.in", "org.in", "net.in", "ac.in",
    "com.cn", "org.cn", "net.cn", "edu.cn",
    "de", "fr", "it", "es", "nl", "be", "ch", "at",
    "se", "no", "dk", "fi", "pl", "cz", "ru",
    "ca", "mx", "ar", "cl", "co", "pe",
    "io", "ai", "app", "dev", "page", "so",
];

fn suffix_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| PUBLIC_SUFFIXES.iter().copied().collect())
}

/// Maps raw hosts and URLs to canonical registrable domains
///
/// Stateless; all methods are associated functions.
///
/// # Examples
///
/// ```
/// use whichlogin::domain::DomainNormalizer;
///
/// assert_eq!(DomainNormalizer::normalize("https://app.notion.so/path?x=1"), "notion.so");
/// assert_eq!(DomainNormalizer::normalize("www.bbc.co.uk"), "bbc.co.uk");
/// assert_eq!(DomainNormalizer::normalize("localhost:3000"), "localhost");
/// ```
pub struct DomainNormalizer;

impl DomainNormalizer {
    /// Normalizes a host or URL to its registrable domain
    ///
    /// Total and deterministic: any input produces some output, and
    /// normalizing an already-normalized value returns it unchanged.
    pub fn normalize(input: &str) -> String {
        let host = Self::clean_host(input);
        if Self::ipv6_literal(&host).is_some() {
            return host;
        }

        let labels: Vec<&str> = host.split('.').filter(|l| !l.trim().is_empty()).collect();
        if labels.len() < 2 {
            return host;
        }

        // Longest tail first; a match at i == 0 means the whole host is a
        // suffix, which keeps scanning and ends in the two-label fallback.
        for i in 0..labels.len() {
            let candidate = labels[i..].join(".");
            if i > 0 && Self::is_public_suffix(&candidate) {
                return Self::join(&labels[i - 1..]);
            }
        }

        Self::join(&labels[labels.len() - 2..])
    }

    /// Returns true if `suffix` is in the static suffix table
    pub fn is_public_suffix(suffix: &str) -> bool {
        suffix_set().contains(suffix)
    }

    fn join(labels: &[&str]) -> String {
        labels.join(".").trim().to_string()
    }

    /// Lowercases and strips scheme, path and port
    fn clean_host(input: &str) -> String {
        let mut host = input.trim().to_lowercase();

        if let Some(pos) = host.find("://") {
            host.drain(..pos + 3);
        }
        if let Some(pos) = host.find('/') {
            host.truncate(pos);
        }
        if let Some(literal) = Self::ipv6_literal(host.trim()) {
            return literal.to_string();
        }

        // Port stripping repeats until no colon is left, so `a:b:443`
        // cannot normalize to something that normalizes differently.
        while let Some(pos) = host.rfind(':') {
            host.truncate(pos);
        }

        host.trim().to_string()
    }

    /// Returns the `[addr]` prefix of `[addr]` or `[addr]:port`
    fn ipv6_literal(host: &str) -> Option<&str> {
        let end = host.strip_prefix('[')?.find(']')? + 1;
        let (literal, rest) = host.split_at(end + 1);
        let addr = &literal[1..end];

        let is_addr = addr.contains(':')
            && addr
                .chars()
                .all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.');
        (is_addr && (rest.is_empty() || rest.starts_with(':'))).then_some(literal)
    }
}
