//! Domain module - URL and host handling
//!
//! - Normalization of hosts/URLs to registrable domains (the per-site key)
//! - Detection of OAuth provider navigations

mod normalizer;
mod oauth;

pub use normalizer::DomainNormalizer;
pub use oauth::detect_oauth_provider;
