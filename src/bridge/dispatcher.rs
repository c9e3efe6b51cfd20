//! Request dispatch
//!
//! [`MessageBridge`] is the only entry point the browser extension reaches.
//! It holds no per-caller state: one message in, one response out. Every
//! failure, including a panic in a handler, comes back as an error response.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

use super::request::{BridgeError, BridgeRequest};
use super::response::BridgeResponse;
use crate::domain::DomainNormalizer;
use crate::security::{Sanitizer, SanitizerError};
use crate::store::PreferenceStore;

/// Translates bridge messages into store operations
pub struct MessageBridge {
    store: Arc<PreferenceStore>,
}

impl MessageBridge {
    pub fn new(store: Arc<PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<PreferenceStore> {
        &self.store
    }

    /// Handles one JSON message
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use serde_json::json;
    /// use whichlogin::bridge::MessageBridge;
    /// # fn demo(bridge: &MessageBridge) {
    /// let response = bridge.dispatch(&json!({"name": "getSettings"}));
    /// assert!(!response.is_error());
    /// # }
    /// ```
    pub fn dispatch(&self, message: &Value) -> BridgeResponse {
        self.guarded(|| BridgeRequest::from_value(message).and_then(|req| self.handle(req)))
    }

    /// Handles one raw JSON message
    pub fn dispatch_slice(&self, data: &[u8]) -> BridgeResponse {
        self.guarded(|| BridgeRequest::from_slice(data).and_then(|req| self.handle(req)))
    }

    /// Executes an already validated request
    pub fn handle(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        tracing::debug!("Handling {} request", request.kind());

        match request {
            BridgeRequest::GetPreference { site } => {
                let site = normalize_site(&site)?;
                Ok(match self.store.get(&site) {
                    Some(pref) => BridgeResponse::preference(&pref),
                    None => BridgeResponse::not_found(),
                })
            }
            BridgeRequest::RecordLogin { site, method } => {
                let site = normalize_site(&site)?;
                self.store.record_login(&site, method)?;
                Ok(BridgeResponse::success())
            }
            BridgeRequest::GetSettings => Ok(BridgeResponse::settings(&self.store.settings())),
        }
    }

    fn guarded<F>(&self, f: F) -> BridgeResponse
    where
        F: FnOnce() -> Result<BridgeResponse, BridgeError>,
    {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!("Rejected bridge request: {}", e);
                BridgeResponse::error(e.to_string())
            }
            Err(_) => {
                tracing::error!("Bridge handler panicked");
                BridgeResponse::error(BridgeError::Internal.to_string())
            }
        }
    }
}

fn normalize_site(raw: &str) -> Result<String, BridgeError> {
    let site = DomainNormalizer::normalize(raw);
    if site.is_empty() {
        return Err(BridgeError::InvalidSite(SanitizerError::EmptyInput));
    }
    tracing::trace!("Normalized site to {}", Sanitizer::redact_site(&site));
    Ok(site)
}
