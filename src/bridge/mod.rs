//! Bridge module - Request/response protocol for the browser extension
//!
//! - [`BridgeRequest`]: closed set of validated requests
//! - [`BridgeResponse`]: the JSON shapes sent back
//! - [`MessageBridge`]: dispatch onto the preference store
//! - [`NativeHost`]: length-prefixed stdio transport

mod dispatcher;
mod native_host;
mod request;
mod response;

pub use dispatcher::MessageBridge;
pub use native_host::{NativeHost, NativeHostError, MAX_MESSAGE_LEN};
pub use request::{BridgeError, BridgeRequest, KIND_KEYS};
pub use response::BridgeResponse;
