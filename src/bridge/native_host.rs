//! Browser native-messaging transport
//!
//! The browser starts the host as a child process and talks to it over
//! stdin/stdout. Each message is a 32-bit length in native byte order
//! followed by that many bytes of UTF-8 JSON. Messages are handled one at a
//! time, in order.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::dispatcher::MessageBridge;

/// Largest message accepted or sent, in bytes
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Errors that end a native-messaging session
#[derive(Debug, Error)]
pub enum NativeHostError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Message of {0} bytes exceeds the 1 MiB limit")]
    FrameTooLarge(usize),

    /// The stream closed partway through a message
    #[error("Stream ended mid-message")]
    UnexpectedEof,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Serves a [`MessageBridge`] over a length-prefixed byte stream
pub struct NativeHost<R, W> {
    reader: R,
    writer: W,
    bridge: Arc<MessageBridge>,
}

impl<R, W> NativeHost<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, bridge: Arc<MessageBridge>) -> Self {
        Self {
            reader,
            writer,
            bridge,
        }
    }

    /// Reads one message
    ///
    /// Returns `None` on a clean end of stream between messages.
    pub async fn read_frame(&mut self) -> Result<Option<Vec<u8>>, NativeHostError> {
        let mut header = [0u8; 4];
        let mut filled = 0;
        while filled < header.len() {
            let n = self.reader.read(&mut header[filled..]).await?;
            if n == 0 {
                return if filled == 0 {
                    Ok(None)
                } else {
                    Err(NativeHostError::UnexpectedEof)
                };
            }
            filled += n;
        }

        let len = u32::from_ne_bytes(header) as usize;
        if len > MAX_MESSAGE_LEN {
            return Err(NativeHostError::FrameTooLarge(len));
        }

        let mut payload = vec![0u8; len];
        self.reader
            .read_exact(&mut payload)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => NativeHostError::UnexpectedEof,
                _ => NativeHostError::Io(e),
            })?;
        Ok(Some(payload))
    }

    /// Writes one message and flushes
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<(), NativeHostError> {
        if payload.len() > MAX_MESSAGE_LEN {
            return Err(NativeHostError::FrameTooLarge(payload.len()));
        }

        let len = payload.len() as u32;
        self.writer.write_all(&len.to_ne_bytes()).await?;
        self.writer.write_all(payload).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Answers messages until the stream ends
    ///
    /// Malformed messages get an error response and the loop continues.
    /// Returns the number of messages handled.
    pub async fn serve(&mut self) -> Result<usize, NativeHostError> {
        let mut handled = 0;

        while let Some(frame) = self.read_frame().await? {
            let response = self.bridge.dispatch_slice(&frame);
            let encoded = serde_json::to_vec(&response)?;
            self.write_frame(&encoded).await?;
            handled += 1;
        }

        tracing::info!("Native messaging stream closed after {} messages", handled);
        Ok(handled)
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::security::{BlobCodec, MemoryKeyStore};
    use crate::store::PreferenceStore;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn bridge(dir: &TempDir) -> Arc<MessageBridge> {
        let codec = Arc::new(BlobCodec::new(Arc::new(MemoryKeyStore::new())));
        let store = PreferenceStore::open(&AppConfig::with_data_dir(dir.path()), codec).unwrap();
        Arc::new(MessageBridge::new(Arc::new(store)))
    }

    fn frame(message: &Value) -> Vec<u8> {
        let payload = serde_json::to_vec(message).unwrap();
        let mut out = (payload.len() as u32).to_ne_bytes().to_vec();
        out.extend_from_slice(&payload);
        out
    }

    fn parse_frames(mut data: &[u8]) -> Vec<Value> {
        let mut out = Vec::new();
        while !data.is_empty() {
            let len = u32::from_ne_bytes(data[..4].try_into().unwrap()) as usize;
            out.push(serde_json::from_slice(&data[4..4 + len]).unwrap());
            data = &data[4 + len..];
        }
        out
    }

    #[tokio::test]
    async fn test_serve_until_eof() {
        let dir = TempDir::new().unwrap();
        let mut input = frame(&json!({"name": "recordLogin", "site": "github.com", "method": "github"}));
        input.extend(frame(&json!({"name": "getPreference", "site": "gist.github.com"})));
        input.extend(frame(&json!({"name": "getSettings"})));

        let mut host = NativeHost::new(&input[..], Vec::new(), bridge(&dir));
        assert_eq!(host.serve().await.unwrap(), 3);

        let (_, output) = host.into_parts();
        let responses = parse_frames(&output);
        assert_eq!(responses[0], json!({"success": true}));
        assert_eq!(responses[1]["found"], true);
        assert_eq!(responses[1]["method"], "github");
        assert_eq!(responses[2]["hintTimeoutMs"], 6000);
    }

    #[tokio::test]
    async fn test_malformed_json_keeps_serving() {
        let dir = TempDir::new().unwrap();
        let mut input = 5u32.to_ne_bytes().to_vec();
        input.extend_from_slice(b"{bad!");
        input.extend(frame(&json!({"name": "getSettings"})));

        let mut host = NativeHost::new(&input[..], Vec::new(), bridge(&dir));
        assert_eq!(host.serve().await.unwrap(), 2);

        let (_, output) = host.into_parts();
        let responses = parse_frames(&output);
        assert!(responses[0]["error"].is_string());
        assert_eq!(responses[1]["showHint"], true);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let dir = TempDir::new().unwrap();
        let input = ((MAX_MESSAGE_LEN + 1) as u32).to_ne_bytes().to_vec();

        let mut host = NativeHost::new(&input[..], Vec::new(), bridge(&dir));
        assert!(matches!(
            host.serve().await,
            Err(NativeHostError::FrameTooLarge(len)) if len == MAX_MESSAGE_LEN + 1
        ));
    }

    #[tokio::test]
    async fn test_truncated_stream() {
        let dir = TempDir::new().unwrap();

        let header_only = [1u8, 0];
        let mut host = NativeHost::new(&header_only[..], Vec::new(), bridge(&dir));
        assert!(matches!(host.read_frame().await, Err(NativeHostError::UnexpectedEof)));

        let mut short_body = 10u32.to_ne_bytes().to_vec();
        short_body.extend_from_slice(b"{}");
        let mut host = NativeHost::new(&short_body[..], Vec::new(), bridge(&dir));
        assert!(matches!(host.read_frame().await, Err(NativeHostError::UnexpectedEof)));
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let dir = TempDir::new().unwrap();
        let mut host = NativeHost::new(&b""[..], Vec::new(), bridge(&dir));
        assert_eq!(host.serve().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplex_round_trip() {
        let dir = TempDir::new().unwrap();
        let (mut client, server) = tokio::io::duplex(4096);
        let (server_read, server_write) = tokio::io::split(server);
        let mut host = NativeHost::new(server_read, server_write, bridge(&dir));

        let serving = tokio::spawn(async move { host.serve().await });

        client
            .write_all(&frame(&json!({"kind": "getPreference", "site": "example.com"})))
            .await
            .unwrap();

        let mut header = [0u8; 4];
        client.read_exact(&mut header).await.unwrap();
        let mut payload = vec![0u8; u32::from_ne_bytes(header) as usize];
        client.read_exact(&mut payload).await.unwrap();
        let response: Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(response, json!({"found": false}));

        drop(client);
        assert_eq!(serving.await.unwrap().unwrap(), 1);
    }
}
