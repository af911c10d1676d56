//! Transport abstraction for roomsync.
//!
//! This module provides a pluggable transport layer that abstracts
//! the underlying connection mechanism (WebSocket, mock for testing).
//!
//! # Design
//!
//! The transport trait is async and connection-oriented:
//! - `connect()` establishes a connection
//! - `send()` transmits one encoded envelope
//! - `recv()` receives one encoded envelope
//! - `close()` terminates the connection
//!
//! A transport knows nothing about rooms. Connection reuse, generations and
//! the silent-drop policy for sends all live in [`crate::RoomClient`].
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.connect("ws://localhost:3000/ws").await?;
//! transport.send(br#"{"action":"getRoomList"}"#).await?;
//! let response = transport.recv().await?;
//! ```

mod mock;
mod websocket;

pub use mock::MockTransport;
pub use websocket::{WsTransport, WsTransportConfig};

use async_trait::async_trait;
use thiserror::Error;

/// Maximum encoded envelope size accepted in either direction (1 MiB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The address could not be used.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Connection timeout.
    #[error("connection timeout")]
    Timeout,
}

/// Transport trait for sending and receiving roomsync envelopes.
///
/// Implementations handle the underlying connection mechanism
/// (WebSocket, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the server at the given address.
    ///
    /// For WebSocket this is a `ws://` or `wss://` URL. For testing, it's
    /// arbitrary.
    async fn connect(&self, address: &str) -> Result<(), TransportError>;

    /// Send one encoded envelope.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receive one encoded envelope.
    ///
    /// Waits until data is available or the connection closes.
    async fn recv(&self) -> Result<Vec<u8>, TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection and forget it, so the next `connect` starts fresh.
    async fn close(&self) -> Result<(), TransportError>;
}
