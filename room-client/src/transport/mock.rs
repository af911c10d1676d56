//! Mock transport for testing.
//!
//! Allows queueing server messages and capturing sent envelopes for
//! verification.

use super::{Transport, TransportError};
use async_trait::async_trait;
use roomsync_types::{Inbound, Outbound};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock transport for testing.
///
/// Clones share state, so a test can keep one handle while the client owns
/// another. An empty receive queue behaves like the server closing the
/// connection.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    connected_address: Option<String>,
    connect_count: usize,
    close_count: usize,
    sent_messages: Vec<Vec<u8>>,
    receive_queue: VecDeque<Vec<u8>>,
    fail_next_connect: Option<String>,
    fail_next_send: Option<String>,
    fail_next_recv: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw bytes to be returned by the next `recv()` call.
    pub fn queue_response(&self, data: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap();
        inner.receive_queue.push_back(data);
    }

    /// Queue an encoded server message.
    ///
    /// # Panics
    ///
    /// Panics if `message` is [`Inbound::Unrecognized`], which has no encoding.
    pub fn queue_inbound(&self, message: &Inbound) {
        let bytes = message
            .to_bytes()
            .expect("test fixture must be encodable");
        self.queue_response(bytes);
    }

    /// Get all raw messages that were sent.
    pub fn sent_messages(&self) -> Vec<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.sent_messages.clone()
    }

    /// Decode every sent message, skipping any that are not valid requests.
    pub fn sent_outbound(&self) -> Vec<Outbound> {
        self.sent_messages()
            .iter()
            .filter_map(|bytes| Outbound::from_bytes(bytes).ok())
            .collect()
    }

    /// Get the last message that was sent.
    pub fn last_sent(&self) -> Option<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.sent_messages.last().cloned()
    }

    /// Get the address that was connected to.
    pub fn connected_address(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.connected_address.clone()
    }

    /// How many times `connect()` succeeded.
    pub fn connect_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.connect_count
    }

    /// How many times `close()` was called.
    pub fn close_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.close_count
    }

    /// Simulate the server dropping the connection.
    pub fn drop_connection(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
    }

    /// Cause the next connect() to fail with the given error.
    pub fn fail_next_connect(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_connect = Some(error.to_string());
    }

    /// Cause the next send() to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_send = Some(error.to_string());
    }

    /// Cause the next recv() to fail with the given error.
    pub fn fail_next_recv(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_recv = Some(error.to_string());
    }

    /// Clear all state (messages, queue, connection, counters).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, address: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        // Check for forced failure
        if let Some(error) = inner.fail_next_connect.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        inner.connected = true;
        inner.connect_count += 1;
        inner.connected_address = Some(address.to_string());
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        // Check for forced failure
        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.sent_messages.push(data.to_vec());
        Ok(())
    }

    async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::ConnectionClosed);
        }

        // Check for forced failure
        if let Some(error) = inner.fail_next_recv.take() {
            return Err(TransportError::ReceiveFailed(error));
        }

        inner
            .receive_queue
            .pop_front()
            .ok_or(TransportError::ConnectionClosed)
    }

    fn is_connected(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
        inner.close_count += 1;
        Ok(())
    }
}
