//! WsTransport - WebSocket transport using tokio-tungstenite.
//!
//! Each envelope travels as one text frame. A background reader task pulls
//! frames off the socket and hands them to `recv()` through a channel, so
//! `close()` can interrupt a pending `recv()` by stopping the reader.

use super::{Transport, TransportError, MAX_MESSAGE_SIZE};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Frame = Result<Vec<u8>, TransportError>;

/// Frames buffered between the reader task and `recv()`.
const INBOUND_BUFFER: usize = 64;

/// Configuration for WsTransport.
#[derive(Clone, Debug)]
pub struct WsTransportConfig {
    /// Connection (TCP + TLS + upgrade) timeout.
    pub connect_timeout: Duration,
    /// Largest envelope accepted in either direction.
    pub max_message_size: usize,
}

impl Default for WsTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

/// WsTransport implements the Transport trait over a WebSocket connection.
///
/// # Example
///
/// ```ignore
/// let transport = WsTransport::new();
/// transport.connect("ws://localhost:3000/ws").await?;
/// transport.send(br#"{"action":"getRoomList"}"#).await?;
/// let response = transport.recv().await?;
/// ```
#[derive(Default)]
pub struct WsTransport {
    config: WsTransportConfig,
    connected: Arc<AtomicBool>,
    sink: Mutex<Option<SplitSink<Socket, Message>>>,
    inbound: Mutex<Option<mpsc::Receiver<Frame>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl WsTransport {
    /// Create a new WsTransport with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new WsTransport with custom configuration.
    pub fn with_config(config: WsTransportConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    fn check_address(address: &str) -> Result<(), TransportError> {
        if address.starts_with("ws://") || address.starts_with("wss://") {
            Ok(())
        } else {
            Err(TransportError::InvalidAddress(format!(
                "expected ws:// or wss:// URL, got {address:?}"
            )))
        }
    }

    fn spawn_reader(&self, mut stream: SplitStream<Socket>, tx: mpsc::Sender<Frame>) -> JoinHandle<()> {
        let connected = Arc::clone(&self.connected);
        let max = self.config.max_message_size;
        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let item = match frame {
                    Ok(Message::Text(text)) => Ok(text.as_str().as_bytes().to_vec()),
                    Ok(Message::Binary(data)) => Ok(data.to_vec()),
                    Ok(Message::Close(_)) => break,
                    // Ping/pong are answered by tungstenite itself
                    Ok(_) => continue,
                    Err(e) => Err(TransportError::ReceiveFailed(e.to_string())),
                };
                let item = match item {
                    Ok(data) if data.len() > max => {
                        tracing::warn!(size = data.len(), max, "dropping oversized frame");
                        continue;
                    }
                    other => other,
                };
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
            connected.store(false, Ordering::SeqCst);
        })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, address: &str) -> Result<(), TransportError> {
        Self::check_address(address)?;

        // Close existing connection if any
        self.close().await.ok();

        let (socket, _response) =
            tokio::time::timeout(self.config.connect_timeout, tokio_tungstenite::connect_async(address))
                .await
                .map_err(|_| TransportError::Timeout)?
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let (sink, stream) = socket.split();
        let (tx, rx) = mpsc::channel(INBOUND_BUFFER);

        *self.sink.lock().await = Some(sink);
        *self.inbound.lock().await = Some(rx);
        self.connected.store(true, Ordering::SeqCst);
        *self.reader.lock().await = Some(self.spawn_reader(stream, tx));

        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        // Validate message size
        if data.len() > self.config.max_message_size {
            return Err(TransportError::SendFailed(format!(
                "message too large: {} > {}",
                data.len(),
                self.config.max_message_size
            )));
        }

        let message = match std::str::from_utf8(data) {
            Ok(text) => Message::Text(text.to_owned().into()),
            Err(_) => Message::Binary(data.to_vec().into()),
        };

        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(TransportError::NotConnected)?;
        sink.send(message)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        let mut guard = self.inbound.lock().await;
        let rx = guard.as_mut().ok_or(TransportError::NotConnected)?;
        match rx.recv().await {
            Some(frame) => frame,
            None => Err(TransportError::ConnectionClosed),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::SeqCst);

        // Stopping the reader drops its sender, which wakes any pending recv()
        if let Some(reader) = self.reader.lock().await.take() {
            reader.abort();
        }

        if let Some(mut sink) = self.sink.lock().await.take() {
            if let Err(e) = sink.send(Message::Close(None)).await {
                tracing::debug!("close frame not delivered: {}", e);
            }
            sink.close().await.ok();
        }

        Ok(())
    }
}
