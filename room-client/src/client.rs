//! RoomClient - the main interface for roomsync.
//!
//! This module provides [`RoomClient`], the primary API for applications that
//! want to browse rooms, enter one, and chat in it.
//!
//! # Architecture
//!
//! RoomClient uses the pure state machines from room-core for protocol logic
//! and performs the actual I/O via the Transport trait.
//!
//! ```text
//! Application → RoomClient → Transport → Network
//!                   ↓
//!              room-core (session store + dispatcher)
//! ```
//!
//! Inbound messages are applied one at a time by [`RoomClient::run`], in
//! arrival order, under a single session lock. Collaborators observe the
//! session through [`RoomClient::subscribe`] and connection changes through
//! [`RoomClient::subscribe_events`].
//!
//! # Example
//!
//! ```ignore
//! use roomsync_client::{ClientConfig, RoomClient, WsTransport};
//!
//! let client = Arc::new(RoomClient::new(ClientConfig::default(), WsTransport::new()));
//! client.connect().await?;
//! tokio::spawn({
//!     let client = Arc::clone(&client);
//!     async move { client.run().await }
//! });
//! client.refresh_room_list().await?;
//! client.create_room("alice", None).await?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use roomsync_core::{
    apply_inbound, plan_intent, ConnectionAction, ConnectionEvent, ConnectionState, Generation,
    Intent, Session,
};
use roomsync_types::{CodecError, Inbound, Outbound};
use thiserror::Error;
use tokio::sync::{broadcast, watch, Mutex};

use crate::transport::{Transport, TransportError};

/// Capacity of the connection event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Encoding error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Not connected to the server.
    #[error("not connected")]
    NotConnected,

    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

/// Configuration for RoomClient.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address, e.g. `ws://localhost:3000/ws`.
    pub server_url: String,
    /// How long `connect` waits before giving up.
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration for the given server.
    pub fn new(server_url: &str) -> Self {
        Self {
            server_url: server_url.to_string(),
            ..Self::default()
        }
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:3000/ws".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Connection-level notifications for collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The connection is open (fires again when `connect` reuses it).
    Opened,
    /// The connection closed, voluntarily or not.
    Closed {
        /// Reason for the closure.
        reason: String,
    },
    /// A connect or send failed.
    Errored(String),
    /// The session changed; read it via `snapshot()` or `subscribe()`.
    SessionChanged,
}

/// The main room client.
///
/// Owns one logical connection and the session state mirrored from it.
pub struct RoomClient<T: Transport> {
    config: ClientConfig,
    transport: T,
    connection: Mutex<ConnectionState>,
    generation: AtomicU64,
    session: Mutex<Session>,
    snapshots: watch::Sender<Session>,
    events: broadcast::Sender<ClientEvent>,
}

impl<T: Transport> RoomClient<T> {
    /// Create a new RoomClient with an empty session.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let (snapshots, _) = watch::channel(Session::new());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            transport,
            connection: Mutex::new(ConnectionState::new()),
            generation: AtomicU64::new(0),
            session: Mutex::new(Session::new()),
            snapshots,
            events,
        }
    }

    // ===========================================
    // Connection lifecycle
    // ===========================================

    /// Connect to the configured server.
    ///
    /// Idempotent: if a connection is already open it is reused and
    /// [`ClientEvent::Opened`] fires again.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let mut connection = self.connection.lock().await;
        let (state, mut actions) = connection.clone().on_event(ConnectionEvent::ConnectRequested);
        *connection = state;

        let mut failure = None;
        if actions.contains(&ConnectionAction::Connect) {
            let event = match self.connect_transport().await {
                Ok(()) => ConnectionEvent::ConnectSucceeded {
                    generation: self.next_generation(),
                },
                Err(e) => {
                    let error = e.to_string();
                    failure = Some(e);
                    ConnectionEvent::ConnectFailed { error }
                }
            };
            let (state, follow_up) = connection.clone().on_event(event);
            *connection = state;
            actions = follow_up;
        }
        drop(connection);

        self.perform(actions).await?;
        match failure {
            Some(e) => Err(ClientError::ConnectionFailed(e.to_string())),
            None => Ok(()),
        }
    }

    async fn connect_transport(&self) -> Result<(), TransportError> {
        tracing::debug!(url = %self.config.server_url, "connecting");
        tokio::time::timeout(
            self.config.connect_timeout,
            self.transport.connect(&self.config.server_url),
        )
        .await
        .map_err(|_| TransportError::Timeout)?
    }

    fn next_generation(&self) -> Generation {
        Generation::new(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Check if connected.
    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_open()
    }

    /// Close the connection.
    ///
    /// Anything still arriving on the old connection is discarded. A later
    /// `connect` opens a fresh one.
    pub async fn close(&self) -> Result<(), ClientError> {
        let actions = {
            let mut connection = self.connection.lock().await;
            let (state, actions) = connection.clone().on_event(ConnectionEvent::CloseRequested);
            *connection = state;
            actions
        };
        self.perform(actions).await
    }

    async fn perform(&self, actions: Vec<ConnectionAction>) -> Result<(), ClientError> {
        for action in actions {
            match action {
                // Handled inline by connect()
                ConnectionAction::Connect => {}
                ConnectionAction::Disconnect => self.transport.close().await?,
                ConnectionAction::EmitOpened => {
                    tracing::info!(url = %self.config.server_url, "connection open");
                    self.emit(ClientEvent::Opened);
                }
                ConnectionAction::EmitClosed { reason } => {
                    tracing::info!(%reason, "connection closed");
                    self.emit(ClientEvent::Closed { reason });
                }
                ConnectionAction::EmitFailed { error } => {
                    tracing::warn!(%error, "connection failed");
                    self.emit(ClientEvent::Errored(error));
                }
            }
        }
        Ok(())
    }

    fn emit(&self, event: ClientEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ===========================================
    // Inbound dispatch
    // ===========================================

    /// Process inbound messages until the connection ends.
    ///
    /// Returns `Ok(())` when the connection closes (either side) and
    /// `Err(ClientError::NotConnected)` if called while not connected.
    pub async fn run(&self) -> Result<(), ClientError> {
        let generation = self
            .connection
            .lock()
            .await
            .generation()
            .ok_or(ClientError::NotConnected)?;

        loop {
            match self.transport.recv().await {
                Ok(bytes) => {
                    if !self.handle_frame(generation, &bytes).await {
                        tracing::debug!(%generation, "connection replaced, stopping receive loop");
                        return Ok(());
                    }
                }
                Err(e) => {
                    self.connection_lost(generation, e).await;
                    return Ok(());
                }
            }
        }
    }

    /// Decode and apply one frame received on connection `generation`.
    ///
    /// Returns `false` if that connection is no longer the current one, in
    /// which case the frame is discarded.
    pub(crate) async fn handle_frame(&self, generation: Generation, bytes: &[u8]) -> bool {
        let connection = self.connection.lock().await;
        if connection.generation() != Some(generation) {
            return false;
        }

        let message = match Inbound::from_bytes(bytes) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed message");
                return true;
            }
        };

        let action = message.action().to_owned();
        let mut session = self.session.lock().await;
        let transition = apply_inbound(&mut session, message);
        tracing::debug!(%action, ?transition, "applied inbound message");

        if transition.changed_session() {
            self.snapshots.send_replace(session.clone());
            self.emit(ClientEvent::SessionChanged);
        }
        drop(session);
        drop(connection);
        true
    }

    async fn connection_lost(&self, generation: Generation, error: TransportError) {
        let reason = match &error {
            TransportError::ConnectionClosed => "connection closed by server".to_string(),
            other => {
                tracing::warn!(error = %other, "receive failed");
                other.to_string()
            }
        };

        let actions = {
            let mut connection = self.connection.lock().await;
            let (state, actions) = connection
                .clone()
                .on_event(ConnectionEvent::Closed { generation, reason });
            *connection = state;
            actions
        };

        // Only tear the transport down if this was still the live connection
        if !actions.is_empty() {
            if let Err(e) = self.transport.close().await {
                tracing::debug!(error = %e, "transport cleanup after loss failed");
            }
        }
        if let Err(e) = self.perform(actions).await {
            tracing::debug!(error = %e, "connection-lost actions failed");
        }
    }

    // ===========================================
    // Outbound intents
    // ===========================================

    /// Ask the server to create a room. The room appears once the server
    /// answers with `roomCreated`.
    pub async fn create_room(&self, creator: &str, password: Option<&str>) -> Result<(), ClientError> {
        self.submit(Intent::CreateRoom {
            creator: creator.to_string(),
            password: password.map(str::to_string),
        })
        .await
    }

    /// Ask to join a room. The missing password is sent as an empty string.
    pub async fn join_room(
        &self,
        room_id: &str,
        user: &str,
        password: Option<&str>,
    ) -> Result<(), ClientError> {
        self.submit(Intent::JoinRoom {
            room_id: room_id.to_string(),
            user: user.to_string(),
            password: password.map(str::to_string),
        })
        .await
    }

    /// Leave the current room. Does nothing outside a room; otherwise the
    /// room is cleared locally without waiting for the server.
    pub async fn leave_room(&self, user: &str) -> Result<(), ClientError> {
        self.submit(Intent::LeaveRoom {
            user: user.to_string(),
        })
        .await
    }

    /// Ask the server to destroy a room.
    pub async fn destroy_room(&self, room_id: &str) -> Result<(), ClientError> {
        self.submit(Intent::DestroyRoom {
            room_id: room_id.to_string(),
        })
        .await
    }

    /// Post a chat line to the current room.
    pub async fn send_message(&self, player_name: &str, message: &str) -> Result<(), ClientError> {
        self.submit(Intent::SendMessage {
            player_name: player_name.to_string(),
            message: message.to_string(),
        })
        .await
    }

    /// Ask the server for the room list.
    pub async fn refresh_room_list(&self) -> Result<(), ClientError> {
        self.submit(Intent::RefreshRoomList).await
    }

    /// Ask the server for details of one room. The answer refreshes the
    /// stored copy of that room.
    pub async fn request_room_info(&self, room_id: &str) -> Result<(), ClientError> {
        self.submit(Intent::RequestRoomInfo {
            room_id: room_id.to_string(),
        })
        .await
    }

    async fn submit(&self, intent: Intent) -> Result<(), ClientError> {
        let plan = {
            let mut session = self.session.lock().await;
            let plan = plan_intent(&mut session, intent);
            if plan.transition.changed_session() {
                self.snapshots.send_replace(session.clone());
                self.emit(ClientEvent::SessionChanged);
            }
            plan
        };

        match plan.outbound {
            Some(message) => self.send_outbound(&message).await,
            None => {
                tracing::debug!(transition = ?plan.transition, "intent not sent");
                Ok(())
            }
        }
    }

    async fn send_outbound(&self, message: &Outbound) -> Result<(), ClientError> {
        let bytes = message.to_bytes()?;

        if !self.is_connected().await {
            tracing::debug!(action = message.action(), "not connected, dropping send");
            return Ok(());
        }

        match self.transport.send(&bytes).await {
            Ok(()) => {}
            // Transport went away before run() saw the close
            Err(TransportError::NotConnected) => {
                tracing::debug!(action = message.action(), "connection gone, dropping send");
            }
            Err(e) => {
                tracing::warn!(action = message.action(), error = %e, "send failed");
                self.emit(ClientEvent::Errored(e.to_string()));
            }
        }
        Ok(())
    }

    // ===========================================
    // Read access
    // ===========================================

    /// A copy of the current session.
    pub async fn snapshot(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Watch the session; the receiver sees a fresh copy after every change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.snapshots.subscribe()
    }

    /// Receive connection events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

}
