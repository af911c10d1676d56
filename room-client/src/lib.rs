//! # roomsync-client
//!
//! Client library for the roomsync room/session protocol.
//!
//! Applications use this crate to talk to a room server over a WebSocket:
//! browse the room list, create or join a room, chat inside it, and watch
//! the mirrored session change as the server pushes updates.
//!
//! ## Features
//!
//! - **Single Logical Connection**: `connect` is idempotent and never retries on its own
//! - **Ordered Dispatch**: inbound messages are applied one at a time, in arrival order
//! - **Transport Abstraction**: Pluggable transport layer (WebSocket, mock)
//! - **Pure State Machine**: Uses roomsync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use roomsync_client::{ClientConfig, RoomClient, WsTransport};
//!
//! let client = RoomClient::new(ClientConfig::default(), WsTransport::new());
//! client.connect().await?;
//!
//! // Ask for the lobby, then watch it arrive
//! client.refresh_room_list().await?;
//! let mut session = client.subscribe();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod transport;

pub use client::{ClientConfig, ClientError, ClientEvent, RoomClient};
pub use roomsync_core::{NoticeEntry, Phase, Session};
pub use transport::{
    MockTransport, Transport, TransportError, WsTransport, WsTransportConfig, MAX_MESSAGE_SIZE,
};
