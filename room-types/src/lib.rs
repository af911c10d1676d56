//! # room-types
//!
//! Wire format types for the roomsync room/session protocol.
//!
//! This crate provides the foundational types used across all roomsync crates:
//! - [`Room`], [`RoomStatus`], [`ChatMessage`] - Mirrored server state
//! - [`Envelope`] - The `{action, payload}` wire unit
//! - [`Inbound`], [`Outbound`] - Typed server→client and client→server messages
//! - [`CodecError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod envelope;
mod error;
mod messages;
mod room;

pub use envelope::{decode, encode, Envelope};
pub use error::CodecError;
pub use messages::{
    CreateRoom, DestroyRoom, GetRoomInfo, Inbound, JoinRoom, JoinedRoom, LeaveRoom, Outbound,
    SendMessage,
};
pub use room::{ChatMessage, Notice, NoticeKind, Room, RoomClosed, RoomStatus, RoomUpdate};
