//! # room-core
//!
//! Pure logic for roomsync (no I/O, instant tests).
//!
//! This crate holds the session state and the protocol state machine without
//! any network I/O:
//! - [`Session`] - the roster, current room, chat transcript and notices
//! - [`dispatch`] - inbound transitions and outbound intent validation
//! - [`ConnectionState`] - the connect/close lifecycle
//!
//! The actual I/O is performed by `room-client`, which feeds decoded messages
//! into [`apply_inbound`] and sends whatever [`plan_intent`] returns.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connection;
pub mod dispatch;
pub mod session;

pub use connection::{ConnectionAction, ConnectionEvent, ConnectionState, Generation};
pub use dispatch::{apply_inbound, plan_intent, Intent, Plan, Transition};
pub use session::{NoticeEntry, Phase, Session};
