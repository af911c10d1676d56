//! Typed protocol messages for roomsync.
//!
//! [`Inbound`] covers everything the server pushes; [`Outbound`] covers the
//! requests a client makes. Both serialize to the `{action, payload}`
//! [`Envelope`] shape.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ChatMessage, CodecError, Envelope, Notice, Room, RoomClosed, RoomUpdate};

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "payload", rename_all = "camelCase")]
pub enum Inbound {
    /// Full list of open rooms.
    RoomList(Vec<Room>),
    /// The room this client asked to create.
    RoomCreated(Room),
    /// The room this client joined.
    JoinedRoom(JoinedRoom),
    /// Fresh details of a room this client asked about.
    RoomInfo(JoinedRoom),
    /// Membership or status change of the current room.
    RoomUpdate(RoomUpdate),
    /// A room went away.
    RoomClosed(RoomClosed),
    /// Chat broadcast in the current room.
    NewMessage(ChatMessage),
    /// Someone joined the current room.
    UserJoined(Notice),
    /// Someone left the current room.
    UserLeft(Notice),
    /// The current room timed out.
    RoomTimeout(Notice),
    /// A request was refused.
    Error(String),
    /// An action this client does not understand.
    #[serde(skip)]
    Unrecognized {
        /// The action name as received.
        action: String,
    },
}

/// Payload of `joinedRoom` and `roomInfo`: the room plus its chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedRoom {
    /// The joined room.
    #[serde(flatten)]
    pub room: Room,
    /// Chat history the server replays on join.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ChatMessage>,
}

impl From<Room> for JoinedRoom {
    fn from(room: Room) -> Self {
        Self {
            room,
            messages: Vec::new(),
        }
    }
}

impl Inbound {
    /// The wire action name.
    pub fn action(&self) -> &str {
        match self {
            Self::RoomList(_) => "roomList",
            Self::RoomCreated(_) => "roomCreated",
            Self::JoinedRoom(_) => "joinedRoom",
            Self::RoomInfo(_) => "roomInfo",
            Self::RoomUpdate(_) => "roomUpdate",
            Self::RoomClosed(_) => "roomClosed",
            Self::NewMessage(_) => "newMessage",
            Self::UserJoined(_) => "userJoined",
            Self::UserLeft(_) => "userLeft",
            Self::RoomTimeout(_) => "roomTimeout",
            Self::Error(_) => "error",
            Self::Unrecognized { action } => action,
        }
    }

    /// Interpret an untyped envelope.
    ///
    /// Unknown actions are not an error; they come back as
    /// [`Inbound::Unrecognized`] so newer servers don't break older clients.
    pub fn from_envelope(envelope: Envelope) -> Result<Self, CodecError> {
        let Envelope { action, payload } = envelope;
        let message = match action.as_str() {
            "roomList" => Self::RoomList(from_payload(&action, payload)?),
            "roomCreated" => Self::RoomCreated(from_payload(&action, payload)?),
            "joinedRoom" => Self::JoinedRoom(from_payload(&action, payload)?),
            "roomInfo" => Self::RoomInfo(from_payload(&action, payload)?),
            "roomUpdate" => Self::RoomUpdate(from_payload(&action, payload)?),
            "roomClosed" => Self::RoomClosed(from_payload_or_default(&action, payload)?),
            "newMessage" => Self::NewMessage(from_payload(&action, payload)?),
            "userJoined" => Self::UserJoined(from_payload_or_default(&action, payload)?),
            "userLeft" => Self::UserLeft(from_payload_or_default(&action, payload)?),
            "roomTimeout" => Self::RoomTimeout(from_payload_or_default(&action, payload)?),
            "error" => Self::Error(from_payload(&action, payload)?),
            _ => Self::Unrecognized { action },
        };
        Ok(message)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::from_envelope(Envelope::from_bytes(bytes)?)
    }

    /// Serialize to JSON bytes.
    ///
    /// Used by servers and test fixtures; `Unrecognized` cannot be encoded.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(CodecError::Serialization)
    }
}

fn from_payload<T: DeserializeOwned>(action: &str, payload: Value) -> Result<T, CodecError> {
    serde_json::from_value(payload).map_err(|source| CodecError::InvalidPayload {
        action: action.to_string(),
        source,
    })
}

fn from_payload_or_default<T: DeserializeOwned + Default>(
    action: &str,
    payload: Value,
) -> Result<T, CodecError> {
    if payload.is_null() {
        return Ok(T::default());
    }
    from_payload(action, payload)
}

/// Requests sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "camelCase")]
pub enum Outbound {
    /// Ask the server to open a room.
    CreateRoom(CreateRoom),
    /// Ask to join a room.
    JoinRoom(JoinRoom),
    /// Leave the current room.
    LeaveRoom(LeaveRoom),
    /// Tear a room down.
    DestroyRoom(DestroyRoom),
    /// Post a chat line.
    SendMessage(SendMessage),
    /// Ask for a fresh `roomList`.
    GetRoomList,
    /// Ask for a `roomInfo` about one room.
    GetRoomInfo(GetRoomInfo),
}

impl Outbound {
    /// The wire action name.
    pub fn action(&self) -> &'static str {
        match self {
            Self::CreateRoom(_) => "createRoom",
            Self::JoinRoom(_) => "joinRoom",
            Self::LeaveRoom(_) => "leaveRoom",
            Self::DestroyRoom(_) => "destroyRoom",
            Self::SendMessage(_) => "sendMessage",
            Self::GetRoomList => "getRoomList",
            Self::GetRoomInfo(_) => "getRoomInfo",
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(CodecError::Serialization)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Malformed)
    }
}

/// `createRoom` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoom {
    /// Requested owner.
    pub creator: String,
    /// Room password, empty for an open room.
    #[serde(default)]
    pub password: String,
}

/// `joinRoom` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    /// Target room.
    pub room_id: String,
    /// Joining participant.
    pub user: String,
    /// Password attempt, empty when none was given.
    #[serde(default)]
    pub password: String,
}

/// `leaveRoom` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoom {
    /// Room being left.
    pub room_id: String,
    /// Leaving participant.
    pub user: String,
}

/// `destroyRoom` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroyRoom {
    /// Room to tear down.
    pub room_id: String,
}

/// `sendMessage` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    /// Room the line is posted to.
    pub room_id: String,
    /// Sender.
    pub player_name: String,
    /// Text, sent as typed (not trimmed).
    pub message: String,
}

/// `getRoomInfo` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRoomInfo {
    /// Room to describe.
    pub room_id: String,
}
