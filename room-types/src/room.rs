//! Room and chat types mirrored from the server.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a room as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Waiting for a second player.
    #[default]
    Waiting,
    /// A game is in progress.
    Playing,
    /// The room no longer accepts players.
    Closed,
    /// Any status string this client does not know about.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A server-tracked group session.
///
/// The `id` is assigned by the server and never changes. `players` keeps join
/// order; `spectators` is set-like. Neither list holds duplicates once the
/// room has been through [`Room::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Server-assigned identifier.
    pub id: String,
    /// Identifier of the participant who created the room.
    #[serde(default)]
    pub creator: String,
    /// Players in join order.
    #[serde(default)]
    pub players: Vec<String>,
    /// Spectators.
    #[serde(default)]
    pub spectators: Vec<String>,
    /// Current status.
    #[serde(rename = "roomStatus", default)]
    pub status: RoomStatus,
    /// Opaque password; the server masks it when listing rooms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Room {
    /// Create an empty waiting room owned by `creator`.
    pub fn new(id: &str, creator: &str) -> Self {
        Self {
            id: id.to_string(),
            creator: creator.to_string(),
            players: vec![creator.to_string()],
            spectators: Vec::new(),
            status: RoomStatus::Waiting,
            password: None,
        }
    }

    /// Set the spectators.
    pub fn with_spectators<I, S>(mut self, spectators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spectators = spectators.into_iter().map(Into::into).collect();
        self
    }

    /// Set the players.
    pub fn with_players<I, S>(mut self, players: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.players = players.into_iter().map(Into::into).collect();
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: RoomStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the password.
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Whether joining requires a password.
    pub fn is_locked(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Whether `user` is a player or spectator here.
    pub fn contains(&self, user: &str) -> bool {
        self.players.iter().any(|p| p == user) || self.spectators.iter().any(|s| s == user)
    }

    /// Drop duplicate players and spectators, keeping first occurrences.
    pub fn normalized(mut self) -> Self {
        dedup_in_order(&mut self.players);
        dedup_in_order(&mut self.spectators);
        self
    }

    /// Merge a partial update into this room in place.
    ///
    /// Only membership and status change; `id`, `creator` and `password` are
    /// left alone.
    pub fn apply_update(&mut self, update: RoomUpdate) {
        self.players = update.players;
        self.spectators = update.spectators;
        self.status = update.room_status;
        dedup_in_order(&mut self.players);
        dedup_in_order(&mut self.spectators);
    }
}

fn dedup_in_order(list: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::with_capacity(list.len());
    list.retain(|item| seen.insert(item.clone()));
}

/// Partial room state pushed when membership or status changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdate {
    /// Players in join order.
    #[serde(default)]
    pub players: Vec<String>,
    /// Spectators.
    #[serde(default)]
    pub spectators: Vec<String>,
    /// New status.
    #[serde(default)]
    pub room_status: RoomStatus,
    /// Room the update belongs to, when the server names it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Participant whose connection dropped, if that caused the update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disconnected_user: Option<String>,
}

/// Notification that a room no longer exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomClosed {
    /// Closed room; `None` means the room the receiver is in.
    #[serde(default)]
    pub id: Option<String>,
}

impl RoomClosed {
    /// A close notification naming `id`.
    pub fn new(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
        }
    }
}

/// One line of room chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Sender.
    pub player_name: String,
    /// Message text.
    pub message: String,
    /// Room the message was posted to, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    /// Server timestamp (ISO 8601), when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    /// A chat line without server metadata.
    pub fn new(player_name: &str, message: &str) -> Self {
        Self {
            player_name: player_name.to_string(),
            message: message.to_string(),
            room_id: None,
            timestamp: None,
        }
    }
}

/// Kind of informational server notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// Someone joined the current room.
    UserJoined,
    /// Someone left the current room.
    UserLeft,
    /// The server closed the room for inactivity.
    RoomTimeout,
}

/// Payload of informational server notices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Participant the notice is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Human-readable text.
    #[serde(default)]
    pub message: String,
}
