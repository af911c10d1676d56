//! Session state store.
//!
//! A [`Session`] is the local participant's connection-scoped state: the room
//! roster, the room currently occupied, that room's chat transcript, and the
//! notices and errors the server has pushed.
//! Collaborators get read access only; every mutation goes through
//! [`crate::dispatch`].

use roomsync_types::{ChatMessage, NoticeKind, Room};

/// Derived protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not inside any room.
    Lobby,
    /// Occupying the current room.
    InRoom,
}

/// An informational notice from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeEntry {
    /// What happened.
    pub kind: NoticeKind,
    /// Participant involved, if any.
    pub user: Option<String>,
    /// Server-provided text.
    pub message: String,
}

/// Local mirror of server-side room state.
///
/// A `roomList` never lists the current room, but a room this client created
/// stays in the roster next to the current room until the next `roomList`.
/// The roster never holds two entries with the same id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    roster: Vec<Room>,
    current_room: Option<Room>,
    transcript: Vec<ChatMessage>,
    notices: Vec<NoticeEntry>,
    errors: Vec<String>,
}

impl Session {
    /// Create an empty session in the lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Known rooms, see the type docs for how this relates to the current room.
    pub fn roster(&self) -> &[Room] {
        &self.roster
    }

    /// The room currently occupied.
    pub fn current_room(&self) -> Option<&Room> {
        self.current_room.as_ref()
    }

    /// Chat lines, oldest first.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Join/leave/timeout notices, oldest first.
    pub fn notices(&self) -> &[NoticeEntry] {
        &self.notices
    }

    /// Errors reported by the server, oldest first.
    ///
    /// Repeated identical errors are kept as separate entries.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Lobby or in-room.
    pub fn phase(&self) -> Phase {
        if self.current_room.is_some() {
            Phase::InRoom
        } else {
            Phase::Lobby
        }
    }

    /// Id of the current room.
    pub fn current_room_id(&self) -> Option<&str> {
        self.current_room.as_ref().map(|r| r.id.as_str())
    }

    /// Look a room up by id, in the roster or as the current room.
    pub fn find_room(&self, id: &str) -> Option<&Room> {
        self.current_room
            .as_ref()
            .filter(|r| r.id == id)
            .or_else(|| self.roster.iter().find(|r| r.id == id))
    }

    pub(crate) fn replace_roster(&mut self, rooms: Vec<Room>) {
        self.roster = rooms;
    }

    pub(crate) fn push_roster(&mut self, room: Room) {
        self.roster.push(room);
    }

    pub(crate) fn remove_from_roster(&mut self, id: &str) {
        self.roster.retain(|r| r.id != id);
    }

    pub(crate) fn set_current_room(&mut self, room: Room) {
        self.current_room = Some(room);
    }

    pub(crate) fn current_room_mut(&mut self) -> Option<&mut Room> {
        self.current_room.as_mut()
    }

    pub(crate) fn take_current_room(&mut self) -> Option<Room> {
        self.current_room.take()
    }

    pub(crate) fn append_chat(&mut self, message: ChatMessage) {
        self.transcript.push(message);
    }

    pub(crate) fn append_notice(&mut self, notice: NoticeEntry) {
        self.notices.push(notice);
    }

    pub(crate) fn push_error(&mut self, error: String) {
        self.errors.push(error);
    }

    /// Replace the stored copy of a room, wherever it is held.
    ///
    /// Returns `false` if the room is neither current nor in the roster.
    pub(crate) fn refresh_room(&mut self, room: Room) -> bool {
        let mut found = false;
        if let Some(current) = self.current_room.as_mut().filter(|r| r.id == room.id) {
            *current = room.clone();
            found = true;
        }
        if let Some(entry) = self.roster.iter_mut().find(|r| r.id == room.id) {
            *entry = room;
            found = true;
        }
        found
    }
}
