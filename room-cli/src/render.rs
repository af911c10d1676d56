//! Terminal rendering of session changes.

use roomsync_core::{Phase, Session};
use roomsync_types::Room;

/// One-line summary of a room.
pub fn format_room(room: &Room) -> String {
    let lock = if room.is_locked() { " [locked]" } else { "" };
    format!(
        "{}  by {}  {} playing, {} watching  ({}){}",
        room.id,
        room.creator,
        room.players.len(),
        room.spectators.len(),
        room.status,
        lock
    )
}

/// Lines describing the room list.
pub fn format_roster(rooms: &[Room]) -> Vec<String> {
    if rooms.is_empty() {
        return vec!["no open rooms".to_string()];
    }
    rooms.iter().map(|room| format!("  {}", format_room(room))).collect()
}

/// Lines describing who is in a room.
pub fn format_members(room: &Room) -> Vec<String> {
    let list = |names: &[String]| {
        if names.is_empty() {
            "-".to_string()
        } else {
            names.join(", ")
        }
    };
    vec![
        format!("room {} ({})", room.id, room.status),
        format!("  players:    {}", list(&room.players)),
        format!("  spectators: {}", list(&room.spectators)),
    ]
}

/// Why a join attempt is likely to be refused, judged from what is known
/// locally. The server still decides.
pub fn join_warning(
    session: &Session,
    room_id: &str,
    user: &str,
    has_password: bool,
) -> Option<String> {
    let Some(room) = session.find_room(room_id) else {
        return Some(format!("room {room_id} is not in the room list; trying anyway"));
    };
    if room.contains(user) {
        Some(format!("{user} is already in room {room_id}"))
    } else if room.is_locked() && !has_password {
        Some(format!("room {room_id} is locked; try /join {room_id} <password>"))
    } else {
        None
    }
}

/// Turns successive session snapshots into output lines.
///
/// Only what changed since the previous snapshot is rendered. The transcript,
/// notices and errors only ever grow, so new entries are the ones past the
/// old length.
#[derive(Debug, Default)]
pub struct Renderer {
    last: Session,
    roster_requested: bool,
    info_requested: Option<String>,
}

impl Renderer {
    /// A renderer that has seen only the empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Print the room list on the next render even if it did not change.
    pub fn request_roster(&mut self) {
        self.roster_requested = true;
    }

    /// Print the given room once a snapshot holds fresh details for it.
    pub fn request_info(&mut self, room_id: &str) {
        self.info_requested = Some(room_id.to_string());
    }

    /// Lines for everything that changed since the last rendered snapshot.
    pub fn render(&mut self, next: &Session) -> Vec<String> {
        let mut lines = Vec::new();
        let last = &self.last;

        match (last.current_room(), next.current_room()) {
            (None, Some(room)) => {
                lines.push(format!("entered room {}", room.id));
                lines.extend(format_members(room));
            }
            (Some(old), Some(room)) if old.id != room.id => {
                lines.push(format!("moved from room {} to {}", old.id, room.id));
                lines.extend(format_members(room));
            }
            (Some(old), Some(room)) if old != room => lines.extend(format_members(room)),
            (Some(old), None) => lines.push(format!("left room {}, back in the lobby", old.id)),
            _ => {}
        }

        for message in next.transcript().iter().skip(last.transcript().len()) {
            lines.push(format!("<{}> {}", message.player_name, message.message));
        }

        for notice in next.notices().iter().skip(last.notices().len()) {
            lines.push(format!("* {}", notice.message));
        }

        let new_errors = &next.errors()[last.errors().len().min(next.errors().len())..];
        for error in new_errors {
            lines.push(format!("! server error: {error}"));
        }
        // A refused info request is answered by an error instead
        if !new_errors.is_empty() {
            self.info_requested = None;
        }

        let info = self.info_requested.as_deref().and_then(|id| {
            let room = next.find_room(id)?;
            (last.find_room(id) != Some(room)).then_some(room)
        });
        if let Some(room) = info {
            lines.extend(format_members(room));
            self.info_requested = None;
        }

        let roster_changed = next.roster() != last.roster();
        if self.roster_requested || (roster_changed && next.phase() == Phase::Lobby) {
            lines.push("rooms:".to_string());
            lines.extend(format_roster(next.roster()));
            self.roster_requested = false;
        }

        self.last = next.clone();
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomsync_core::apply_inbound;
    use roomsync_types::{ChatMessage, Inbound, Notice, RoomClosed, RoomStatus};

    fn apply(session: &mut Session, message: Inbound) {
        apply_inbound(session, message);
    }

    #[test]
    fn room_summary_marks_locked_rooms() {
        let room = Room::new("r1", "alice")
            .with_spectators(["bob"])
            .with_status(RoomStatus::Playing)
            .with_password("***");
        assert_eq!(
            format_room(&room),
            "r1  by alice  1 playing, 1 watching  (playing) [locked]"
        );
    }

    #[test]
    fn join_warnings_use_known_rooms() {
        let mut session = Session::new();
        apply(
            &mut session,
            Inbound::RoomList(vec![
                Room::new("open", "alice"),
                Room::new("locked", "bob").with_password("***"),
            ]),
        );

        assert_eq!(join_warning(&session, "open", "carol", false), None);
        assert_eq!(join_warning(&session, "locked", "carol", true), None);
        assert_eq!(
            join_warning(&session, "locked", "carol", false).as_deref(),
            Some("room locked is locked; try /join locked <password>")
        );
        assert_eq!(
            join_warning(&session, "open", "alice", false).as_deref(),
            Some("alice is already in room open")
        );
        assert!(join_warning(&session, "gone", "carol", false)
            .unwrap()
            .contains("not in the room list"));
    }

    #[test]
    fn empty_roster_says_so() {
        assert_eq!(format_roster(&[]), vec!["no open rooms"]);
    }

    #[test]
    fn lobby_roster_changes_are_printed() {
        let mut renderer = Renderer::new();
        let mut session = Session::new();
        apply(&mut session, Inbound::RoomList(vec![Room::new("r1", "alice")]));

        let lines = renderer.render(&session);
        assert_eq!(lines[0], "rooms:");
        assert!(lines[1].contains("r1"));

        // Same snapshot again prints nothing
        assert!(renderer.render(&session).is_empty());
    }

    #[test]
    fn requested_roster_prints_even_if_unchanged() {
        let mut renderer = Renderer::new();
        let session = Session::new();
        renderer.request_roster();

        assert_eq!(renderer.render(&session), vec!["rooms:", "no open rooms"]);
        assert!(renderer.render(&session).is_empty());
    }

    #[test]
    fn entering_chatting_and_leaving() {
        let mut renderer = Renderer::new();
        let mut session = Session::new();

        apply(&mut session, Inbound::RoomCreated(Room::new("r1", "alice")));
        let lines = renderer.render(&session);
        assert_eq!(lines[0], "entered room r1");
        assert!(lines.iter().any(|l| l.contains("players:    alice")));

        apply(&mut session, Inbound::NewMessage(ChatMessage::new("alice", "hi")));
        apply(
            &mut session,
            Inbound::UserJoined(Notice {
                user: Some("bob".into()),
                message: "bob joined the room".into(),
            }),
        );
        assert_eq!(
            renderer.render(&session),
            vec!["<alice> hi", "* bob joined the room"]
        );

        apply(&mut session, Inbound::RoomClosed(RoomClosed::new("r1")));
        let lines = renderer.render(&session);
        assert_eq!(lines[0], "left room r1, back in the lobby");
    }

    #[test]
    fn identical_errors_are_each_shown() {
        let mut renderer = Renderer::new();
        let mut session = Session::new();

        apply(&mut session, Inbound::Error("wrong password".into()));
        assert_eq!(renderer.render(&session), vec!["! server error: wrong password"]);

        apply(&mut session, Inbound::Error("wrong password".into()));
        assert_eq!(renderer.render(&session), vec!["! server error: wrong password"]);
    }

    #[test]
    fn requested_room_info_is_printed_when_it_arrives() {
        let mut renderer = Renderer::new();
        let mut session = Session::new();
        apply(&mut session, Inbound::RoomList(vec![Room::new("r2", "bob")]));
        renderer.render(&session);

        renderer.request_info("r2");
        let fresh = Room::new("r2", "bob").with_spectators(["eve"]);
        apply(&mut session, Inbound::RoomInfo(fresh.into()));

        let lines = renderer.render(&session);
        assert_eq!(lines[0], "room r2 (waiting)");
        assert_eq!(lines[2], "  spectators: eve");
    }

    #[test]
    fn refused_room_info_is_forgotten() {
        let mut renderer = Renderer::new();
        let mut session = Session::new();
        renderer.request_info("r9");

        apply(&mut session, Inbound::Error("Room not found".into()));
        assert_eq!(renderer.render(&session), vec!["! server error: Room not found"]);

        apply(&mut session, Inbound::RoomInfo(Room::new("r9", "zed").into()));
        assert!(renderer.render(&session).iter().all(|l| !l.starts_with("room r9")));
    }

    #[test]
    fn server_errors_are_shown_once() {
        let mut renderer = Renderer::new();
        let mut session = Session::new();
        apply(&mut session, Inbound::Error("Room not found".into()));

        assert_eq!(renderer.render(&session), vec!["! server error: Room not found"]);
        assert!(renderer.render(&session).is_empty());
    }
}
