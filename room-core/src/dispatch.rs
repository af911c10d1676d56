//! Protocol state machine.
//!
//! [`apply_inbound`] applies the one legal transition for a server message.
//! [`plan_intent`] validates a local user action against the session and
//! returns the message to send, if any. Both are pure: the caller owns the
//! transport.
//!
//! Join and create wait for the server to confirm. Leave and destroy are
//! optimistic: the current room is cleared locally right away and is not
//! restored if the server disagrees.

use roomsync_types::{
    CreateRoom, DestroyRoom, GetRoomInfo, Inbound, JoinRoom, LeaveRoom, Notice, NoticeKind,
    Outbound, Room, RoomClosed, SendMessage,
};

use crate::session::{NoticeEntry, Session};

/// What a dispatch step did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed.
    Unchanged,
    /// Session data changed, phase did not.
    Updated,
    /// Now in the given room.
    Entered {
        /// The room entered.
        room_id: String,
    },
    /// No longer in the given room.
    Left {
        /// The room left.
        room_id: String,
        /// Cleared locally ahead of any server confirmation.
        optimistic: bool,
    },
    /// The message or intent was dropped.
    Ignored {
        /// Why it was dropped.
        reason: &'static str,
    },
}

impl Transition {
    /// Whether observers should re-render.
    pub fn changed_session(&self) -> bool {
        matches!(
            self,
            Self::Updated | Self::Entered { .. } | Self::Left { .. }
        )
    }
}

/// A local user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Open a new room.
    CreateRoom {
        /// Requested owner.
        creator: String,
        /// Optional password.
        password: Option<String>,
    },
    /// Join an existing room.
    JoinRoom {
        /// Target room.
        room_id: String,
        /// Joining participant.
        user: String,
        /// Optional password attempt.
        password: Option<String>,
    },
    /// Leave the current room.
    LeaveRoom {
        /// Leaving participant.
        user: String,
    },
    /// Tear a room down.
    DestroyRoom {
        /// Room to destroy.
        room_id: String,
    },
    /// Post a chat line to the current room.
    SendMessage {
        /// Sender.
        player_name: String,
        /// Text.
        message: String,
    },
    /// Ask for a fresh room list.
    RefreshRoomList,
    /// Ask for details of one room.
    RequestRoomInfo {
        /// Room to describe.
        room_id: String,
    },
}

/// Result of validating an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Message to send, `None` when the intent is a no-op.
    pub outbound: Option<Outbound>,
    /// Local change applied while planning.
    pub transition: Transition,
}

impl Plan {
    fn send(outbound: Outbound) -> Self {
        Self {
            outbound: Some(outbound),
            transition: Transition::Unchanged,
        }
    }

    fn skip(reason: &'static str) -> Self {
        Self {
            outbound: None,
            transition: Transition::Ignored { reason },
        }
    }
}

/// Apply a server message to the session.
pub fn apply_inbound(session: &mut Session, message: Inbound) -> Transition {
    match message {
        Inbound::RoomList(rooms) => {
            let current = session.current_room_id().map(str::to_owned);
            let rooms = rooms
                .into_iter()
                .filter(|r| current.as_deref() != Some(r.id.as_str()))
                .map(Room::normalized)
                .collect();
            session.replace_roster(rooms);
            Transition::Updated
        }

        Inbound::RoomCreated(room) => {
            let room = room.normalized();
            let room_id = room.id.clone();
            session.remove_from_roster(&room_id);
            session.push_roster(room.clone());
            session.set_current_room(room);
            Transition::Entered { room_id }
        }

        Inbound::JoinedRoom(joined) => {
            let room = joined.room.normalized();
            let room_id = room.id.clone();
            session.remove_from_roster(&room_id);
            session.set_current_room(room);
            for message in joined.messages {
                session.append_chat(message);
            }
            Transition::Entered { room_id }
        }

        // History is only replayed through joinedRoom, so it is not merged here
        Inbound::RoomInfo(info) => {
            let room = info.room.normalized();
            if !session.refresh_room(room.clone()) {
                session.push_roster(room);
            }
            Transition::Updated
        }

        Inbound::RoomUpdate(update) => {
            let Some(current) = session.current_room_mut() else {
                return Transition::Ignored {
                    reason: "room update with no current room",
                };
            };
            if update.id.as_deref().is_some_and(|id| id != current.id) {
                return Transition::Ignored {
                    reason: "room update for another room",
                };
            }
            current.apply_update(update);
            Transition::Updated
        }

        Inbound::RoomClosed(RoomClosed { id }) => close_room(session, id),

        Inbound::NewMessage(message) => {
            session.append_chat(message);
            Transition::Updated
        }

        Inbound::UserJoined(notice) => push_notice(session, NoticeKind::UserJoined, notice),
        Inbound::UserLeft(notice) => push_notice(session, NoticeKind::UserLeft, notice),
        Inbound::RoomTimeout(notice) => push_notice(session, NoticeKind::RoomTimeout, notice),

        Inbound::Error(error) => {
            session.push_error(error);
            Transition::Updated
        }

        Inbound::Unrecognized { .. } => Transition::Ignored {
            reason: "unrecognized action",
        },
    }
}

fn push_notice(session: &mut Session, kind: NoticeKind, notice: Notice) -> Transition {
    session.append_notice(NoticeEntry {
        kind,
        user: notice.user,
        message: notice.message,
    });
    Transition::Updated
}

fn close_room(session: &mut Session, id: Option<String>) -> Transition {
    let target = match id {
        Some(id) => id,
        None => match session.current_room_id() {
            Some(current) => current.to_owned(),
            None => {
                return Transition::Ignored {
                    reason: "room closed with no id and no current room",
                }
            }
        },
    };

    let was_current = session.current_room_id() == Some(target.as_str());
    if was_current {
        session.take_current_room();
    }
    let before = session.roster().len();
    session.remove_from_roster(&target);

    if was_current {
        Transition::Left {
            room_id: target,
            optimistic: false,
        }
    } else if session.roster().len() != before {
        Transition::Updated
    } else {
        Transition::Unchanged
    }
}

/// Validate a local intent, apply any optimistic local change, and return
/// what to send.
pub fn plan_intent(session: &mut Session, intent: Intent) -> Plan {
    match intent {
        Intent::CreateRoom { creator, password } => Plan::send(Outbound::CreateRoom(CreateRoom {
            creator,
            password: password.unwrap_or_default(),
        })),

        Intent::JoinRoom {
            room_id,
            user,
            password,
        } => Plan::send(Outbound::JoinRoom(JoinRoom {
            room_id,
            user,
            password: password.unwrap_or_default(),
        })),

        Intent::LeaveRoom { user } => match session.take_current_room() {
            Some(room) => Plan {
                outbound: Some(Outbound::LeaveRoom(LeaveRoom {
                    room_id: room.id.clone(),
                    user,
                })),
                transition: Transition::Left {
                    room_id: room.id,
                    optimistic: true,
                },
            },
            None => Plan::skip("leave with no current room"),
        },

        Intent::DestroyRoom { room_id } => {
            let transition = if session.current_room_id() == Some(room_id.as_str()) {
                session.take_current_room();
                Transition::Left {
                    room_id: room_id.clone(),
                    optimistic: true,
                }
            } else {
                Transition::Unchanged
            };
            Plan {
                outbound: Some(Outbound::DestroyRoom(DestroyRoom { room_id })),
                transition,
            }
        }

        Intent::SendMessage {
            player_name,
            message,
        } => {
            let Some(room_id) = session.current_room_id() else {
                return Plan::skip("chat with no current room");
            };
            if message.trim().is_empty() {
                return Plan::skip("blank chat message");
            }
            Plan::send(Outbound::SendMessage(SendMessage {
                room_id: room_id.to_owned(),
                player_name,
                message,
            }))
        }

        Intent::RefreshRoomList => Plan::send(Outbound::GetRoomList),

        Intent::RequestRoomInfo { room_id } => {
            Plan::send(Outbound::GetRoomInfo(GetRoomInfo { room_id }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomsync_types::{ChatMessage, JoinedRoom, RoomStatus, RoomUpdate};

    fn room(id: &str) -> Room {
        Room::new(id, "alice")
    }

    fn in_room(id: &str) -> Session {
        let mut session = Session::new();
        apply_inbound(&mut session, Inbound::JoinedRoom(room(id).into()));
        session
    }

    fn ids(session: &Session) -> Vec<&str> {
        session.roster().iter().map(|r| r.id.as_str()).collect()
    }

    // ===========================================
    // roomList
    // ===========================================

    #[test]
    fn room_list_replaces_roster_in_lobby() {
        let mut session = Session::new();
        let lists = [
            vec![room("a"), room("b")],
            vec![room("c")],
            vec![],
            vec![room("b"), room("d"), room("a")],
        ];
        for list in lists {
            let expected = list.clone();
            let t = apply_inbound(&mut session, Inbound::RoomList(list));
            assert_eq!(t, Transition::Updated);
            assert_eq!(session.roster(), expected.as_slice());
        }
    }

    #[test]
    fn room_list_excludes_current_room() {
        let mut session = in_room("r1");
        for list in [
            vec![room("r1"), room("r2")],
            vec![room("r3"), room("r1")],
            vec![room("r1")],
        ] {
            apply_inbound(&mut session, Inbound::RoomList(list));
            assert!(session.roster().iter().all(|r| r.id != "r1"));
        }
        assert_eq!(session.current_room_id(), Some("r1"));
    }

    #[test]
    fn room_list_dedupes_members() {
        let mut session = Session::new();
        let dup = room("a").with_players(["alice", "alice"]);
        apply_inbound(&mut session, Inbound::RoomList(vec![dup]));
        assert_eq!(session.roster()[0].players, vec!["alice"]);
    }

    // ===========================================
    // roomCreated / joinedRoom
    // ===========================================

    #[test]
    fn room_created_enters_and_lists_room() {
        let mut session = Session::new();
        let created = Room::new("r1", "alice");
        let t = apply_inbound(&mut session, Inbound::RoomCreated(created.clone()));

        assert_eq!(
            t,
            Transition::Entered {
                room_id: "r1".into()
            }
        );
        assert_eq!(session.current_room(), Some(&created));
        assert!(session.roster().iter().any(|r| r.id == "r1"));
    }

    #[test]
    fn room_created_twice_keeps_single_roster_entry() {
        let mut session = Session::new();
        apply_inbound(&mut session, Inbound::RoomCreated(room("r1")));
        apply_inbound(&mut session, Inbound::RoomCreated(room("r1")));
        assert_eq!(ids(&session), vec!["r1"]);
    }

    #[test]
    fn joined_room_replaces_current_and_appends_history() {
        let mut session = in_room("r1");
        apply_inbound(&mut session, Inbound::NewMessage(ChatMessage::new("alice", "old")));
        apply_inbound(&mut session, Inbound::RoomList(vec![room("r2"), room("r3")]));

        let joined = JoinedRoom {
            room: room("r2").with_players(["alice", "bob"]),
            messages: vec![ChatMessage::new("bob", "welcome")],
        };
        let t = apply_inbound(&mut session, Inbound::JoinedRoom(joined));

        assert_eq!(
            t,
            Transition::Entered {
                room_id: "r2".into()
            }
        );
        assert_eq!(session.current_room_id(), Some("r2"));
        assert_eq!(ids(&session), vec!["r3"]);
        let texts: Vec<_> = session.transcript().iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, vec!["old", "welcome"]);
    }

    // ===========================================
    // roomUpdate
    // ===========================================

    #[test]
    fn room_update_merges_in_place() {
        let mut session = Session::new();
        apply_inbound(
            &mut session,
            Inbound::RoomCreated(Room::new("r1", "alice").with_password("pw")),
        );

        let t = apply_inbound(
            &mut session,
            Inbound::RoomUpdate(RoomUpdate {
                players: vec!["alice".into(), "bob".into()],
                spectators: vec![],
                room_status: RoomStatus::Playing,
                ..Default::default()
            }),
        );

        assert_eq!(t, Transition::Updated);
        let current = session.current_room().unwrap();
        assert_eq!(current.players, vec!["alice", "bob"]);
        assert_eq!(current.status, RoomStatus::Playing);
        assert_eq!(current.id, "r1");
        assert_eq!(current.creator, "alice");
        assert_eq!(current.password.as_deref(), Some("pw"));
    }

    #[test]
    fn room_update_without_current_room_is_dropped() {
        let mut session = Session::new();
        apply_inbound(&mut session, Inbound::RoomList(vec![room("r1")]));
        let before = session.clone();

        let t = apply_inbound(&mut session, Inbound::RoomUpdate(RoomUpdate::default()));

        assert!(matches!(t, Transition::Ignored { .. }));
        assert_eq!(session, before);
    }

    #[test]
    fn room_update_naming_other_room_is_dropped() {
        let mut session = in_room("r1");
        let t = apply_inbound(
            &mut session,
            Inbound::RoomUpdate(RoomUpdate {
                players: vec!["mallory".into()],
                id: Some("r9".into()),
                ..Default::default()
            }),
        );
        assert!(matches!(t, Transition::Ignored { .. }));
        assert_eq!(session.current_room().unwrap().players, vec!["alice"]);
    }

    // ===========================================
    // roomClosed
    // ===========================================

    #[test]
    fn room_closed_for_current_room_returns_to_lobby() {
        let mut session = Session::new();
        apply_inbound(&mut session, Inbound::RoomCreated(room("r1")));

        let t = apply_inbound(&mut session, Inbound::RoomClosed(RoomClosed::new("r1")));

        assert_eq!(
            t,
            Transition::Left {
                room_id: "r1".into(),
                optimistic: false
            }
        );
        assert!(session.current_room().is_none());
        assert!(session.roster().iter().all(|r| r.id != "r1"));
    }

    #[test]
    fn room_closed_for_other_room_only_prunes_roster() {
        let mut session = in_room("r1");
        apply_inbound(&mut session, Inbound::RoomList(vec![room("r2"), room("r3")]));

        let t = apply_inbound(&mut session, Inbound::RoomClosed(RoomClosed::new("r2")));

        assert_eq!(t, Transition::Updated);
        assert_eq!(session.current_room_id(), Some("r1"));
        assert_eq!(ids(&session), vec!["r3"]);

        let t = apply_inbound(&mut session, Inbound::RoomClosed(RoomClosed::new("zz")));
        assert_eq!(t, Transition::Unchanged);
    }

    #[test]
    fn room_closed_without_id_closes_current_room() {
        let mut session = in_room("r1");
        let t = apply_inbound(&mut session, Inbound::RoomClosed(RoomClosed::default()));
        assert!(matches!(t, Transition::Left { ref room_id, .. } if room_id == "r1"));

        let t = apply_inbound(&mut session, Inbound::RoomClosed(RoomClosed::default()));
        assert!(matches!(t, Transition::Ignored { .. }));
    }

    // ===========================================
    // roomInfo
    // ===========================================

    #[test]
    fn room_info_refreshes_roster_entry() {
        let mut session = Session::new();
        apply_inbound(&mut session, Inbound::RoomList(vec![room("r1"), room("r2")]));

        let fresh = room("r2").with_players(["alice", "bob"]).with_status(RoomStatus::Playing);
        let t = apply_inbound(&mut session, Inbound::RoomInfo(fresh.clone().into()));

        assert_eq!(t, Transition::Updated);
        assert_eq!(ids(&session), vec!["r1", "r2"]);
        assert_eq!(session.roster()[1], fresh);
    }

    #[test]
    fn room_info_refreshes_current_room_without_touching_transcript() {
        let mut session = in_room("r1");
        apply_inbound(&mut session, Inbound::NewMessage(ChatMessage::new("bob", "hi")));

        let info = JoinedRoom {
            room: room("r1").with_spectators(["eve", "eve"]),
            messages: vec![ChatMessage::new("bob", "hi")],
        };
        apply_inbound(&mut session, Inbound::RoomInfo(info));

        assert_eq!(session.current_room().unwrap().spectators, vec!["eve"]);
        assert_eq!(session.transcript().len(), 1);
        assert!(session.roster().is_empty());
    }

    #[test]
    fn room_info_for_unlisted_room_is_added_to_roster() {
        let mut session = Session::new();
        apply_inbound(&mut session, Inbound::RoomInfo(room("r7").into()));
        assert_eq!(ids(&session), vec!["r7"]);
    }

    // ===========================================
    // Chat, notices, errors, unknown actions
    // ===========================================

    #[test]
    fn chat_and_notices_append() {
        let mut session = in_room("r1");
        apply_inbound(&mut session, Inbound::NewMessage(ChatMessage::new("bob", "one")));
        apply_inbound(
            &mut session,
            Inbound::UserJoined(Notice {
                user: Some("bob".into()),
                message: "bob joined".into(),
            }),
        );
        apply_inbound(&mut session, Inbound::NewMessage(ChatMessage::new("bob", "two")));
        apply_inbound(&mut session, Inbound::RoomTimeout(Notice::default()));

        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1].message, "two");
        let kinds: Vec<_> = session.notices().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NoticeKind::UserJoined, NoticeKind::RoomTimeout]);
        assert_eq!(session.notices()[0].user.as_deref(), Some("bob"));
    }

    #[test]
    fn server_error_is_recorded() {
        let mut session = Session::new();
        apply_inbound(&mut session, Inbound::Error("room is full".into()));
        apply_inbound(&mut session, Inbound::Error("wrong password".into()));
        assert_eq!(session.errors(), ["room is full", "wrong password"]);
    }

    #[test]
    fn repeated_identical_errors_each_count() {
        let mut session = Session::new();
        let first = apply_inbound(&mut session, Inbound::Error("wrong password".into()));
        let after_first = session.clone();
        let second = apply_inbound(&mut session, Inbound::Error("wrong password".into()));

        assert!(first.changed_session());
        assert!(second.changed_session());
        assert_ne!(session, after_first);
        assert_eq!(session.errors().len(), 2);
    }

    #[test]
    fn unrecognized_action_is_ignored() {
        let mut session = in_room("r1");
        let before = session.clone();
        let t = apply_inbound(
            &mut session,
            Inbound::Unrecognized {
                action: "joinToken".into(),
            },
        );
        assert!(!t.changed_session());
        assert_eq!(session, before);
    }

    // ===========================================
    // Intents
    // ===========================================

    #[test]
    fn create_and_join_default_password_to_empty() {
        let mut session = Session::new();
        let plan = plan_intent(
            &mut session,
            Intent::CreateRoom {
                creator: "alice".into(),
                password: None,
            },
        );
        assert_eq!(
            plan.outbound,
            Some(Outbound::CreateRoom(CreateRoom {
                creator: "alice".into(),
                password: String::new()
            }))
        );

        let plan = plan_intent(
            &mut session,
            Intent::JoinRoom {
                room_id: "r1".into(),
                user: "bob".into(),
                password: None,
            },
        );
        assert_eq!(
            plan.outbound,
            Some(Outbound::JoinRoom(JoinRoom {
                room_id: "r1".into(),
                user: "bob".into(),
                password: String::new()
            }))
        );
        assert_eq!(session, Session::new());
    }

    #[test]
    fn leave_without_room_sends_nothing() {
        let mut session = Session::new();
        let plan = plan_intent(
            &mut session,
            Intent::LeaveRoom {
                user: "bob".into(),
            },
        );
        assert!(plan.outbound.is_none());
    }

    #[test]
    fn leave_clears_current_room_optimistically() {
        let mut session = in_room("r1");
        let plan = plan_intent(
            &mut session,
            Intent::LeaveRoom {
                user: "bob".into(),
            },
        );
        assert_eq!(
            plan.outbound,
            Some(Outbound::LeaveRoom(LeaveRoom {
                room_id: "r1".into(),
                user: "bob".into()
            }))
        );
        assert_eq!(
            plan.transition,
            Transition::Left {
                room_id: "r1".into(),
                optimistic: true
            }
        );
        assert!(session.current_room().is_none());

        // A late update for the room we left must not resurrect it.
        apply_inbound(&mut session, Inbound::RoomUpdate(RoomUpdate::default()));
        assert!(session.current_room().is_none());
    }

    #[test]
    fn destroy_always_sends_but_clears_only_matching_room() {
        let mut session = in_room("r1");

        let plan = plan_intent(
            &mut session,
            Intent::DestroyRoom {
                room_id: "r2".into(),
            },
        );
        assert!(plan.outbound.is_some());
        assert_eq!(plan.transition, Transition::Unchanged);
        assert_eq!(session.current_room_id(), Some("r1"));

        let plan = plan_intent(
            &mut session,
            Intent::DestroyRoom {
                room_id: "r1".into(),
            },
        );
        assert_eq!(
            plan.outbound,
            Some(Outbound::DestroyRoom(DestroyRoom {
                room_id: "r1".into()
            }))
        );
        assert!(session.current_room().is_none());
    }

    #[test]
    fn chat_requires_room_and_text() {
        let mut lobby = Session::new();
        let plan = plan_intent(
            &mut lobby,
            Intent::SendMessage {
                player_name: String::new(),
                message: "hello".into(),
            },
        );
        assert!(plan.outbound.is_none());

        let mut session = in_room("r1");
        for blank in ["", "   ", "\t\n"] {
            let plan = plan_intent(
                &mut session,
                Intent::SendMessage {
                    player_name: "alice".into(),
                    message: blank.into(),
                },
            );
            assert!(plan.outbound.is_none(), "sent {:?}", blank);
        }

        let plan = plan_intent(
            &mut session,
            Intent::SendMessage {
                player_name: "alice".into(),
                message: " hi ".into(),
            },
        );
        assert_eq!(
            plan.outbound,
            Some(Outbound::SendMessage(SendMessage {
                room_id: "r1".into(),
                player_name: "alice".into(),
                message: " hi ".into()
            }))
        );
    }

    #[test]
    fn refresh_requests_room_list() {
        let mut session = Session::new();
        let plan = plan_intent(&mut session, Intent::RefreshRoomList);
        assert_eq!(plan.outbound, Some(Outbound::GetRoomList));
    }

    #[test]
    fn chat_payload_matches_wire_format() {
        let mut session = in_room("r1");
        let plan = plan_intent(
            &mut session,
            Intent::SendMessage {
                player_name: "alice".into(),
                message: "hi".into(),
            },
        );
        let bytes = plan.outbound.unwrap().to_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["payload"]["roomId"], "r1");
    }

    #[test]
    fn room_info_request_is_always_sent() {
        let mut session = Session::new();
        let plan = plan_intent(
            &mut session,
            Intent::RequestRoomInfo {
                room_id: "r2".into(),
            },
        );
        assert_eq!(
            plan.outbound,
            Some(Outbound::GetRoomInfo(GetRoomInfo {
                room_id: "r2".into()
            }))
        );
        assert!(!plan.transition.changed_session());
    }
}
