//! Connection lifecycle state machine for roomsync.
//!
//! This module provides a pure, side-effect-free state machine for the single
//! logical connection a client holds. It takes events as input and produces a
//! new state plus a list of actions to execute.
//!
//! There is no reconnect state: a dropped connection lands in
//! `Disconnected` and stays there until the application asks to connect again.

use std::fmt;

/// Identifies one logical connection.
///
/// Every successful connect gets a fresh generation. Anything tagged with an
/// older generation belongs to a connection that has since been closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Wrap a raw counter value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The generation after this one.
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Raw counter value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Connection state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection.
    #[default]
    Disconnected,
    /// Connection attempt in progress.
    Connecting,
    /// Connected and receiving.
    Open {
        /// Generation of the live connection.
        generation: Generation,
    },
}

/// Events that can occur in the connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Application asked to connect.
    ConnectRequested,
    /// Transport connected.
    ConnectSucceeded {
        /// Generation assigned to the new connection.
        generation: Generation,
    },
    /// Transport failed to connect.
    ConnectFailed {
        /// Error message describing the failure.
        error: String,
    },
    /// The connection dropped (network failure or server close).
    Closed {
        /// Generation of the connection that dropped.
        generation: Generation,
        /// Reason for the closure.
        reason: String,
    },
    /// Application asked to close.
    CloseRequested,
}

/// Actions to be executed by the client.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a transport connection.
    Connect,
    /// Tear the transport down.
    Disconnect,
    /// Tell observers the connection is open.
    EmitOpened,
    /// Tell observers the connection closed.
    EmitClosed {
        /// Reason for the closure.
        reason: String,
    },
    /// Tell observers the connection attempt failed.
    EmitFailed {
        /// Error message describing the failure.
        error: String,
    },
}

impl ConnectionState {
    /// Create a new state machine in the Disconnected state.
    pub fn new() -> Self {
        Self::Disconnected
    }

    /// Process an event and return the new state plus actions to execute.
    pub fn on_event(self, event: ConnectionEvent) -> (Self, Vec<ConnectionAction>) {
        use ConnectionAction as A;
        use ConnectionEvent as E;

        match (self, event) {
            (Self::Disconnected, E::ConnectRequested) => (Self::Connecting, vec![A::Connect]),

            // Connecting twice reuses the open connection; observers still
            // hear about it.
            (Self::Open { generation }, E::ConnectRequested) => {
                (Self::Open { generation }, vec![A::EmitOpened])
            }

            (Self::Connecting, E::ConnectSucceeded { generation }) => {
                (Self::Open { generation }, vec![A::EmitOpened])
            }
            (Self::Connecting, E::ConnectFailed { error }) => {
                (Self::Disconnected, vec![A::EmitFailed { error }])
            }
            (Self::Connecting, E::CloseRequested) => (Self::Disconnected, vec![A::Disconnect]),

            (Self::Open { generation }, E::Closed {
                generation: closed,
                reason,
            }) if closed == generation => (Self::Disconnected, vec![A::EmitClosed { reason }]),
            (Self::Open { .. }, E::CloseRequested) => (
                Self::Disconnected,
                vec![
                    A::Disconnect,
                    A::EmitClosed {
                        reason: "closed by client".into(),
                    },
                ],
            ),

            // Stale or invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if a connection is open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// Generation of the open connection, if any.
    pub fn generation(&self) -> Option<Generation> {
        match self {
            Self::Open { generation } => Some(*generation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(n: u64) -> ConnectionState {
        ConnectionState::Open {
            generation: Generation::new(n),
        }
    }

    #[test]
    fn starts_disconnected() {
        let state = ConnectionState::new();
        assert!(matches!(state, ConnectionState::Disconnected));
        assert!(state.generation().is_none());
    }

    #[test]
    fn connect_request_transitions_to_connecting() {
        let (state, actions) = ConnectionState::Disconnected.on_event(ConnectionEvent::ConnectRequested);
        assert_eq!(state, ConnectionState::Connecting);
        assert_eq!(actions, vec![ConnectionAction::Connect]);
    }

    #[test]
    fn connect_success_opens_and_emits() {
        let (state, actions) = ConnectionState::Connecting.on_event(ConnectionEvent::ConnectSucceeded {
            generation: Generation::new(1),
        });
        assert_eq!(state, open(1));
        assert!(state.is_open());
        assert_eq!(actions, vec![ConnectionAction::EmitOpened]);
    }

    #[test]
    fn connect_while_open_reuses_connection() {
        let (state, actions) = open(3).on_event(ConnectionEvent::ConnectRequested);
        assert_eq!(state, open(3));
        assert_eq!(actions, vec![ConnectionAction::EmitOpened]);
        assert!(!actions.contains(&ConnectionAction::Connect));
    }

    #[test]
    fn connect_failure_returns_to_disconnected() {
        let (state, actions) = ConnectionState::Connecting.on_event(ConnectionEvent::ConnectFailed {
            error: "refused".into(),
        });
        assert_eq!(state, ConnectionState::Disconnected);
        assert_eq!(
            actions,
            vec![ConnectionAction::EmitFailed {
                error: "refused".into()
            }]
        );
    }

    #[test]
    fn involuntary_close_does_not_reconnect() {
        let (state, actions) = open(2).on_event(ConnectionEvent::Closed {
            generation: Generation::new(2),
            reason: "server went away".into(),
        });
        assert_eq!(state, ConnectionState::Disconnected);
        assert_eq!(
            actions,
            vec![ConnectionAction::EmitClosed {
                reason: "server went away".into()
            }]
        );
    }

    #[test]
    fn stale_close_is_ignored() {
        let (state, actions) = open(5).on_event(ConnectionEvent::Closed {
            generation: Generation::new(4),
            reason: "old socket".into(),
        });
        assert_eq!(state, open(5));
        assert!(actions.is_empty());
    }

    #[test]
    fn close_request_disconnects() {
        let (state, actions) = open(1).on_event(ConnectionEvent::CloseRequested);
        assert_eq!(state, ConnectionState::Disconnected);
        assert_eq!(actions[0], ConnectionAction::Disconnect);

        let (state, actions) = ConnectionState::Disconnected.on_event(ConnectionEvent::CloseRequested);
        assert_eq!(state, ConnectionState::Disconnected);
        assert!(actions.is_empty());
    }

    #[test]
    fn generation_advances() {
        let g = Generation::default();
        assert_eq!(g.next().value(), 1);
        assert!(g.next() > g);
        assert_eq!(g.next().to_string(), "#1");
    }
}
