//! Line parsing for the interactive session.

use thiserror::Error;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// `/rooms`
    Rooms,
    /// `/create [password]`
    Create {
        /// Room password, if any.
        password: Option<String>,
    },
    /// `/join <id> [password]`
    Join {
        /// Room to join.
        room_id: String,
        /// Room password, if any.
        password: Option<String>,
    },
    /// `/info <id>`
    Info {
        /// Room to describe.
        room_id: String,
    },
    /// `/leave`
    Leave,
    /// `/destroy [id]`, defaulting to the current room.
    Destroy {
        /// Room to destroy.
        room_id: Option<String>,
    },
    /// `/who`
    Who,
    /// `/help`
    Help,
    /// `/quit`
    Quit,
    /// Anything that is not a command.
    Say(String),
}

/// Input that looks like a command but is not one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown slash command.
    #[error("unknown command /{0} (try /help)")]
    UnknownCommand(String),
    /// Required argument missing.
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Help text for the session.
pub const HELP: &str = "\
commands:
  /rooms                 refresh the room list
  /create [password]     create a room
  /join <id> [password]  join a room
  /info <id>             show who is in a room
  /leave                 leave the current room
  /destroy [id]          destroy a room (default: current)
  /who                   show who is in the current room
  /help                  show this help
  /quit                  exit
anything else is sent as chat; start a line with // to send a leading /";

/// Parse one input line. Blank lines parse to `None`.
pub fn parse_line(line: &str) -> Result<Option<ReplCommand>, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    if let Some(escaped) = line.strip_prefix("//") {
        return Ok(Some(ReplCommand::Say(format!("/{escaped}"))));
    }

    let Some(command) = line.trim_start().strip_prefix('/') else {
        return Ok(Some(ReplCommand::Say(line.to_string())));
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    let rest = (!rest.is_empty()).then(|| rest.to_string());

    let parsed = match name {
        "rooms" | "list" => ReplCommand::Rooms,
        "create" => ReplCommand::Create { password: rest },
        "join" => {
            let rest = rest.ok_or(ParseError::Usage("/join <id> [password]"))?;
            let mut parts = rest.splitn(2, char::is_whitespace);
            let room_id = parts.next().unwrap_or_default().to_string();
            let password = parts
                .next()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty());
            ReplCommand::Join { room_id, password }
        }
        "info" => ReplCommand::Info {
            room_id: rest.ok_or(ParseError::Usage("/info <id>"))?,
        },
        "leave" => ReplCommand::Leave,
        "destroy" => ReplCommand::Destroy { room_id: rest },
        "who" => ReplCommand::Who,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(parsed))
}
