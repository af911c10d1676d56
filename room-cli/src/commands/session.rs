//! Interactive room session.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use roomsync_client::{ClientError, ClientEvent, RoomClient, WsTransport};

use super::Connected;
use crate::config::CliConfig;
use crate::render::{format_members, join_warning, Renderer};
use crate::repl::{parse_line, ReplCommand, HELP};

/// Run the interactive session.
pub async fn run(config: &CliConfig) -> Result<()> {
    let name = config
        .player_name()
        .context("No player name. Pass --name or set [identity] name in the config file.")?
        .to_string();

    let connected = Connected::open(config).await?;
    let client = &connected.client;
    let mut snapshots = client.subscribe();
    let mut events = client.subscribe_events();
    let mut renderer = Renderer::new();

    println!(
        "Connected to {} as {}. Type /help for commands.",
        client.config().server_url,
        name
    );
    renderer.request_roster();
    client.refresh_room_list().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(ReplCommand::Quit)) => break,
                    Ok(Some(command)) => execute(client, &name, command, &mut renderer).await?,
                    Err(e) => println!("{e}"),
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let session = snapshots.borrow_and_update().clone();
                for line in renderer.render(&session) {
                    println!("{line}");
                }
            }
            event = events.recv() => match event {
                Ok(ClientEvent::Closed { reason }) => {
                    println!("Disconnected: {reason}");
                    break;
                }
                Ok(ClientEvent::Errored(error)) => println!("error: {error}"),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    connected.shutdown().await
}

async fn execute(
    client: &RoomClient<WsTransport>,
    name: &str,
    command: ReplCommand,
    renderer: &mut Renderer,
) -> Result<(), ClientError> {
    match command {
        ReplCommand::Rooms => {
            renderer.request_roster();
            client.refresh_room_list().await?;
        }
        ReplCommand::Create { password } => client.create_room(name, password.as_deref()).await?,
        ReplCommand::Join { room_id, password } => {
            let session = client.snapshot().await;
            if let Some(warning) = join_warning(&session, &room_id, name, password.is_some()) {
                println!("{warning}");
            }
            client.join_room(&room_id, name, password.as_deref()).await?
        }
        ReplCommand::Info { room_id } => {
            if let Some(room) = client.snapshot().await.find_room(&room_id) {
                format_members(room).iter().for_each(|line| println!("{line}"));
            }
            renderer.request_info(&room_id);
            client.request_room_info(&room_id).await?;
        }
        ReplCommand::Leave => {
            if client.snapshot().await.current_room().is_none() {
                println!("not in a room");
            }
            client.leave_room(name).await?;
        }
        ReplCommand::Destroy { room_id } => {
            let target = match room_id {
                Some(id) => Some(id),
                None => client.snapshot().await.current_room_id().map(str::to_owned),
            };
            match target {
                Some(id) => client.destroy_room(&id).await?,
                None => println!("not in a room; use /destroy <id>"),
            }
        }
        ReplCommand::Who => match client.snapshot().await.current_room() {
            Some(room) => format_members(room).iter().for_each(|line| println!("{line}")),
            None => println!("not in a room"),
        },
        ReplCommand::Help => println!("{HELP}"),
        ReplCommand::Say(text) => {
            if client.snapshot().await.current_room().is_none() {
                println!("not in a room; /join or /create one to chat");
            }
            client.send_message(name, &text).await?;
        }
        // Handled by the input loop
        ReplCommand::Quit => {}
    }
    Ok(())
}
