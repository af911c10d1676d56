//! List the rooms on the server.

use anyhow::{Context, Result};

use super::Connected;
use crate::config::CliConfig;
use crate::render::format_roster;

/// Run the rooms command.
pub async fn run(config: &CliConfig) -> Result<()> {
    let connected = Connected::open(config).await?;
    let client = &connected.client;

    let mut snapshots = client.subscribe();
    client.refresh_room_list().await?;

    tokio::time::timeout(config.server.connect_timeout(), snapshots.changed())
        .await
        .context("Timed out waiting for the room list")?
        .context("Client stopped before the room list arrived")?;

    let session = snapshots.borrow_and_update().clone();
    for error in session.errors() {
        println!("server error: {error}");
    }
    println!("Rooms on {}:", config.server.url);
    for line in format_roster(session.roster()) {
        println!("{line}");
    }

    connected.shutdown().await
}
