//! CLI command implementations.

pub mod rooms;
pub mod session;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;

use roomsync_client::{ClientError, RoomClient, WsTransport};

use crate::config::CliConfig;

/// A connected client with its receive loop running in the background.
pub struct Connected {
    pub client: Arc<RoomClient<WsTransport>>,
    receiver: JoinHandle<Result<(), ClientError>>,
}

impl Connected {
    /// Connect to the configured server and start receiving.
    pub async fn open(config: &CliConfig) -> Result<Self> {
        let client = Arc::new(RoomClient::new(config.client_config(), WsTransport::new()));
        client
            .connect()
            .await
            .with_context(|| format!("Failed to connect to {}", config.server.url))?;

        let receiver = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.run().await }
        });

        Ok(Self { client, receiver })
    }

    /// Close the connection and wait for the receive loop to finish.
    pub async fn shutdown(self) -> Result<()> {
        self.client.close().await.context("Failed to close connection")?;
        match self.receiver.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "receive loop ended with error"),
            Err(e) => tracing::debug!(error = %e, "receive loop task failed"),
        }
        Ok(())
    }
}
