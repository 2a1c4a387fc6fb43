//! `gpsfeed listen` - connect to a location server and print what arrives.

use std::sync::Arc;

use clap::Args;
use gpsfeed::config::ConfigFile;
use gpsfeed::feed::FeedMode;
use gpsfeed::stream::{ClientCommand, StreamListener, StreamingLocationClient};

use super::common::wait_for_exit;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ListenArgs {
    /// Server URL (default: [stream] endpoint from the config file)
    #[arg(long)]
    pub url: Option<String>,

    /// Update rate to request from the server
    #[arg(long)]
    pub hz: Option<u32>,

    /// Ask the server to switch to this mode once connected
    #[arg(long)]
    pub mode: Option<FeedMode>,
}

/// Prints client events to the terminal.
struct ConsolePrinter;

impl StreamListener for ConsolePrinter {
    fn on_location_update(&self, latitude: f64, longitude: f64) {
        println!("{:.6}, {:.6}", latitude, longitude);
    }

    fn on_connection_status_changed(&self, connected: bool) {
        if connected {
            eprintln!("-- connected");
        } else {
            eprintln!("-- disconnected");
        }
    }

    fn on_error(&self, message: &str) {
        eprintln!("-- error: {}", message);
    }
}

pub async fn run(args: ListenArgs, config: &ConfigFile) -> Result<(), CliError> {
    let mut client_config = config.client_config();
    if let Some(url) = args.url {
        client_config.endpoint = url;
    }
    if let Some(hz) = args.hz {
        client_config.subscribe_hz = hz.max(1);
    }

    tracing::info!(endpoint = %client_config.endpoint, "Listening for locations");

    let client = StreamingLocationClient::spawn(client_config, Arc::new(ConsolePrinter));
    client.connect();

    if let Some(mode) = args.mode {
        let mut status = client.subscribe();
        tokio::select! {
            _ = wait_for_exit(None) => {
                client.dispose().await;
                return Ok(());
            }
            connected = async { status.wait_for(|s| s.is_connected()).await.is_ok() } => {
                if connected {
                    if let Err(e) = client.send_command(&ClientCommand::set_mode(mode)) {
                        tracing::warn!(error = %e, "Failed to send mode change");
                    }
                }
            }
        }
    }

    wait_for_exit(None).await;

    let status = client.status();
    client.dispose().await;
    tracing::info!(
        reconnect_attempts = status.reconnect_attempts,
        "Listener stopped"
    );
    Ok(())
}
