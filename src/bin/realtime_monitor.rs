//! Real-time channel monitor
//!
//! Connects to the dashboard's real-time endpoint, subscribes to the
//! requested event types and logs every payload and lifecycle event.
//!
//! Usage:
//!   cargo run --bin realtime_monitor -- [event.type ...]
//!
//! Event types given on the command line are added to the `subscriptions`
//! list from the settings file.
//!
//! Environment variables:
//!   REALTIME_CONFIG_PATH - Settings file (default: config/realtime.yaml)
//!   REALTIME_WS_URL      - Overrides the endpoint URL
//!   RUST_LOG             - Overrides the configured log level

use anyhow::{Context, Result};
use campus_admin::bin_common::{
    init_tracing, load_config_from_env, parse_args, ChannelSettings, ConfigType,
};
use campus_admin::realtime_channel::{ChannelClient, ClientEvent, Subscription};
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenv::dotenv().ok();

    // Load config first (before logging is initialized)
    let config_path = load_config_from_env(ConfigType::Realtime);
    let mut settings = ChannelSettings::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    for kind in parse_args() {
        if !settings.subscriptions.contains(&kind) {
            settings.subscriptions.push(kind);
        }
    }

    init_tracing(&settings.log_level);
    settings.log();

    let client = settings.build_client()?;
    let _subscriptions = subscribe_all(&client, &settings.subscriptions);

    print_banner("Realtime Monitor", &settings);

    if let Err(e) = client.connect().await {
        error!("Initial connect failed: {}", e);
        return Err(e.into());
    }
    client.send("presence.join", &json!({ "view": "monitor" }));

    let events = client.event_receiver();
    let mut ticker = tokio::time::interval(Duration::from_millis(200));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            _ = ticker.tick() => {
                while let Ok(event) = events.try_recv() {
                    log_event(&event);
                    if matches!(event, ClientEvent::ReconnectExhausted { .. }) {
                        warn!("Automatic reconnection gave up; exiting");
                        client.disconnect();
                        print_shutdown("Realtime monitor", &client);
                        return Ok(());
                    }
                }
            }
        }
    }

    client.disconnect();
    print_shutdown("Realtime monitor", &client);
    Ok(())
}

fn subscribe_all(client: &ChannelClient, kinds: &[String]) -> Vec<Subscription> {
    kinds
        .iter()
        .map(|kind| {
            let label = kind.clone();
            client.subscribe(kind, move |payload| {
                info!("[{}] {}", label, payload);
                Ok(())
            })
        })
        .collect()
}

fn log_event(event: &ClientEvent) {
    match event {
        ClientEvent::Connected => info!("Channel connected"),
        ClientEvent::Disconnected => warn!("Channel disconnected"),
        ClientEvent::Reconnecting { attempt, delay } => {
            info!("Reconnect attempt {} in {:?}", attempt, delay)
        }
        ClientEvent::ReconnectExhausted { attempts } => {
            error!("Gave up after {} reconnect attempts", attempts)
        }
        ClientEvent::Error(e) => error!("Channel error: {}", e),
    }
}

fn print_banner(name: &str, settings: &ChannelSettings) {
    info!("");
    info!("========================================");
    info!("Starting {}", name);
    info!("Endpoint: {}", settings.url);
    info!("Watching {} event types", settings.subscriptions.len());
    info!("Press Ctrl+C to stop");
    info!("========================================");
    info!("");
}

fn print_shutdown(name: &str, client: &ChannelClient) {
    let metrics = client.metrics();
    info!("");
    info!("========================================");
    info!("{} stopped gracefully", name);
    info!(
        "Received {} frames ({} undecodable), sent {}, dropped {}, reconnects {}",
        metrics.messages_received,
        metrics.decode_errors,
        metrics.messages_sent,
        metrics.messages_dropped,
        metrics.reconnect_count
    );
    info!("========================================");
}
