use anyhow::{Result, bail};
use peerly_config::Config;
use peerly_engine::{BookingService, BroadcastNotifier};
use peerly_server::PeerlyServer;
use peerly_storage::{MemoryBookingStore, load_directory};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

pub async fn handle(
    config: &Config,
    host: String,
    port: u16,
    directory: Option<PathBuf>,
    default_capacity: u32,
) -> Result<()> {
    let Some(directory) = directory else {
        bail!("no directory feed configured; pass --directory or set directory.path");
    };
    if default_capacity == 0 {
        bail!("default slot capacity must be positive");
    }

    let snapshot = load_directory(&directory).await?;
    let notifier = BroadcastNotifier::new(config.notifications.channel_capacity);
    spawn_notification_log(&notifier);

    let service = BookingService::new(
        snapshot,
        Arc::new(MemoryBookingStore::new()),
        Arc::new(notifier),
        default_capacity,
    );

    println!("Starting peerly server on {}:{}", host, port);
    PeerlyServer::serve(Arc::new(service), &host, port).await?;

    Ok(())
}

// Stands in for the messaging service until one is wired up
fn spawn_notification_log(notifier: &BroadcastNotifier) {
    let mut rx = notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notification) => info!(
                    kind = ?notification.kind,
                    booking = %notification.booking_id,
                    slot = %notification.slot_id,
                    recipients = notification.recipients.len(),
                    "notification"
                ),
                Err(RecvError::Lagged(skipped)) => warn!("notification log lagged, {} skipped", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });
}
