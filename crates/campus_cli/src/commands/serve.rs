//! Serve command implementation.

use campus_sync_server::{BackpressurePolicy, NotificationServer, ServerConfig, SyncServer};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

/// Runs both servers until Ctrl-C.
pub async fn run(
    data_root: &Path,
    bind_addr: SocketAddr,
    notify_addr: SocketAddr,
    queue_depth: usize,
    reject_when_full: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let backpressure = if reject_when_full {
        BackpressurePolicy::Reject
    } else {
        BackpressurePolicy::Block
    };
    let config = ServerConfig::new(data_root)
        .with_bind_addr(bind_addr)
        .with_notify_addr(notify_addr)
        .with_queue_depth(queue_depth)
        .with_backpressure(backpressure);

    let notify = NotificationServer::bind(&config).await?;
    let sync = SyncServer::bind(config).await?;
    info!(root = %data_root.display(), "serving");

    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let (mut sync_stop, mut notify_stop) = (stop_rx.clone(), stop_rx);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
        }
        let _ = stop_tx.send(true);
    });

    tokio::try_join!(
        sync.run_until(async move {
            let _ = sync_stop.changed().await;
        }),
        notify.run_until(async move {
            let _ = notify_stop.changed().await;
        }),
    )?;
    Ok(())
}
