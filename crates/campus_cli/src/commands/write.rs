//! Write command implementation.

use campus_sync_client::{ClientConfig, Writer};

/// Sends one line. Success means it was sent, not that it was stored.
pub async fn run(
    config: &ClientConfig,
    path: &str,
    line: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    Writer::new(config).write_line(path, line).await?;
    println!("Sent {line:?} to {path}");
    Ok(())
}
