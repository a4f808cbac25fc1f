//! Load command implementation.

use campus_core::{Catalog, RosterMember};
use campus_sync_client::{ClientConfig, LoadSource, Loader};
use serde::Serialize;

/// Summary printed for `--format json`.
#[derive(Debug, Serialize)]
pub struct LoadReport<'a> {
    /// `server` or `local`.
    pub source: &'static str,
    /// When the load finished, RFC 3339.
    pub loaded_at: String,
    /// The loaded collections.
    pub catalog: &'a Catalog,
}

/// Loads a session and prints it.
pub async fn run(config: ClientConfig, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut loader = Loader::new(config);
    let session = loader.reload_all().await;
    let source = match session.source {
        LoadSource::Server => "server",
        LoadSource::Local => "local",
    };

    match format {
        "json" => {
            let report = LoadReport {
                source,
                loaded_at: session.loaded_at.to_rfc3339(),
                catalog: &session.catalog,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "text" => {
            println!("Loaded from {source} at {}", session.loaded_at.format("%Y-%m-%d %H:%M:%S"));
            println!();
            print!("{}", session.catalog.render());
            println!();
            for student in &session.catalog.students {
                if let Some(credits) = session.catalog.total_credits(student.id()) {
                    println!("  {} {}: {} credits", student.id(), student.name(), credits);
                }
            }
        }
        other => return Err(format!("Unknown format: {other}").into()),
    }
    Ok(())
}
