//! Login command implementation.

use campus_core::Role;
use campus_sync_client::{ClientConfig, Loader};

/// Loads a session and checks the login against it.
pub async fn run(
    config: ClientConfig,
    role: Role,
    id: i64,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut loader = Loader::new(config);
    loader.reload_all().await;
    match loader.login(role, id, password)? {
        Some(user) => {
            println!("Logged in as {} {}", user.role, user.id);
            Ok(())
        }
        None => Err(format!("Login failed for {role} {id}").into()),
    }
}
