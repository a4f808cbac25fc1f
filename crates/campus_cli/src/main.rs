//! Campus CLI
//!
//! Runs the sync and notification servers, and drives the client side
//! from a terminal.
//!
//! # Commands
//!
//! - `serve` - Run both servers over a data root
//! - `load` - Load a session (server first, local files on failure)
//! - `write` - Send one line to the sync server
//! - `login` - Check a login against a loaded session
//! - `announce` - Post an announcement
//! - `deadline` - Submit a deadline
//! - `deadlines` - List deadlines for a course
//! - `upload` - Upload a file for a course
//! - `listen` - Print announcements as they arrive

mod commands;

use campus_core::Role;
use campus_sync_client::ClientConfig;
use campus_sync_protocol::{DEFAULT_NOTIFY_ADDR, DEFAULT_SYNC_ADDR};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Campus data sync server and client.
#[derive(Parser)]
#[command(name = "campus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data root holding `database/` and `uploaded_files/`
    #[arg(global = true, short = 'd', long, default_value = ".")]
    data_root: PathBuf,

    /// Sync server address
    #[arg(global = true, long, default_value = DEFAULT_SYNC_ADDR)]
    server: SocketAddr,

    /// Notification server address
    #[arg(global = true, long, default_value = DEFAULT_NOTIFY_ADDR)]
    notify: SocketAddr,

    /// Connect timeout in milliseconds
    #[arg(global = true, long)]
    timeout_ms: Option<u64>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Account kind accepted on the command line.
#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Student,
    Teacher,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Student => Role::Student,
            RoleArg::Teacher => Role::Teacher,
            RoleArg::Admin => Role::Admin,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync and notification servers
    Serve {
        /// Requests buffered per connection
        #[arg(long, default_value = "256")]
        queue_depth: usize,

        /// Drop requests instead of waiting when a queue is full
        #[arg(long)]
        reject_when_full: bool,
    },

    /// Load a session and print it
    Load {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Send one line to the sync server
    Write {
        /// Path relative to the data root, e.g. database/enrollments.txt
        path: String,
        /// The line to write
        line: String,
    },

    /// Check a login against a freshly loaded session
    Login {
        /// Account kind
        #[arg(value_enum)]
        role: RoleArg,
        /// Numeric id
        id: i64,
        /// Password
        password: String,
    },

    /// Post an announcement to every connected client
    Announce {
        /// Course id
        course: String,
        /// Author name
        author: String,
        /// Message text
        message: String,
    },

    /// Submit a deadline
    Deadline {
        /// Course id
        course: String,
        /// Task name
        task: String,
        /// Task kind, e.g. Assignment or Exam
        kind: String,
        /// Due date, YYYY-MM-DD
        due: String,
    },

    /// List deadlines for a course
    Deadlines {
        /// Course id
        course: String,
    },

    /// Upload a file for a course
    Upload {
        /// Course id
        course: String,
        /// File to upload
        file: PathBuf,
    },

    /// Print announcements as they arrive
    Listen {
        /// Only print announcements for this course
        #[arg(short, long)]
        course: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut client = ClientConfig::new(&cli.data_root)
        .with_server_addr(cli.server)
        .with_notify_addr(cli.notify);
    if let Some(ms) = cli.timeout_ms {
        client = client.with_connect_timeout(Duration::from_millis(ms));
    }

    match cli.command {
        Commands::Serve {
            queue_depth,
            reject_when_full,
        } => {
            commands::serve::run(
                &cli.data_root,
                cli.server,
                cli.notify,
                queue_depth,
                reject_when_full,
            )
            .await?;
        }
        Commands::Load { format } => commands::load::run(client, &format).await?,
        Commands::Write { path, line } => commands::write::run(&client, &path, &line).await?,
        Commands::Login { role, id, password } => {
            commands::login::run(client, role.into(), id, &password).await?;
        }
        Commands::Announce {
            course,
            author,
            message,
        } => commands::notify::announce(&client, &course, &author, &message).await?,
        Commands::Deadline {
            course,
            task,
            kind,
            due,
        } => commands::notify::deadline(&client, &course, &task, &kind, &due).await?,
        Commands::Deadlines { course } => commands::notify::deadlines(&client, &course).await?,
        Commands::Upload { course, file } => {
            commands::notify::upload(&client, &course, &file).await?
        }
        Commands::Listen { course } => commands::notify::listen(&client, course.as_deref()).await?,
    }

    Ok(())
}
