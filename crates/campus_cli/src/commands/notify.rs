//! Notification commands: announce, deadline, deadlines, upload, listen.

use campus_core::{Announcement, Deadline};
use campus_sync_client::{ClientConfig, NotificationClient};
use std::path::Path;

async fn connect(config: &ClientConfig) -> Result<NotificationClient, Box<dyn std::error::Error>> {
    Ok(NotificationClient::connect(config.notify_addr, config.connect_timeout).await?)
}

/// Posts an announcement stamped with the local time.
pub async fn announce(
    config: &ClientConfig,
    course: &str,
    author: &str,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = connect(config).await?;
    let post = Announcement::new(course, author, message);
    client.announce(&post).await?;
    client.close().await?;
    println!("Announced: {}", post.to_line());
    Ok(())
}

/// Submits a deadline and reports the acknowledgement.
pub async fn deadline(
    config: &ClientConfig,
    course: &str,
    task: &str,
    kind: &str,
    due: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let due = Deadline::parse_date(due).ok_or_else(|| format!("Invalid date: {due}"))?;
    let mut client = connect(config).await?;
    let status = client
        .save_deadline(&Deadline::new(course, task, kind, due))
        .await?;
    client.close().await?;
    if status.is_saved() {
        println!("✓ Deadline saved");
        Ok(())
    } else {
        Err("Server failed to save the deadline".into())
    }
}

/// Lists the deadlines for one course.
pub async fn deadlines(
    config: &ClientConfig,
    course: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = connect(config).await?;
    let list = client.deadlines_for(course).await?;
    client.close().await?;
    if list.is_empty() {
        println!("No deadlines for {course}");
    }
    for d in list {
        println!("  {}  {:<12} {}", d.due_date, d.kind, d.task_name);
    }
    Ok(())
}

/// Uploads one file for a course.
pub async fn upload(
    config: &ClientConfig,
    course: &str,
    file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = connect(config).await?;
    client.upload_file(course, file).await?;
    client.close().await?;
    println!("Uploaded {} for {course}", file.display());
    Ok(())
}

/// Prints announcements until the server closes or Ctrl-C.
pub async fn listen(
    config: &ClientConfig,
    course: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = connect(config).await?;
    println!("Listening on {}", config.notify_addr);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = client.next_announcement() => match next? {
                Some(post) if course.map_or(true, |c| post.is_for(c)) => {
                    println!(
                        "[{}] {} ({}): {}",
                        post.course_id, post.author, post.timestamp, post.message
                    );
                }
                Some(_) => {}
                None => {
                    println!("Server closed the connection");
                    break;
                }
            },
        }
    }
    Ok(())
}
