//! End-to-end tests for the notification channel.

use bytes::Bytes;
use campus_core::{Deadline, NaiveDate};
use campus_sync_protocol::{AckStatus, Connection, WireMessage};
use campus_sync_server::{NotificationServer, ServerConfig};
use campus_testkit::TestDataRoot;
use std::net::SocketAddr;
use std::time::Duration;

async fn start(root: &TestDataRoot) -> SocketAddr {
    let config = ServerConfig::new(root.path()).with_notify_addr("127.0.0.1:0".parse().unwrap());
    let server = NotificationServer::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

/// Connects and completes one round trip, so the server has registered
/// the client before the test continues.
async fn join(addr: SocketAddr) -> Connection {
    let mut conn = Connection::connect(addr, None).await.unwrap();
    assert!(query(&mut conn, "NONE").await.is_empty());
    conn
}

async fn query(conn: &mut Connection, course_id: &str) -> Vec<Deadline> {
    conn.send(&WireMessage::DeadlineQuery {
        course_id: course_id.into(),
    })
    .await
    .unwrap();
    match conn.receive_required().await.unwrap() {
        WireMessage::DeadlineList(list) => list,
        other => panic!("expected deadline list, got {}", other.name()),
    }
}

fn hw1() -> Deadline {
    Deadline::new(
        "CSE101",
        "HW1",
        "Assignment",
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
    )
}

#[tokio::test]
async fn deadline_is_acked_and_queryable_elsewhere() {
    let root = TestDataRoot::empty();
    let addr = start(&root).await;

    let mut teacher = join(addr).await;
    teacher.send(&WireMessage::Deadline(hw1())).await.unwrap();
    match teacher.receive_required().await.unwrap() {
        WireMessage::Ack(status) => assert_eq!(status, AckStatus::Saved),
        other => panic!("expected ack, got {}", other.name()),
    }

    let mut student = join(addr).await;
    let found = query(&mut student, "cse101").await;
    assert_eq!(found, vec![hw1()]);
    assert_eq!(
        root.read_file("deadlines.txt"),
        vec!["CSE101;HW1;Assignment;2030-01-01"]
    );
}

#[tokio::test]
async fn announcement_reaches_each_connected_client_once() {
    let root = TestDataRoot::empty();
    let addr = start(&root).await;
    let text = "CSE101;Bob;Midterm moved;2030-01-01T10:00";

    let mut a = join(addr).await;
    let mut b = join(addr).await;
    a.send(&WireMessage::announcement(text)).await.unwrap();

    for conn in [&mut a, &mut b] {
        match conn.receive_required().await.unwrap() {
            WireMessage::Announcement { text: got } => assert_eq!(got, text),
            other => panic!("expected announcement, got {}", other.name()),
        }
        // The next reply must be the query answer, not a second copy.
        assert!(query(conn, "NONE").await.is_empty());
    }

    let mut late = join(addr).await;
    let nothing = tokio::time::timeout(Duration::from_millis(200), late.receive()).await;
    assert!(nothing.is_err(), "late client received a replay");

    assert_eq!(root.read_file("CourseAnnouncements.txt"), vec![text]);
}

#[tokio::test]
async fn save_deadline_ack_goes_to_sender_only() {
    let root = TestDataRoot::empty();
    let addr = start(&root).await;

    let mut sender = join(addr).await;
    let mut other = join(addr).await;
    sender.send(&WireMessage::Deadline(hw1())).await.unwrap();
    assert!(matches!(
        sender.receive_required().await.unwrap(),
        WireMessage::Ack(AckStatus::Saved)
    ));
    // `other` sees its own query reply first, so no ack was queued for it.
    assert_eq!(query(&mut other, "CSE101").await.len(), 1);
}

#[tokio::test]
async fn upload_is_stored_and_indexed() {
    let root = TestDataRoot::empty();
    let addr = start(&root).await;
    let mut conn = join(addr).await;

    conn.send(&WireMessage::FileUpload {
        course_id: "CSE101".into(),
        file_name: "../slides.pdf".into(),
        bytes: Bytes::from_static(b"%PDF-1.7"),
    })
    .await
    .unwrap();
    query(&mut conn, "NONE").await;

    let stored = root.path().join("uploaded_files/CSE101/slides.pdf");
    assert_eq!(std::fs::read(stored).unwrap(), b"%PDF-1.7");
    assert_eq!(root.read_file("UploadedFiles.txt"), vec!["CSE101;slides.pdf"]);
}

#[tokio::test]
async fn disconnected_clients_are_dropped_from_broadcast() {
    let root = TestDataRoot::empty();
    let config = ServerConfig::new(root.path()).with_notify_addr("127.0.0.1:0".parse().unwrap());
    let server = NotificationServer::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let hub = server.hub();
    tokio::spawn(server.run());

    let gone = join(addr).await;
    let mut stays = join(addr).await;
    assert_eq!(hub.client_count(), 2);
    gone.close().await.unwrap();

    // Wait for the server to notice the EOF.
    for _ in 0..50 {
        if hub.client_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(hub.client_count(), 1);

    stays
        .send(&WireMessage::announcement("CSE101;Bob;Still here;t"))
        .await
        .unwrap();
    assert!(matches!(
        stays.receive_required().await.unwrap(),
        WireMessage::Announcement { .. }
    ));
}

#[tokio::test]
async fn deadline_with_delimiters_is_saved_as_one_row() {
    let root = TestDataRoot::empty();
    let addr = start(&root).await;
    let raw = Deadline {
        course_id: "CSE101".into(),
        task_name: "HW;1".into(),
        kind: "Assignment".into(),
        due_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
    };

    let mut teacher = join(addr).await;
    teacher.send(&WireMessage::Deadline(raw)).await.unwrap();
    match teacher.receive_required().await.unwrap() {
        WireMessage::Ack(status) => assert_eq!(status, AckStatus::Saved),
        other => panic!("expected ack, got {}", other.name()),
    }

    assert_eq!(
        root.read_file("deadlines.txt"),
        vec!["CSE101;HW 1;Assignment;2030-01-01"]
    );
    let mut student = join(addr).await;
    let found = query(&mut student, "CSE101").await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].task_name, "HW 1");
}

#[tokio::test]
async fn unreadable_deadline_file_still_gets_a_reply() {
    let root = TestDataRoot::empty();
    std::fs::create_dir_all(root.layout().deadlines()).unwrap();
    let addr = start(&root).await;

    let mut conn = join(addr).await;
    assert!(query(&mut conn, "CSE101").await.is_empty());
    assert!(query(&mut conn, "MAT201").await.is_empty());
}
