//! Integration tests for the relay server over real loopback TCP.
//!
//! # Purpose
//!
//! These tests run a [`RelayServer`] on an ephemeral port and talk to it with
//! plain `TcpStream`s speaking the wire format by hand.  They verify:
//!
//! - Fan-out: a message from one client reaches every client, sender included.
//! - Replay: a newcomer first receives the most recent history, oldest first.
//! - Cleanup: departed or misbehaving clients leave the registry.
//! - Slow consumers: a client that stops reading is dropped without
//!   affecting the others.
//!
//! Registry membership is observed through [`RelayServer::registry`], which
//! removes any need for sleeps tuned to scheduler timing.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use relay_core::{decode_header, encode_frame, HEADER_LENGTH, MAX_BODY_LENGTH};
use relay_server::application::broadcast::BroadcastRegistry;
use relay_server::application::history::HISTORY_CAPACITY;
use relay_server::infrastructure::network::listener::RelayServer;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpSocket, TcpStream};
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout};
use tokio_test::assert_ok;

const WAIT: Duration = Duration::from_secs(10);

// ── Helpers ───────────────────────────────────────────────────────────────────

struct TestRelay {
    addr: std::net::SocketAddr,
    registry: Arc<BroadcastRegistry>,
}

async fn start_relay(outbound_queue_limit: usize) -> TestRelay {
    let server = RelayServer::bind("127.0.0.1:0".parse().unwrap(), outbound_queue_limit)
        .await
        .expect("bind relay");
    let relay = TestRelay {
        addr: server.local_addr(),
        registry: server.registry(),
    };
    tokio::spawn(server.run(Arc::new(AtomicBool::new(true))));
    relay
}

/// Polls until the registry holds exactly `count` members.
async fn wait_for_members(registry: &BroadcastRegistry, count: usize) {
    timeout(WAIT, async {
        while registry.member_count() != count {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "registry never reached {count} members (has {})",
            registry.member_count()
        )
    });
}

/// Connects and waits until the relay has registered the new session.
async fn connect(relay: &TestRelay) -> TcpStream {
    let expected = relay.registry.member_count() + 1;
    let stream = TcpStream::connect(relay.addr).await.expect("connect");
    wait_for_members(&relay.registry, expected).await;
    stream
}

async fn send(stream: &mut TcpStream, text: &str) {
    stream
        .write_all(&encode_frame(text.as_bytes()))
        .await
        .expect("send frame");
}

/// Reads one frame and returns its body.
async fn read_body<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let mut header = [0u8; HEADER_LENGTH];
    reader.read_exact(&mut header).await?;
    let len = decode_header(&header).expect("relay sent a valid header");
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

async fn recv(stream: &mut TcpStream) -> String {
    let body = timeout(WAIT, read_body(stream))
        .await
        .expect("timed out waiting for a frame");
    String::from_utf8(assert_ok!(body)).unwrap()
}

/// Reads and discards until the relay closes the connection.
async fn read_until_closed(stream: &mut TcpStream) {
    let mut sink = vec![0u8; 64 * 1024];
    timeout(WAIT, async {
        while matches!(stream.read(&mut sink).await, Ok(n) if n > 0) {}
    })
    .await
    .expect("relay never closed the connection");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// B joins, A joins, A sends "hello": both receive it and B's replay was empty.
#[tokio::test]
async fn test_message_reaches_every_client_including_sender() {
    // Arrange
    let relay = start_relay(1024).await;
    let mut b = connect(&relay).await;
    let mut a = connect(&relay).await;

    // Act
    send(&mut a, "hello").await;

    // Assert: the first frame either client sees is the live message
    assert_eq!(recv(&mut a).await, "hello");
    assert_eq!(recv(&mut b).await, "hello");
}

#[tokio::test]
async fn test_messages_from_one_client_arrive_in_order_everywhere() {
    let relay = start_relay(1024).await;
    let mut a = connect(&relay).await;
    let mut b = connect(&relay).await;

    for i in 0..20 {
        send(&mut a, &format!("line {i}")).await;
    }

    for i in 0..20 {
        assert_eq!(recv(&mut a).await, format!("line {i}"));
        assert_eq!(recv(&mut b).await, format!("line {i}"));
    }
}

#[tokio::test]
async fn test_newcomer_receives_last_100_messages_oldest_first() {
    // Arrange: 150 messages relayed (and echoed) before the newcomer arrives
    let relay = start_relay(1024).await;
    let mut a = connect(&relay).await;
    for i in 0..150 {
        send(&mut a, &format!("m{i}")).await;
    }
    for i in 0..150 {
        assert_eq!(recv(&mut a).await, format!("m{i}"));
    }

    // Act
    let mut newcomer = connect(&relay).await;

    // Assert
    for i in 150 - HISTORY_CAPACITY..150 {
        assert_eq!(recv(&mut newcomer).await, format!("m{i}"));
    }
    send(&mut a, "live").await;
    assert_eq!(recv(&mut newcomer).await, "live");
}

#[tokio::test]
async fn test_replay_is_complete_even_with_small_queue_limit() {
    // Arrange: a limit far below the history a newcomer is owed
    let relay = start_relay(4).await;
    let mut a = connect(&relay).await;
    for i in 0..10 {
        send(&mut a, &format!("m{i}")).await;
        assert_eq!(recv(&mut a).await, format!("m{i}"));
    }

    // Act
    let mut newcomer = connect(&relay).await;

    // Assert: every stored message arrives and the newcomer stays connected
    for i in 0..10 {
        assert_eq!(recv(&mut newcomer).await, format!("m{i}"));
    }
    assert_eq!(relay.registry.member_count(), 2);
    send(&mut a, "after replay").await;
    assert_eq!(recv(&mut newcomer).await, "after replay");
}

#[tokio::test]
async fn test_departed_client_is_removed_and_others_keep_relaying() {
    // Arrange
    let relay = start_relay(1024).await;
    let mut a = connect(&relay).await;
    let b = connect(&relay).await;

    // Act
    drop(b);
    wait_for_members(&relay.registry, 1).await;
    send(&mut a, "still here").await;

    // Assert
    assert_eq!(recv(&mut a).await, "still here");
    assert_eq!(relay.registry.member_count(), 1);
}

#[tokio::test]
async fn test_oversized_header_disconnects_only_the_offender() {
    // Arrange
    let relay = start_relay(1024).await;
    let mut good = connect(&relay).await;
    let mut bad = connect(&relay).await;

    // Act
    bad.write_all(b" 513").await.unwrap();

    // Assert: the server closes the offender's connection...
    let mut buf = [0u8; 16];
    let n = timeout(WAIT, bad.read(&mut buf)).await.unwrap().unwrap_or(0);
    assert_eq!(n, 0);
    wait_for_members(&relay.registry, 1).await;

    // ...and the other client is unaffected
    send(&mut good, "ok").await;
    assert_eq!(recv(&mut good).await, "ok");
}

#[tokio::test]
async fn test_malformed_header_disconnects_client() {
    let relay = start_relay(1024).await;
    let mut bad = connect(&relay).await;

    bad.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

    wait_for_members(&relay.registry, 0).await;
    assert!(relay.registry.history().is_empty());
}

#[tokio::test]
async fn test_zero_length_message_is_relayed() {
    let relay = start_relay(1024).await;
    let mut a = connect(&relay).await;

    a.write_all(b"   0").await.unwrap();

    assert_eq!(recv(&mut a).await, "");
}

#[tokio::test]
async fn test_separate_ports_are_separate_rooms() {
    let room1 = start_relay(1024).await;
    let room2 = start_relay(1024).await;
    let mut a = connect(&room1).await;
    let mut b = connect(&room2).await;

    send(&mut a, "room one").await;
    send(&mut b, "room two").await;

    assert_eq!(recv(&mut a).await, "room one");
    assert_eq!(recv(&mut b).await, "room two");
    assert_eq!(room1.registry.history().len(), 1);
    assert_eq!(room2.registry.history().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_client_that_stops_reading_is_dropped() {
    // Arrange: a slow client with a tiny receive buffer that never reads
    let relay = start_relay(1024).await;
    let socket = TcpSocket::new_v4().unwrap();
    socket.set_recv_buffer_size(4096).unwrap();
    let expected = relay.registry.member_count() + 1;
    let mut slow = socket.connect(relay.addr).await.unwrap();
    wait_for_members(&relay.registry, expected).await;

    let flooder = connect(&relay).await;
    let (flood_rx, mut flood_tx) = flooder.into_split();
    // The flooder keeps reading its own echoes and reports when "done" arrives.
    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(async move {
        let mut reader = BufReader::with_capacity(64 * 1024, flood_rx);
        while let Ok(body) = read_body(&mut reader).await {
            if body == b"done" {
                let _ = done_tx.send(());
                return;
            }
        }
    });

    // Act: maximum-size frames until one session is dropped
    let frame = encode_frame(&[b'x'; MAX_BODY_LENGTH]);
    let chunk: Vec<u8> = frame.iter().copied().cycle().take(frame.len() * 100).collect();
    timeout(WAIT, async {
        while relay.registry.member_count() > 1 {
            flood_tx.write_all(&chunk).await.expect("flooder still connected");
        }
    })
    .await
    .expect("no session was dropped");
    assert_ok!(flood_tx.write_all(&encode_frame(b"done")).await);

    // Assert: the flooder is still relayed to...
    timeout(WAIT, done_rx)
        .await
        .expect("flooder never received its later message")
        .expect("flooder connection ended");
    assert_eq!(relay.registry.member_count(), 1);

    // ...and the slow client is the one that was closed
    read_until_closed(&mut slow).await;
}
