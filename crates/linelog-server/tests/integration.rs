//! End-to-end tests against a loopback server

use std::net::SocketAddr;
use std::time::Duration;

use linelog_server::{LinelogServer, ServerConfig, ServerReport, StoreConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<ServerReport>,
}

impl Harness {
    async fn start(store: StoreConfig) -> Self {
        let config = ServerConfig::default()
            .with_bind_addr("127.0.0.1:0".parse().unwrap())
            .with_store(store);
        let server = LinelogServer::bind(&config).await.unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_token();
        let handle = tokio::spawn(async move { server.run().await.unwrap() });
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    async fn connect(&self) -> TcpStream {
        timeout(WAIT, TcpStream::connect(self.addr))
            .await
            .unwrap()
            .unwrap()
    }

    async fn stop(self) -> ServerReport {
        self.shutdown.cancel();
        timeout(WAIT, self.handle).await.unwrap().unwrap()
    }
}

async fn send_and_expect(stream: &mut TcpStream, data: &[u8], expected: &[u8]) {
    stream.write_all(data).await.unwrap();
    let mut reply = vec![0u8; expected.len()];
    timeout(WAIT, stream.read_exact(&mut reply))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply, expected);
}

#[tokio::test]
async fn test_echoes_full_log_after_each_chunk() {
    let harness = Harness::start(StoreConfig::default()).await;
    let mut client = harness.connect().await;

    send_and_expect(&mut client, b"abc\n", b"abc\n").await;
    send_and_expect(&mut client, b"def\n", b"abc\ndef\n").await;

    drop(client);
    let report = harness.stop().await;
    assert_eq!(report.connections_served, 1);
    let teardown = report.teardown.unwrap();
    assert_eq!(teardown.records_released, 2);
    assert_eq!(teardown.bytes_released, 8);
}

#[tokio::test]
async fn test_partial_line_not_echoed_until_terminated() {
    let harness = Harness::start(StoreConfig::default()).await;
    let mut client = harness.connect().await;

    // The unterminated chunk leaves the log empty, so nothing comes back.
    client.write_all(b"hel").await.unwrap();
    let mut probe = [0u8; 16];
    let early = timeout(Duration::from_millis(200), client.read(&mut probe)).await;
    assert!(early.is_err(), "partial record must not be echoed");

    send_and_expect(&mut client, b"lo\n", b"hello\n").await;

    drop(client);
    harness.stop().await;
}

#[tokio::test]
async fn test_ring_evicts_oldest_over_tcp() {
    let harness = Harness::start(StoreConfig::Ring { capacity: 2 }).await;
    let mut client = harness.connect().await;

    send_and_expect(&mut client, b"one\n", b"one\n").await;
    send_and_expect(&mut client, b"two\n", b"one\ntwo\n").await;
    send_and_expect(&mut client, b"three\n", b"two\nthree\n").await;

    drop(client);
    let report = harness.stop().await;
    assert_eq!(report.teardown.unwrap().records_released, 2);
}

#[tokio::test]
async fn test_multiple_lines_in_one_chunk() {
    let harness = Harness::start(StoreConfig::Unbounded).await;
    let mut client = harness.connect().await;

    send_and_expect(&mut client, b"a\nb\nc", b"a\nb\n").await;
    send_and_expect(&mut client, b"\n", b"a\nb\nc\n").await;

    drop(client);
    harness.stop().await;
}

#[tokio::test]
async fn test_clients_share_one_log() {
    let harness = Harness::start(StoreConfig::Unbounded).await;

    let mut first = harness.connect().await;
    send_and_expect(&mut first, b"from first\n", b"from first\n").await;
    drop(first);

    let mut second = harness.connect().await;
    send_and_expect(&mut second, b"from second\n", b"from first\nfrom second\n").await;
    drop(second);

    let report = harness.stop().await;
    assert_eq!(report.connections_served, 2);
    assert_eq!(report.teardown.unwrap().records_released, 2);
}

#[tokio::test]
async fn test_shutdown_closes_idle_connections() {
    let harness = Harness::start(StoreConfig::default()).await;
    let mut client = harness.connect().await;
    send_and_expect(&mut client, b"kept\n", b"kept\n").await;

    // The client stays connected; shutdown must still drain its worker.
    let report = harness.stop().await;
    assert_eq!(report.connections_served, 1);
    assert_eq!(report.teardown.unwrap().records_released, 1);

    let mut rest = Vec::new();
    let read = timeout(WAIT, client.read_to_end(&mut rest))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(read, 0);
}
