//! End-to-end tests for the socket and file command channels

use memory_bridge::core::types::Address;
use memory_bridge::inventory::InventoryLayout;
use memory_bridge::memory::ProcessMemory;
use memory_bridge::{BridgeContext, CommandServer, SnapshotMemory};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const BASE: usize = 0x2_0000_0000;

fn attached_context() -> Arc<BridgeContext<SnapshotMemory>> {
    let ctx = Arc::new(BridgeContext::new(InventoryLayout::default()));
    let session = ctx.attach(
        SnapshotMemory::builder()
            .pid(1234)
            .zeroed(BASE, 0x100)
            .build(),
    );
    session.set_pointer(Address::new(BASE)).unwrap();
    ctx
}

fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

/// Send a raw request and return (status code, body)
fn roundtrip(addr: SocketAddr, request: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream.write_all(request.as_bytes()).unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();

    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

fn post(addr: SocketAddr, path: &str, body: &str) -> (u16, String) {
    roundtrip(
        addr,
        &format!(
            concat!(
                "POST {} HTTP/1.1\r\n",
                "Host: localhost\r\n",
                "Content-Type: application/json\r\n",
                "Content-Length: {}\r\n\r\n{}"
            ),
            path,
            body.len(),
            body
        ),
    )
}

fn get(addr: SocketAddr, path: &str) -> (u16, String) {
    roundtrip(addr, &format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path))
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[test]
fn test_give_item_over_socket() {
    let ctx = attached_context();
    let session = ctx.session().unwrap();
    session
        .target()
        .write_i32(Address::new(BASE + 0xC), 10)
        .unwrap();

    let mut server = CommandServer::new(Arc::clone(&ctx));
    let addr = server
        .start_socket(loopback(), Duration::from_secs(5))
        .unwrap();

    let (status, body) = post(addr, "/give_item", r#"{"id":100,"qty":5}"#);
    assert_eq!(status, 200);
    assert_eq!(body, r#"{"success":true,"message":"Item granted"}"#);
    assert_eq!(
        session.target().read_i32(Address::new(BASE + 0x8)).unwrap(),
        100
    );
    assert_eq!(
        session.target().read_i32(Address::new(BASE + 0xC)).unwrap(),
        15
    );

    let (status, _) = post(addr, "/give_item", r#"{"id":0,"qty":5}"#);
    assert_eq!(status, 400);
    let (status, _) = get(addr, "/missing");
    assert_eq!(status, 404);

    let (status, body) = get(addr, "/status");
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["running"], true);
    assert_eq!(json["pid"], 1234);
    assert_eq!(json["inventoryPtr"], "0x200000000");

    server.stop();
    assert!(!server.is_running());
    assert!(TcpStream::connect_timeout(&addr, Duration::from_millis(200)).is_err());
}

#[test]
fn test_status_while_unattached() {
    let ctx: Arc<BridgeContext<SnapshotMemory>> =
        Arc::new(BridgeContext::new(InventoryLayout::default()));
    let mut server = CommandServer::new(Arc::clone(&ctx));
    let addr = server
        .start_socket(loopback(), Duration::from_secs(5))
        .unwrap();

    let (status, body) = get(addr, "/status");
    assert_eq!(status, 200);
    assert_eq!(
        body,
        r#"{"success":true,"running":false,"pid":0,"inventoryPtr":null}"#
    );

    let (status, body) = post(addr, "/give_item", r#"{"id":1,"qty":1}"#);
    assert_eq!(status, 500);
    assert!(body.contains(r#""success":false"#));
}

#[test]
fn test_concurrent_socket_grants() {
    let ctx = attached_context();
    let mut server = CommandServer::new(Arc::clone(&ctx));
    let addr = server
        .start_socket(loopback(), Duration::from_secs(5))
        .unwrap();

    let clients: Vec<_> = (0..8)
        .map(|_| thread::spawn(move || post(addr, "/give_item", r#"{"id":7,"qty":3}"#).0))
        .collect();
    for client in clients {
        assert_eq!(client.join().unwrap(), 200);
    }

    let session = ctx.session().unwrap();
    assert_eq!(
        session.target().read_i32(Address::new(BASE + 0xC)).unwrap(),
        24
    );
}

#[test]
fn test_bind_conflict_is_reported() {
    let ctx = attached_context();
    let mut first = CommandServer::new(Arc::clone(&ctx));
    let addr = first
        .start_socket(loopback(), Duration::from_secs(5))
        .unwrap();

    let mut second = CommandServer::new(Arc::clone(&ctx));
    let err = second
        .start_socket(addr, Duration::from_secs(5))
        .unwrap_err();
    assert!(err.to_string().contains(&addr.to_string()));
    assert!(second.local_addr().is_none());
}

#[test]
fn test_file_channel_scenario() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("requests.txt");
    let ctx = attached_context();
    let session = ctx.session().unwrap();
    session
        .target()
        .write_i32(Address::new(BASE + 0xC), 10)
        .unwrap();

    let mut server = CommandServer::new(Arc::clone(&ctx));
    server
        .start_file_channel(path.clone(), Duration::from_millis(20))
        .unwrap();

    // Stage and rename so the poller never sees a half-written file
    let staging = dir.path().join("requests.tmp");
    fs::write(&staging, "100,5\nbad-line\n").unwrap();
    fs::rename(&staging, &path).unwrap();
    let drained = wait_until(Duration::from_secs(5), || {
        fs::read_to_string(&path).map(|s| s.is_empty()).unwrap_or(false)
    });
    assert!(drained, "command file was not truncated");

    assert_eq!(
        session.target().read_i32(Address::new(BASE + 0x8)).unwrap(),
        100
    );
    assert_eq!(
        session.target().read_i32(Address::new(BASE + 0xC)).unwrap(),
        15
    );

    server.stop();
}
