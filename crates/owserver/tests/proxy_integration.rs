//! Integration tests for [`OwProxy`] against an in-process fake owserver.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use owtenter_owserver::protocol::{Header, FLG_OWNET, HEADER_LEN, MSG_NOP, MSG_READ, PING_PAYLOAD};
use owtenter_owserver::{OwError, OwProxy};

const TIMEOUT: Duration = Duration::from_secs(2);

/// How the fake server answers a READ of a given path.
#[derive(Clone)]
enum Reply {
    Value(&'static str),
    /// Keep-alive frames first, then the value.
    PingsThen(usize, &'static str),
    Errno(i32),
    /// A raw return code, whatever its value.
    Ret(i32),
    Silent,
}

/// Spawn a fake owserver on an ephemeral port and return that port.
async fn spawn_fake(replies: HashMap<&'static str, Reply>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let replies = Arc::new(replies);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let replies = Arc::clone(&replies);
            tokio::spawn(async move {
                let _ = serve_one(stream, &replies).await;
            });
        }
    });

    port
}

async fn serve_one(
    mut stream: TcpStream,
    replies: &HashMap<&'static str, Reply>,
) -> std::io::Result<()> {
    let mut buf = [0u8; HEADER_LEN];
    stream.read_exact(&mut buf).await?;
    let request = Header::decode(&buf);
    assert_eq!(request.flags & FLG_OWNET, FLG_OWNET);

    let mut payload = vec![0u8; request.payload as usize];
    stream.read_exact(&mut payload).await?;

    match request.kind {
        MSG_NOP => write_reply(&mut stream, 0, b"").await,
        MSG_READ => {
            let path = std::str::from_utf8(&payload[..payload.len() - 1]).unwrap();
            match replies.get(path).cloned().unwrap_or(Reply::Errno(2)) {
                Reply::Value(value) => write_reply(&mut stream, value.len() as i32, value.as_bytes()).await,
                Reply::PingsThen(pings, value) => {
                    for _ in 0..pings {
                        let ping = response_header(PING_PAYLOAD, 0, 0);
                        stream.write_all(&ping.encode()).await?;
                    }
                    write_reply(&mut stream, value.len() as i32, value.as_bytes()).await
                }
                Reply::Errno(errno) => write_reply(&mut stream, -errno, b"").await,
                Reply::Ret(ret) => write_reply(&mut stream, ret, b"").await,
                Reply::Silent => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(())
                }
            }
        }
        other => panic!("unexpected message type {other}"),
    }
}

fn response_header(payload: i32, ret: i32, size: i32) -> Header {
    Header {
        version: 0,
        payload,
        kind: ret,
        flags: FLG_OWNET,
        size,
        offset: 0,
    }
}

/// Write a response whose payload buffer is padded beyond the value, as
/// owserver does.
async fn write_reply(stream: &mut TcpStream, ret: i32, value: &[u8]) -> std::io::Result<()> {
    let mut payload = value.to_vec();
    if ret >= 0 {
        payload.resize(value.len() + 8, 0);
    }
    let header = response_header(payload.len() as i32, ret, value.len() as i32);
    stream.write_all(&header.encode()).await?;
    stream.write_all(&payload).await
}

/// A port nothing listens on.
async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connect_fails_without_server() {
    let port = closed_port().await;
    let result = OwProxy::connect("127.0.0.1", port, TIMEOUT).await;
    assert_matches!(result, Err(OwError::Connect { .. }));
}

#[tokio::test]
async fn read_returns_value_without_padding() {
    let port = spawn_fake(HashMap::from([("/28.1/temperature", Reply::Value("     21.37"))])).await;
    let proxy = OwProxy::connect("127.0.0.1", port, TIMEOUT).await.unwrap();

    let raw = proxy.read("/28.1/temperature").await.unwrap();
    assert_eq!(raw, b"     21.37".to_vec());
}

#[tokio::test]
async fn keepalive_frames_are_skipped() {
    let port = spawn_fake(HashMap::from([("/26.1/humidity", Reply::PingsThen(3, "55"))])).await;
    let proxy = OwProxy::connect("127.0.0.1", port, TIMEOUT).await.unwrap();

    assert_eq!(proxy.read("/26.1/humidity").await.unwrap(), b"55".to_vec());
}

#[tokio::test]
async fn server_error_is_reported_per_path() {
    let port = spawn_fake(HashMap::from([("/28.2/temperature", Reply::Errno(2))])).await;
    let proxy = OwProxy::connect("127.0.0.1", port, TIMEOUT).await.unwrap();

    let err = proxy.read("/28.2/temperature").await.unwrap_err();
    assert_matches!(err, OwError::Server { code: 2, ref path } if path == "/28.2/temperature");
}

#[tokio::test]
async fn most_negative_return_code_does_not_overflow() {
    let port = spawn_fake(HashMap::from([("/28.4/temperature", Reply::Ret(i32::MIN))])).await;
    let proxy = OwProxy::connect("127.0.0.1", port, TIMEOUT).await.unwrap();

    let err = proxy.read("/28.4/temperature").await.unwrap_err();
    assert_matches!(err, OwError::Server { code: i32::MAX, .. });
}

#[tokio::test]
async fn silent_server_times_out() {
    let port = spawn_fake(HashMap::from([("/28.3/temperature", Reply::Silent)])).await;
    let proxy = OwProxy::connect("127.0.0.1", port, Duration::from_millis(200))
        .await
        .unwrap();

    assert_matches!(proxy.read("/28.3/temperature").await, Err(OwError::Timeout(_)));
}
