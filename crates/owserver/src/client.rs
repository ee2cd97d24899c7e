//! Non-persistent owserver client.
//!
//! Every request opens its own TCP connection. A sensor that was briefly
//! unreachable on a persistent connection tends to stay unreachable for the
//! lifetime of that connection, so nothing is reused.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::protocol::{path_payload, Header, HEADER_LEN, MAX_PAYLOAD, MSG_NOP, MSG_READ, VERSION};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum OwError {
    /// The server could not be reached or did not answer the initial NOP.
    #[error("Cannot connect to owserver at {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("owserver I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server sent something that is not a valid ownet response.
    #[error("owserver protocol error: {0}")]
    Protocol(String),

    /// The server answered with a negative return code.
    #[error("owserver returned error {code} for '{path}'")]
    Server { code: i32, path: String },

    #[error("owserver did not answer within {0:?}")]
    Timeout(Duration),
}

// ---------------------------------------------------------------------------
// OwProxy
// ---------------------------------------------------------------------------

/// Handle on an owserver that answered at connect time.
#[derive(Debug, Clone)]
pub struct OwProxy {
    addr: String,
    timeout: Duration,
}

impl OwProxy {
    /// Check that an owserver answers at `host:port` and return a handle to it.
    ///
    /// `timeout` bounds this check and every later request.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, OwError> {
        let proxy = Self {
            addr: format!("{host}:{port}"),
            timeout,
        };

        proxy.ping().await.map_err(|e| OwError::Connect {
            addr: proxy.addr.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(addr = %proxy.addr, "owserver answered");
        Ok(proxy)
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send a NOP and wait for a non-error reply.
    pub async fn ping(&self) -> Result<(), OwError> {
        let (ret, _) = self.request(MSG_NOP, &[], 0).await?;
        if ret < 0 {
            return Err(OwError::Server {
                code: ret.saturating_neg(),
                path: String::new(),
            });
        }
        Ok(())
    }

    /// Read the raw value at `path`, e.g. `/28.6F1F1D040000/temperature`.
    pub async fn read(&self, path: &str) -> Result<Vec<u8>, OwError> {
        let (ret, data) = self.request(MSG_READ, &path_payload(path), MAX_PAYLOAD).await?;
        if ret < 0 {
            return Err(OwError::Server {
                code: ret.saturating_neg(),
                path: path.to_string(),
            });
        }
        Ok(data)
    }

    async fn request(&self, msg_type: i32, payload: &[u8], size: i32) -> Result<(i32, Vec<u8>), OwError> {
        tokio::time::timeout(self.timeout, self.exchange(msg_type, payload, size))
            .await
            .map_err(|_| OwError::Timeout(self.timeout))?
    }

    /// One request/response round-trip on a fresh connection.
    async fn exchange(&self, msg_type: i32, payload: &[u8], size: i32) -> Result<(i32, Vec<u8>), OwError> {
        let mut stream = TcpStream::connect(&self.addr).await?;

        let header = Header::request(msg_type, payload.len(), size);
        let mut message = Vec::with_capacity(HEADER_LEN + payload.len());
        message.extend_from_slice(&header.encode());
        message.extend_from_slice(payload);
        stream.write_all(&message).await?;

        loop {
            let mut buf = [0u8; HEADER_LEN];
            stream.read_exact(&mut buf).await?;
            let response = Header::decode(&buf);

            if response.version != VERSION {
                return Err(OwError::Protocol(format!(
                    "unexpected version {}",
                    response.version
                )));
            }
            if response.is_ping() {
                continue;
            }
            if response.payload < 0 || response.payload > MAX_PAYLOAD {
                return Err(OwError::Protocol(format!(
                    "payload length {} out of range",
                    response.payload
                )));
            }

            let mut data = vec![0u8; response.payload as usize];
            stream.read_exact(&mut data).await?;

            if response.kind < 0 {
                return Ok((response.kind, Vec::new()));
            }

            // The payload buffer may be larger than the value it carries.
            data.truncate((response.size.max(0) as usize).min(data.len()));
            return Ok((response.kind, data));
        }
    }
}
