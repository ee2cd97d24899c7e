//! ownet wire format.
//!
//! Every message starts with a 24-byte header of six big-endian `i32`s,
//! followed by `payload` bytes. In requests the third field is the message
//! type; in responses it is the return code (negative `errno` on failure).

/// Protocol version carried by every header.
pub const VERSION: i32 = 0;

/// Marks a message as using the ownet protocol.
pub const FLG_OWNET: i32 = 0x0000_0100;

/// No-op, used to check that the server answers.
pub const MSG_NOP: i32 = 1;

/// Read the value at a path.
pub const MSG_READ: i32 = 2;

/// Largest payload the client sends or accepts.
pub const MAX_PAYLOAD: i32 = 65536;

/// A `payload` of -1 marks a keep-alive sent while the server is busy.
pub const PING_PAYLOAD: i32 = -1;

pub const HEADER_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: i32,
    pub payload: i32,
    /// Message type on requests, return code on responses.
    pub kind: i32,
    pub flags: i32,
    pub size: i32,
    pub offset: i32,
}

impl Header {
    /// Header for a client request of `msg_type` with `payload_len` bytes.
    pub fn request(msg_type: i32, payload_len: usize, size: i32) -> Self {
        Self {
            version: VERSION,
            payload: payload_len as i32,
            kind: msg_type,
            flags: FLG_OWNET,
            size,
            offset: 0,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        let fields = [
            self.version,
            self.payload,
            self.kind,
            self.flags,
            self.size,
            self.offset,
        ];
        for (chunk, field) in buf.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_be_bytes());
        }
        buf
    }

    pub fn decode(buf: &[u8; HEADER_LEN]) -> Self {
        let field = |i: usize| i32::from_be_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
        Self {
            version: field(0),
            payload: field(4),
            kind: field(8),
            flags: field(12),
            size: field(16),
            offset: field(20),
        }
    }

    pub fn is_ping(&self) -> bool {
        self.payload == PING_PAYLOAD
    }
}

/// Encode a path as the NUL-terminated payload owserver expects.
pub fn path_payload(path: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(path.len() + 1);
    payload.extend_from_slice(path.as_bytes());
    payload.push(0);
    payload
}
