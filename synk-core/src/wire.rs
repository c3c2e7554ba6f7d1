//! Wire protocol: plaintext UTF-8 datagrams, space-delimited tokens, one message per datagram.

/// Largest datagram the listener will accept. Messages are short text lines;
/// anything bigger than this is not ours.
pub const MAX_DATAGRAM: usize = 1024;

/// All wire message types. Sent as individual datagrams on the shared discovery port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Liveness announcement: `heartbeat <hostname> <address>`.
    Heartbeat { hostname: String, address: String },
    /// Resync trigger: `sync <file_reference>`. The reference is a single
    /// token with no embedded whitespace.
    Sync { file: String },
}

impl Message {
    /// Encode into the on-wire text form (no trailing newline).
    pub fn encode(&self) -> String {
        match self {
            Message::Heartbeat { hostname, address } => {
                format!("heartbeat {} {}", hostname, address)
            }
            Message::Sync { file } => format!("sync {}", file),
        }
    }

    /// Decode one datagram. Malformed input is expected on an untrusted
    /// broadcast domain; every failure mode is a typed, non-fatal error.
    pub fn decode(datagram: &[u8]) -> Result<Message, DecodeError> {
        let text = std::str::from_utf8(datagram).map_err(|_| DecodeError::NotText)?;
        let mut tokens = text.split_whitespace();
        let kind = tokens.next().ok_or(DecodeError::Empty)?;
        let fields: Vec<&str> = tokens.collect();
        match kind {
            "heartbeat" => {
                if fields.len() != 2 {
                    return Err(DecodeError::FieldCount {
                        kind: "heartbeat",
                        expected: 2,
                        got: fields.len(),
                    });
                }
                Ok(Message::Heartbeat {
                    hostname: fields[0].to_string(),
                    address: fields[1].to_string(),
                })
            }
            "sync" => {
                if fields.len() != 1 {
                    return Err(DecodeError::FieldCount {
                        kind: "sync",
                        expected: 1,
                        got: fields.len(),
                    });
                }
                Ok(Message::Sync {
                    file: fields[0].to_string(),
                })
            }
            _ => Err(DecodeError::UnknownKind),
        }
    }
}

/// Error decoding a datagram (not UTF-8, empty, unknown leading token, or
/// wrong field count). Callers discard the datagram and carry on.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("datagram is not UTF-8 text")]
    NotText,
    #[error("empty datagram")]
    Empty,
    #[error("unknown message kind")]
    UnknownKind,
    #[error("{kind}: expected {expected} fields, got {got}")]
    FieldCount {
        kind: &'static str,
        expected: usize,
        got: usize,
    },
}
