//! Error conditions reported by every codec and by the session engine.
use core::fmt;

/// Negative outcome of a codec or engine call.
///
/// The first two variants are suspend conditions: nothing was consumed or written,
/// and the same call can be repeated once the caller supplied more input or drained
/// the output buffer. The last two are fatal for the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WebsocketError {
    /// Not enough bytes in the source buffer yet.
    InsufficientInput,
    /// Not enough room left in the destination buffer.
    InsufficientOutputSpace,
    /// The handshake asked for a WebSocket version other than 13.
    UnsupportedVersion,
    /// A required structural element (method line, terminator, header, opcode) is missing or invalid.
    MalformedInput,
}

impl WebsocketError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            WebsocketError::InsufficientInput => "insufficient input",
            WebsocketError::InsufficientOutputSpace => "insufficient output space",
            WebsocketError::UnsupportedVersion => "unsupported websocket version",
            WebsocketError::MalformedInput => "malformed input",
        }
    }

    /// Integer status as used by C-style callers: always negative.
    pub const fn status(&self) -> i32 {
        match self {
            WebsocketError::InsufficientInput => -1,
            WebsocketError::InsufficientOutputSpace => -2,
            WebsocketError::UnsupportedVersion => -3,
            WebsocketError::MalformedInput => -4,
        }
    }

    /// Whether the caller should retry after feeding more input or draining output.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebsocketError::InsufficientInput | WebsocketError::InsufficientOutputSpace
        )
    }
}

impl fmt::Display for WebsocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::error::Error for WebsocketError {}
