//! HTTP/1.1 upgrade handshake: building and checking the request and the
//! `101 Switching Protocols` response.
//!
//! Header lookups are exact, case-sensitive searches for `Name: ` within the given bytes.
//! Nothing here allocates; all output goes through [`crate::buffer::append`].

use base64::{engine::general_purpose::STANDARD, Engine};
use sha1::{Digest, Sha1};

use crate::buffer::{self, find};
use crate::WebsocketError;

/// Appended to `Sec-WebSocket-Key` before hashing.
pub const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Length of the client nonce carried, base64-encoded, in `Sec-WebSocket-Key`.
pub const NONCE_LEN: usize = 16;

/// Length of a base64-encoded SHA-1 digest, the `Sec-WebSocket-Accept` value.
pub const ACCEPT_KEY_LEN: usize = base64_encoded_len(20);

/// Longest handshake request the server side waits for, empty line included.
pub const MAX_REQUEST_LEN: usize = 8192;

const NONCE_KEY_LEN: usize = base64_encoded_len(NONCE_LEN);

const REQUEST_METHOD: &[u8] = b"GET";
const CRLF: &[u8] = b"\r\n";
const TERMINATOR: &[u8] = b"\r\n\r\n";

const VERSION_FIELD: &[u8] = b"Sec-WebSocket-Version: ";
const KEY_FIELD: &[u8] = b"Sec-WebSocket-Key: ";
const PROTOCOL_FIELD: &[u8] = b"Sec-WebSocket-Protocol: ";
const ACCEPT_FIELD: &[u8] = b"Sec-WebSocket-Accept: ";

const REQUEST_UPGRADE_FIELDS: &[u8] = b" HTTP/1.1\r\nConnection: Upgrade\r\nUpgrade: websocket\r\n";
const REQUEST_VERSION_LINE: &[u8] = b"Sec-WebSocket-Version: 13\r\n";
const RESPONSE_HEAD: &[u8] =
    b"HTTP/1.1 101 Switching Protocols\r\nConnection: Upgrade\r\nUpgrade: websocket\r\n";

/// Number of characters standard (padded) base64 produces for `n` input bytes.
pub const fn base64_encoded_len(n: usize) -> usize {
    4 * n.div_ceil(3)
}

/// Base64-encode `data` into `dst` at `cursor`, returning the advanced cursor.
fn append_base64(dst: &mut [u8], cursor: usize, data: &[u8]) -> Result<usize, WebsocketError> {
    let end = cursor
        .checked_add(base64_encoded_len(data.len()))
        .ok_or(WebsocketError::InsufficientOutputSpace)?;
    let window = dst
        .get_mut(cursor..end)
        .ok_or(WebsocketError::InsufficientOutputSpace)?;
    let written = STANDARD
        .encode_slice(data, window)
        .map_err(|_| WebsocketError::InsufficientOutputSpace)?;
    Ok(cursor + written)
}

/// `src` up to and including its empty line, or all of it if there is none.
fn header_block(src: &[u8]) -> &[u8] {
    match find(src, TERMINATOR) {
        Some(pos) => src.get(..pos + TERMINATOR.len()).unwrap_or(src),
        None => src,
    }
}

/// Value of the header field `name` (which includes the trailing `": "`), up to its CRLF.
fn field_value<'a>(src: &'a [u8], name: &[u8]) -> Option<Result<&'a [u8], WebsocketError>> {
    let start = find(src, name)? + name.len();
    let rest = src.get(start..)?;
    Some(
        find(rest, CRLF)
            .and_then(|len| rest.get(..len))
            .ok_or(WebsocketError::MalformedInput),
    )
}

/// Compute the `Sec-WebSocket-Accept` value for a `Sec-WebSocket-Key` value:
/// base64 of SHA-1 over the key bytes followed by [`GUID`].
pub fn accept_key(key: &[u8]) -> Result<[u8; ACCEPT_KEY_LEN], WebsocketError> {
    let digest = Sha1::new()
        .chain_update(key)
        .chain_update(GUID.as_bytes())
        .finalize();
    let mut accept = [0u8; ACCEPT_KEY_LEN];
    append_base64(&mut accept, 0, &digest)?;
    Ok(accept)
}

/// Write a client upgrade request for `uri` to the beginning of `dst`, returning its length.
///
/// Each entry of `extra_header_fields` is a complete `Name: value` field without line
/// ending; they are written verbatim after the standard fields. Nothing is written
/// unless the whole request fits.
pub fn write_request(
    dst: &mut [u8],
    nonce: &[u8; NONCE_LEN],
    uri: &str,
    extra_header_fields: &[&str],
) -> Result<usize, WebsocketError> {
    let fields_len = extra_header_fields
        .iter()
        .try_fold(0usize, |acc, field| acc.checked_add(field.len() + CRLF.len()));
    let needed = fields_len.and_then(|len| {
        len.checked_add(
            REQUEST_METHOD.len()
                + 1
                + REQUEST_UPGRADE_FIELDS.len()
                + KEY_FIELD.len()
                + NONCE_KEY_LEN
                + CRLF.len()
                + REQUEST_VERSION_LINE.len()
                + CRLF.len(),
        )?
        .checked_add(uri.len())
    });
    buffer::reserve(dst, 0, needed)?;

    let mut off = buffer::append(dst, 0, REQUEST_METHOD)?;
    off = buffer::append(dst, off, b" ")?;
    off = buffer::append(dst, off, uri.as_bytes())?;
    off = buffer::append(dst, off, REQUEST_UPGRADE_FIELDS)?;
    off = buffer::append(dst, off, KEY_FIELD)?;
    off = append_base64(dst, off, nonce)?;
    off = buffer::append(dst, off, CRLF)?;
    off = buffer::append(dst, off, REQUEST_VERSION_LINE)?;
    for field in extra_header_fields {
        off = buffer::append(dst, off, field.as_bytes())?;
        off = buffer::append(dst, off, CRLF)?;
    }
    buffer::append(dst, off, CRLF)
}

/// Like [`read_request`], but an incomplete request whose bytes so far are plausible
/// is reported as [`WebsocketError::InsufficientInput`].
///
/// A request whose terminator is not within the first [`MAX_REQUEST_LEN`] bytes is
/// [`WebsocketError::MalformedInput`].
pub(crate) fn scan_request(src: &[u8]) -> Result<usize, WebsocketError> {
    let method_len = src.len().min(REQUEST_METHOD.len());
    if src.get(..method_len) != REQUEST_METHOD.get(..method_len) {
        return Err(WebsocketError::MalformedInput);
    }
    let window = src.get(..MAX_REQUEST_LEN).unwrap_or(src);
    match find(window, TERMINATOR) {
        Some(pos) => Ok(pos + TERMINATOR.len()),
        None if src.len() >= MAX_REQUEST_LEN => {
            warn_log!("no end of handshake request within {} bytes", MAX_REQUEST_LEN);
            Err(WebsocketError::MalformedInput)
        }
        None => Err(WebsocketError::InsufficientInput),
    }
}

/// Check that `src` starts with a `GET` request terminated by an empty line and return
/// the length of the request including that empty line.
///
/// The Upgrade, Connection and key fields are not validated here.
pub fn read_request(src: &[u8]) -> Result<usize, WebsocketError> {
    scan_request(src).map_err(|e| match e {
        WebsocketError::InsufficientInput => WebsocketError::MalformedInput,
        e => e,
    })
}

/// Write the `101 Switching Protocols` response to the client request in `request`
/// to the beginning of `dst`, returning its length.
///
/// The request must declare `Sec-WebSocket-Version: 13`. A `Sec-WebSocket-Protocol`
/// field is echoed verbatim. Fields are only looked up before the request's empty
/// line. Nothing is written unless the whole response fits.
pub fn write_response(dst: &mut [u8], request: &[u8]) -> Result<usize, WebsocketError> {
    let request = header_block(request);
    let version = match field_value(request, VERSION_FIELD) {
        Some(Ok(v)) => v,
        Some(Err(_)) | None => {
            warn_log!("handshake request without a usable Sec-WebSocket-Version field");
            return Err(WebsocketError::UnsupportedVersion);
        }
    };
    if version != &b"13"[..] {
        warn_log!("handshake request asks for unsupported WebSocket version");
        return Err(WebsocketError::UnsupportedVersion);
    }

    let protocol = field_value(request, PROTOCOL_FIELD).transpose()?;
    let key = field_value(request, KEY_FIELD).ok_or(WebsocketError::MalformedInput)??;
    let accept = accept_key(key)?;

    let protocol_len = protocol.map_or(0, |p| PROTOCOL_FIELD.len() + p.len() + CRLF.len());
    let needed = protocol_len.checked_add(
        RESPONSE_HEAD.len() + ACCEPT_FIELD.len() + ACCEPT_KEY_LEN + CRLF.len() + CRLF.len(),
    );
    buffer::reserve(dst, 0, needed)?;

    let mut off = buffer::append(dst, 0, RESPONSE_HEAD)?;
    if let Some(protocol) = protocol {
        off = buffer::append(dst, off, PROTOCOL_FIELD)?;
        off = buffer::append(dst, off, protocol)?;
        off = buffer::append(dst, off, CRLF)?;
    }
    off = buffer::append(dst, off, ACCEPT_FIELD)?;
    off = buffer::append(dst, off, &accept)?;
    off = buffer::append(dst, off, CRLF)?;
    buffer::append(dst, off, CRLF)
}

/// Check the server's response to a request made with `nonce` and return the length of
/// the response including its terminating empty line.
///
/// Besides requiring the `Sec-WebSocket-Accept` field before the terminator, the accept
/// value is compared with the one computed from `nonce`; a mismatch is
/// [`WebsocketError::MalformedInput`].
pub fn read_response(src: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<usize, WebsocketError> {
    let end = find(src, TERMINATOR).ok_or(WebsocketError::MalformedInput)? + TERMINATOR.len();
    let head = src.get(..end).ok_or(WebsocketError::MalformedInput)?;
    let accept = field_value(head, ACCEPT_FIELD).ok_or(WebsocketError::MalformedInput)??;

    let mut key = [0u8; NONCE_KEY_LEN];
    append_base64(&mut key, 0, nonce)?;
    let expected = accept_key(&key)?;
    if accept != &expected[..] {
        warn_log!("Sec-WebSocket-Accept does not match the request nonce");
        return Err(WebsocketError::MalformedInput);
    }
    Ok(end)
}

/// Client side of the handshake, remembering the nonce between request and response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientHandshake {
    nonce: [u8; NONCE_LEN],
}

impl ClientHandshake {
    /// Use a caller-provided nonce. It must be unpredictable for every connection.
    pub const fn new(nonce: [u8; NONCE_LEN]) -> ClientHandshake {
        ClientHandshake { nonce }
    }

    /// Draw a fresh nonce from the operating system's secure random source.
    #[cfg(feature = "client")]
    pub fn random() -> Result<ClientHandshake, getrandom::Error> {
        let mut nonce = [0u8; NONCE_LEN];
        getrandom::fill(&mut nonce)?;
        Ok(ClientHandshake { nonce })
    }

    pub const fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn write_request(
        &self,
        dst: &mut [u8],
        uri: &str,
        extra_header_fields: &[&str],
    ) -> Result<usize, WebsocketError> {
        write_request(dst, &self.nonce, uri, extra_header_fields)
    }

    pub fn read_response(&self, src: &[u8]) -> Result<usize, WebsocketError> {
        let len = read_response(src, &self.nonce)?;
        debug_log!("handshake response accepted ({} bytes)", len);
        Ok(len)
    }
}
