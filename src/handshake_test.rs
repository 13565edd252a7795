extern crate std;
use std::vec;

use pretty_assertions::assert_eq;

use crate::handshake::{base64_encoded_len, ACCEPT_KEY_LEN, GUID, MAX_REQUEST_LEN};
use crate::{
    accept_key, read_request, read_response, write_request, write_response, ClientHandshake,
    WebsocketError,
};

const SAMPLE_NONCE: &[u8; 16] = b"the sample nonce";

const TERMINATOR_LEN: usize = 4;

const SAMPLE_REQUEST: &[u8] = b"GET /chat HTTP/1.1\r\n\
Host: server.example.com\r\n\
Upgrade: websocket\r\n\
Connection: Upgrade\r\n\
Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
Origin: http://example.com\r\n\
Sec-WebSocket-Version: 13\r\n\
\r\n";

const SAMPLE_RESPONSE: &[u8] = b"HTTP/1.1 101 Switching Protocols\r\n\
Connection: Upgrade\r\n\
Upgrade: websocket\r\n\
Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\
\r\n";

#[test]
fn rfc_sample_accept_key() {
    assert_eq!(
        accept_key(b"dGhlIHNhbXBsZSBub25jZQ==").unwrap(),
        *b"s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
    );
    assert_eq!(GUID.len(), 36);
}

#[test]
fn base64_lengths() {
    assert_eq!(base64_encoded_len(0), 0);
    assert_eq!(base64_encoded_len(1), 4);
    assert_eq!(base64_encoded_len(3), 4);
    assert_eq!(base64_encoded_len(4), 8);
    assert_eq!(base64_encoded_len(16), 24);
    assert_eq!(ACCEPT_KEY_LEN, 28);
}

#[test]
fn rfc_sample_response() {
    let mut dst = [0u8; 256];
    let written = write_response(&mut dst, SAMPLE_REQUEST).unwrap();
    assert_eq!(&dst[..written], SAMPLE_RESPONSE);
}

#[test]
fn response_echoes_subprotocol() {
    let request = b"GET /chat HTTP/1.1\r\n\
Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
Sec-WebSocket-Protocol: chat, superchat\r\n\
Sec-WebSocket-Version: 13\r\n\
\r\n";
    let mut dst = [0u8; 256];
    let written = write_response(&mut dst, request).unwrap();
    assert_eq!(
        &dst[..written],
        &b"HTTP/1.1 101 Switching Protocols\r\n\
Connection: Upgrade\r\n\
Upgrade: websocket\r\n\
Sec-WebSocket-Protocol: chat, superchat\r\n\
Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\
\r\n"[..]
    );
}

#[test]
fn response_requires_version_13() {
    let mut dst = [0u8; 256];
    let old = b"GET / HTTP/1.1\r\nSec-WebSocket-Key: x\r\nSec-WebSocket-Version: 8\r\n\r\n";
    assert_eq!(write_response(&mut dst, old), Err(WebsocketError::UnsupportedVersion));
    let missing = b"GET / HTTP/1.1\r\nSec-WebSocket-Key: x\r\n\r\n";
    assert_eq!(write_response(&mut dst, missing), Err(WebsocketError::UnsupportedVersion));
    let lowercase = b"GET / HTTP/1.1\r\nsec-websocket-version: 13\r\nSec-WebSocket-Key: x\r\n\r\n";
    assert_eq!(write_response(&mut dst, lowercase), Err(WebsocketError::UnsupportedVersion));
}

#[test]
fn response_requires_key() {
    let mut dst = [0u8; 256];
    let request = b"GET / HTTP/1.1\r\nSec-WebSocket-Version: 13\r\n\r\n";
    assert_eq!(write_response(&mut dst, request), Err(WebsocketError::MalformedInput));
}

#[test]
fn response_into_small_buffer() {
    for size in [0, 10, SAMPLE_RESPONSE.len() - 1] {
        let mut dst = vec![0xEEu8; size];
        assert_eq!(
            write_response(&mut dst, SAMPLE_REQUEST),
            Err(WebsocketError::InsufficientOutputSpace),
            "buffer of {size} bytes"
        );
        assert!(dst.iter().all(|&b| b == 0xEE), "buffer of {size} bytes was written to");
    }
}

#[test]
fn response_ignores_fields_after_empty_line() {
    let mut dst = [0xEEu8; 256];
    let late_key = b"GET / HTTP/1.1\r\nSec-WebSocket-Version: 13\r\n\r\n\
Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n";
    assert_eq!(write_response(&mut dst, late_key), Err(WebsocketError::MalformedInput));
    let late_version = b"GET / HTTP/1.1\r\nSec-WebSocket-Key: x\r\n\r\n\
Sec-WebSocket-Version: 13\r\n";
    assert_eq!(
        write_response(&mut dst, late_version),
        Err(WebsocketError::UnsupportedVersion)
    );
    assert!(dst.iter().all(|&b| b == 0xEE));

    let mut with_payload = SAMPLE_REQUEST.to_vec();
    with_payload.extend_from_slice(b"Sec-WebSocket-Protocol: smuggled\r\n");
    let written = write_response(&mut dst, &with_payload).unwrap();
    assert_eq!(&dst[..written], SAMPLE_RESPONSE);
}

#[test]
fn read_request_finds_terminator() {
    let mut wire = vec![];
    wire.extend_from_slice(SAMPLE_REQUEST);
    wire.extend_from_slice(b"\x81\x80\x00\x00\x00\x00");
    assert_eq!(read_request(&wire), Ok(SAMPLE_REQUEST.len()));
    assert_eq!(read_request(b"GET\r\n\r\n"), Ok(7));
}

#[test]
fn read_request_rejects_malformed() {
    let mut partial = SAMPLE_REQUEST.to_vec();
    partial.truncate(SAMPLE_REQUEST.len() - 1);
    assert_eq!(read_request(&partial), Err(WebsocketError::MalformedInput));
    assert_eq!(read_request(b"POST / HTTP/1.1\r\n\r\n"), Err(WebsocketError::MalformedInput));
    assert_eq!(read_request(b""), Err(WebsocketError::MalformedInput));
}

#[test]
fn read_request_length_cap() {
    let mut request = b"GET /".to_vec();
    request.resize(MAX_REQUEST_LEN - TERMINATOR_LEN, b'a');
    request.extend_from_slice(b"\r\n\r\n");
    assert_eq!(read_request(&request), Ok(MAX_REQUEST_LEN));

    request.insert(5, b'a');
    assert_eq!(read_request(&request), Err(WebsocketError::MalformedInput));
}

#[test]
fn request_layout() {
    let mut dst = [0u8; 256];
    let written =
        write_request(&mut dst, SAMPLE_NONCE, "/chat", &["Origin: http://example.com"]).unwrap();
    assert_eq!(
        &dst[..written],
        &b"GET /chat HTTP/1.1\r\n\
Connection: Upgrade\r\n\
Upgrade: websocket\r\n\
Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
Sec-WebSocket-Version: 13\r\n\
Origin: http://example.com\r\n\
\r\n"[..]
    );
    assert_eq!(read_request(&dst[..written]), Ok(written));
}

#[test]
fn request_into_small_buffer() {
    let mut full = [0u8; 256];
    let full_len = write_request(&mut full, SAMPLE_NONCE, "/", &["Origin: x"]).unwrap();
    for size in [0, 5, 40, full_len - 1] {
        let mut dst = vec![0xEEu8; size];
        assert_eq!(
            write_request(&mut dst, SAMPLE_NONCE, "/", &["Origin: x"]),
            Err(WebsocketError::InsufficientOutputSpace),
            "buffer of {size} bytes"
        );
        assert!(dst.iter().all(|&b| b == 0xEE), "buffer of {size} bytes was written to");
    }
    let mut dst = vec![0u8; full_len];
    assert_eq!(write_request(&mut dst, SAMPLE_NONCE, "/", &["Origin: x"]), Ok(full_len));
}

#[test]
fn client_accepts_matching_response() {
    let client = ClientHandshake::new(*SAMPLE_NONCE);
    let mut request = [0u8; 256];
    let request_len = client.write_request(&mut request, "/chat", &[]).unwrap();

    let mut response = [0u8; 256];
    let response_len = write_response(&mut response, &request[..request_len]).unwrap();
    assert_eq!(&response[..response_len], SAMPLE_RESPONSE);
    assert_eq!(client.read_response(&response[..response_len]), Ok(response_len));
}

#[test]
fn client_rejects_foreign_accept() {
    let other = ClientHandshake::new(*b"another nonce!!!");
    assert_eq!(
        other.read_response(SAMPLE_RESPONSE),
        Err(WebsocketError::MalformedInput)
    );
    assert_eq!(read_response(SAMPLE_RESPONSE, SAMPLE_NONCE), Ok(SAMPLE_RESPONSE.len()));
}

#[test]
fn client_rejects_incomplete_response() {
    let no_accept = b"HTTP/1.1 101 Switching Protocols\r\n\r\n";
    assert_eq!(read_response(no_accept, SAMPLE_NONCE), Err(WebsocketError::MalformedInput));
    let unterminated = &SAMPLE_RESPONSE[..SAMPLE_RESPONSE.len() - 2];
    assert_eq!(
        read_response(unterminated, SAMPLE_NONCE),
        Err(WebsocketError::MalformedInput)
    );
}

#[test]
fn client_ignores_accept_after_empty_line() {
    let mut late_accept = b"HTTP/1.1 101 Switching Protocols\r\n\r\n".to_vec();
    late_accept.extend_from_slice(b"Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n");
    assert_eq!(
        read_response(&late_accept, SAMPLE_NONCE),
        Err(WebsocketError::MalformedInput)
    );

    let mut followed_by_frame = SAMPLE_RESPONSE.to_vec();
    followed_by_frame.extend_from_slice(b"\x81\x02hi");
    assert_eq!(
        read_response(&followed_by_frame, SAMPLE_NONCE),
        Ok(SAMPLE_RESPONSE.len())
    );
}
