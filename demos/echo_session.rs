use websocket_session::{
    write_frame_with_payload, ClientHandshake, Frame, Opcode, SessionState, WebsocketError,
};

fn main() {
    // What a client would send: upgrade request, a masked text frame, a ping and a close.
    let client = ClientHandshake::new(*b"0123456789abcdef");
    let mut wire = vec![0u8; 1024];
    let mut len = client
        .write_request(&mut wire, "/chat", &["Sec-WebSocket-Protocol: chat"])
        .unwrap();
    for (opcode, payload) in [
        (Opcode::Text, &b"Hello, world"[..]),
        (Opcode::Ping, &b"abc"[..]),
        (Opcode::ConnectionClose, &b""[..]),
    ] {
        let mut frame = Frame::new(opcode, true, 0).with_mask(*b"\x37\xfa\x21\x3d");
        len += write_frame_with_payload(&mut wire[len..], &mut frame, payload).unwrap();
    }
    wire.truncate(len);

    let mut session = SessionState::default();
    let mut inbox = Vec::<u8>::new();
    let mut outbox = Vec::<u8>::new();
    let mut text = Vec::<u8>::new();
    // The handshake response is written in one piece, so this must be able to hold it.
    let mut out = [0u8; 256];

    // Bytes arrive in small pieces, as they would from a socket.
    let mut arriving = wire.chunks(7);
    loop {
        let mut sink = |_opcode: Opcode, _dst: &mut [u8], chunk: &[u8]| -> Result<usize, WebsocketError> {
            text.extend_from_slice(chunk);
            Ok(0)
        };
        let ret = session.process_with_sink(&mut out, &mut inbox, &mut sink);
        inbox.drain(..ret.consumed);
        outbox.extend_from_slice(&out[..ret.written]);
        match ret.status {
            Ok(_) => break,
            Err(WebsocketError::InsufficientInput) => match arriving.next() {
                Some(chunk) => inbox.extend_from_slice(chunk),
                None => break,
            },
            Err(WebsocketError::InsufficientOutputSpace) => continue,
            Err(e) => panic!("connection failed: {e}"),
        }
    }

    assert!(session.is_done());
    assert_eq!(text, b"Hello, world");
    let response_len = client.read_response(&outbox).unwrap();
    assert!(outbox.starts_with(b"HTTP/1.1 101 Switching Protocols\r\n"));
    assert_eq!(&outbox[response_len..], b"\x8a\x03abc\x88\x00");
}
