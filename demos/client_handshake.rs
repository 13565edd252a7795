use websocket_session::{ClientHandshake, SessionState, WebsocketError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = ClientHandshake::random().map_err(|e| e.to_string())?;
    let mut request = [0u8; 512];
    let request_len = client.write_request(
        &mut request,
        "/socket?encoding=text",
        &["Host: localhost", "Origin: http://localhost"],
    )?;
    println!("{}", String::from_utf8_lossy(&request[..request_len]));

    let mut server = SessionState::new();
    let mut response = [0u8; 512];
    let ret = server.process(&mut response, &mut request[..request_len]);
    assert_eq!(ret.consumed, request_len);
    assert_eq!(ret.status, Err(WebsocketError::InsufficientInput));

    let response_len = client.read_response(&response[..ret.written])?;
    println!("{}", String::from_utf8_lossy(&response[..response_len]));
    Ok(())
}
