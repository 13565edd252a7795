use crate::{
    buffer, frame_decoding::read_frame, frame_encoding::write_frame, handshake, masking, Frame,
    FrameHeader, Opcode, WebsocketError,
};

/// Receiver of TEXT, BINARY and CONTINUATION payload, already unmasked.
///
/// Called once per available chunk, any number of times per frame, never for control
/// frames. `dst` is the free part of the engine's output buffer; return how many bytes
/// were written there. Returning [`WebsocketError::InsufficientOutputSpace`] suspends
/// the engine without consuming the chunk, which is offered again on the next call.
pub trait PayloadSink {
    fn payload(&mut self, opcode: Opcode, dst: &mut [u8], chunk: &[u8])
        -> Result<usize, WebsocketError>;
}

impl<F> PayloadSink for F
where
    F: FnMut(Opcode, &mut [u8], &[u8]) -> Result<usize, WebsocketError>,
{
    #[inline]
    fn payload(
        &mut self,
        opcode: Opcode,
        dst: &mut [u8],
        chunk: &[u8],
    ) -> Result<usize, WebsocketError> {
        self(opcode, dst, chunk)
    }
}

/// Where the session's control flow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SessionPhase {
    /// Waiting for a complete upgrade request, then writing the response.
    #[default]
    HandshakeWriteResponse,
    /// Response written; the request still has to be consumed.
    HandshakeReadRequest,
    /// Expecting the next frame header.
    FrameRead,
    /// CLOSE echoed; discarding its payload.
    CloseDrain,
    /// PONG header written; copying the PING payload behind it.
    PingEcho,
    /// Discarding the payload of a received PONG.
    PongDrain,
    /// Unmasking data payload and handing it to the sink.
    PayloadStream,
    /// Closing handshake completed. Nothing more is consumed or produced.
    Done,
}

/// Non-error outcome of [`SessionState::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// The CLOSE frame has been echoed and its payload drained.
    Done,
}

/// Outcome of one engine invocation.
///
/// The byte counts are valid whatever the status: on a suspend condition they tell
/// how far the engine got before stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionResult {
    /// Bytes produced at the beginning of the destination buffer.
    pub written: usize,
    /// Bytes consumed from the beginning of the source buffer.
    pub consumed: usize,
    pub status: Result<SessionStatus, WebsocketError>,
}

impl SessionResult {
    /// Integer form of `status`: `0` when done, negative for errors.
    pub const fn status_code(&self) -> i32 {
        match self.status {
            Ok(SessionStatus::Done) => 0,
            Err(e) => e.status(),
        }
    }
}

/// Cursors of a single invocation. Everything before them is committed.
struct Cursors {
    written: usize,
    consumed: usize,
}

/// Per-connection state of the server-side protocol engine.
///
/// Create it with [`Default`] when a connection is accepted and pass it to every
/// [`SessionState::process`] call for that connection. It holds the frame being
/// processed, how many of its payload bytes have been handled, and where the engine
/// suspended.
///
/// Example usage:
///
/// ```
#[doc=include_str!("../demos/echo_session.rs")]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    frame: Frame,
    offset: u64,
    phase: SessionPhase,
}

impl SessionState {
    pub const fn new() -> SessionState {
        SessionState {
            frame: Frame::new(Opcode::Continuation, false, 0),
            offset: 0,
            phase: SessionPhase::HandshakeWriteResponse,
        }
    }

    #[inline]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Header of the frame currently being processed.
    #[inline]
    pub const fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Payload bytes of the current frame already handled.
    #[inline]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub const fn is_done(&self) -> bool {
        matches!(self.phase, SessionPhase::Done)
    }

    /// Advance the session, discarding data payload.
    ///
    /// See [`SessionState::process_with_sink`].
    pub fn process(&mut self, dst: &mut [u8], src: &mut [u8]) -> SessionResult {
        self.run(dst, src, None)
    }

    /// Advance the session as far as `src` and `dst` allow.
    ///
    /// `src` holds received bytes not yet consumed by earlier calls; `dst` is free room
    /// for outgoing bytes. Data payload is unmasked in place inside `src` and passed to
    /// `sink`. The engine keeps going until it is done, an error occurs, or it needs more
    /// input ([`WebsocketError::InsufficientInput`]) or more output room
    /// ([`WebsocketError::InsufficientOutputSpace`]).
    ///
    /// After a call, drop the first `consumed` bytes of `src`, send the first `written`
    /// bytes of `dst`, and call again with the unchanged remaining input, possibly
    /// followed by newly received bytes. Once output is full no further input is consumed.
    ///
    /// The upgrade request must end within [`handshake::MAX_REQUEST_LEN`] bytes,
    /// otherwise the session fails with [`WebsocketError::MalformedInput`].
    pub fn process_with_sink<S: PayloadSink + ?Sized>(
        &mut self,
        dst: &mut [u8],
        src: &mut [u8],
        sink: &mut S,
    ) -> SessionResult {
        self.run(dst, src, Some(&mut DynSink(sink)))
    }

    fn run(
        &mut self,
        dst: &mut [u8],
        src: &mut [u8],
        mut sink: Option<&mut (dyn PayloadSink + '_)>,
    ) -> SessionResult {
        let mut cur = Cursors {
            written: 0,
            consumed: 0,
        };
        let status = loop {
            let step = match self.phase {
                SessionPhase::HandshakeWriteResponse => {
                    self.handshake_write_response(dst, src, &mut cur)
                }
                SessionPhase::HandshakeReadRequest => self.handshake_read_request(src, &mut cur),
                SessionPhase::FrameRead => self.frame_read(dst, src, &mut cur),
                SessionPhase::CloseDrain => self.drain(src, &mut cur, SessionPhase::Done),
                SessionPhase::PingEcho => self.ping_echo(dst, src, &mut cur),
                SessionPhase::PongDrain => self.drain(src, &mut cur, SessionPhase::FrameRead),
                SessionPhase::PayloadStream => {
                    self.payload_stream(dst, src, &mut cur, sink.as_deref_mut())
                }
                SessionPhase::Done => break Ok(SessionStatus::Done),
            };
            if let Err(e) = step {
                if !e.is_retryable() {
                    warn_log!("session aborted in {:?}: {}", self.phase, e);
                }
                break Err(e);
            }
        };
        SessionResult {
            written: cur.written,
            consumed: cur.consumed,
            status,
        }
    }

    fn handshake_write_response(
        &mut self,
        dst: &mut [u8],
        src: &[u8],
        cur: &mut Cursors,
    ) -> Result<(), WebsocketError> {
        let pending = src.get(cur.consumed..).unwrap_or_default();
        let request_len = handshake::scan_request(pending)?;
        let request = pending.get(..request_len).unwrap_or_default();
        let out = dst.get_mut(cur.written..).unwrap_or_default();
        cur.written += handshake::write_response(out, request)?;
        self.phase = SessionPhase::HandshakeReadRequest;
        Ok(())
    }

    fn handshake_read_request(
        &mut self,
        src: &[u8],
        cur: &mut Cursors,
    ) -> Result<(), WebsocketError> {
        let pending = src.get(cur.consumed..).unwrap_or_default();
        cur.consumed += handshake::read_request(pending)?;
        debug_log!("handshake complete");
        self.phase = SessionPhase::FrameRead;
        Ok(())
    }

    /// Decode the next header and dispatch on its opcode.
    ///
    /// Control frames that need an immediate reply get it written before the header is
    /// consumed, so an undersized output buffer leaves the header unread.
    ///
    /// The CLOSE reply keeps byte 0 of the received header but is sent unmasked with
    /// length 0 (`88 00` for a final CLOSE); the received close payload is discarded.
    fn frame_read(
        &mut self,
        dst: &mut [u8],
        src: &[u8],
        cur: &mut Cursors,
    ) -> Result<(), WebsocketError> {
        let pending = src.get(cur.consumed..).unwrap_or_default();
        let mut frame = Frame::default();
        let header_len = read_frame(pending, &mut frame)?;
        let opcode = frame.opcode();

        debug_log!(
            "frame {} fin={} masked={} length={}",
            opcode,
            frame.header.fin(),
            frame.masked(),
            frame.length
        );

        let next = match opcode {
            Opcode::ConnectionClose => {
                let mut reply = Frame {
                    length: 0,
                    header: FrameHeader::from_bytes([frame.header.to_bytes()[0], 0]),
                    mask: [0; 4],
                };
                let out = dst.get_mut(cur.written..).unwrap_or_default();
                cur.written += write_frame(out, &mut reply)?;
                SessionPhase::CloseDrain
            }
            Opcode::Ping => {
                let mut reply = Frame::new(Opcode::Pong, true, frame.length);
                let out = dst.get_mut(cur.written..).unwrap_or_default();
                cur.written += write_frame(out, &mut reply)?;
                SessionPhase::PingEcho
            }
            Opcode::Pong => SessionPhase::PongDrain,
            Opcode::Continuation | Opcode::Text | Opcode::Binary => SessionPhase::PayloadStream,
            _ => {
                warn_log!("reserved opcode {:#x}", opcode as u8);
                return Err(WebsocketError::MalformedInput);
            }
        };

        cur.consumed += header_len;
        self.frame = frame;
        self.offset = 0;
        self.phase = next;
        Ok(())
    }

    /// Bytes of the current frame's payload not yet handled.
    fn remaining(&self) -> u64 {
        self.frame.length - self.offset
    }

    /// How many payload bytes can be taken from `available` input bytes.
    fn chunk_len(&self, available: usize) -> usize {
        match usize::try_from(self.remaining()) {
            Ok(remaining) => remaining.min(available),
            Err(_) => available,
        }
    }

    /// Discard the rest of the current frame's payload, then move to `next`.
    fn drain(
        &mut self,
        src: &[u8],
        cur: &mut Cursors,
        next: SessionPhase,
    ) -> Result<(), WebsocketError> {
        if self.remaining() > 0 {
            let available = buffer::space_after(src, cur.consumed);
            let take = self.chunk_len(available);
            if take == 0 {
                return Err(WebsocketError::InsufficientInput);
            }
            trace_log!("discarding {} payload bytes of {}", take, self.frame.opcode());
            cur.consumed += take;
            self.offset += take as u64;
            if self.remaining() > 0 {
                return Err(WebsocketError::InsufficientInput);
            }
        }
        if next == SessionPhase::Done {
            debug_log!("closing handshake complete");
        }
        self.phase = next;
        Ok(())
    }

    /// Copy PING payload, unmasked, behind the already written PONG header.
    fn ping_echo(
        &mut self,
        dst: &mut [u8],
        src: &[u8],
        cur: &mut Cursors,
    ) -> Result<(), WebsocketError> {
        if self.remaining() == 0 {
            self.phase = SessionPhase::FrameRead;
            return Ok(());
        }
        let available = buffer::space_after(src, cur.consumed);
        if available == 0 {
            return Err(WebsocketError::InsufficientInput);
        }
        let room = buffer::space_after(dst, cur.written);
        if room == 0 {
            return Err(WebsocketError::InsufficientOutputSpace);
        }
        let take = self.chunk_len(available.min(room));
        let chunk = src
            .get(cur.consumed..cur.consumed + take)
            .ok_or(WebsocketError::InsufficientInput)?;
        let end = buffer::append(dst, cur.written, chunk)?;
        if let Some(copied) = dst.get_mut(cur.written..end) {
            masking::mask_payload(copied, &self.frame, self.offset);
        }
        trace_log!("echoed {} ping payload bytes", take);
        cur.written = end;
        cur.consumed += take;
        self.offset += take as u64;
        Ok(())
    }

    /// Unmask the next available chunk of data payload and hand it to `sink`.
    fn payload_stream(
        &mut self,
        dst: &mut [u8],
        src: &mut [u8],
        cur: &mut Cursors,
        sink: Option<&mut (dyn PayloadSink + '_)>,
    ) -> Result<(), WebsocketError> {
        if self.remaining() == 0 {
            self.phase = SessionPhase::FrameRead;
            return Ok(());
        }
        let available = buffer::space_after(src, cur.consumed);
        let take = self.chunk_len(available);
        if take == 0 {
            return Err(WebsocketError::InsufficientInput);
        }
        let chunk = src
            .get_mut(cur.consumed..cur.consumed + take)
            .ok_or(WebsocketError::InsufficientInput)?;
        masking::mask_payload(chunk, &self.frame, self.offset);

        if let Some(sink) = sink {
            let out = dst.get_mut(cur.written..).unwrap_or_default();
            let room = out.len();
            match sink.payload(self.frame.opcode(), out, chunk) {
                Ok(n) => {
                    debug_assert!(n <= room);
                    cur.written += n.min(room);
                }
                Err(e) => {
                    // Leave the chunk exactly as received so the retry sees the same bytes.
                    masking::mask_payload(chunk, &self.frame, self.offset);
                    return Err(e);
                }
            }
        }

        trace_log!("streamed {} payload bytes of {}", take, self.frame.opcode());
        cur.consumed += take;
        self.offset += take as u64;
        Ok(())
    }
}

/// Lets a generic, possibly unsized sink travel as `&mut dyn PayloadSink`.
struct DynSink<'a, S: PayloadSink + ?Sized>(&'a mut S);

impl<S: PayloadSink + ?Sized> PayloadSink for DynSink<'_, S> {
    #[inline]
    fn payload(
        &mut self,
        opcode: Opcode,
        dst: &mut [u8],
        chunk: &[u8],
    ) -> Result<usize, WebsocketError> {
        self.0.payload(opcode, dst, chunk)
    }
}
