//! Low-level WebSocket (RFC 6455) protocol engine that does not use memory allocations or IO.
//!
//! The crate performs the HTTP upgrade handshake and frame encoding/decoding on caller-supplied
//! byte slices. [`SessionState`] fuses those codecs into one resumable server-side state machine:
//! feed it whatever bytes arrived from the socket and whatever room is left in the outgoing buffer,
//! and it reports how many bytes it consumed and produced. When input runs dry or output is full,
//! it returns [`WebsocketError::InsufficientInput`] or [`WebsocketError::InsufficientOutputSpace`]
//! and picks up exactly where it stopped on the next call.
//!
//! Sockets, TLS and event loops are user's job.

#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
mod log_macros;

mod error;
pub use error::WebsocketError;

pub mod buffer;
pub mod masking;
pub use masking::mask_payload;

mod frame_encoding;
pub use frame_encoding::{encode_frame_header, write_frame, write_frame_with_payload};
mod frame_decoding;
pub use frame_decoding::read_frame;

pub mod handshake;
pub use handshake::{
    accept_key, read_request, read_response, write_request, write_response, ClientHandshake,
};

mod session;
pub use session::{PayloadSink, SessionPhase, SessionResult, SessionState, SessionStatus};

/// Maximum number of bytes a frame header can occupy on the wire:
/// 2 basic bytes, 8 bytes of extended length and a 4-byte masking key.
pub const MAX_HEADER_LENGTH: usize = 2 + 8 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Opcode {
    Continuation = 0,
    Text = 1,
    Binary = 2,
    ReservedData3 = 3,
    ReservedData4 = 4,
    ReservedData5 = 5,
    ReservedData6 = 6,
    ReservedData7 = 7,
    ConnectionClose = 8,
    Ping = 9,
    Pong = 0xA,
    ReservedControlB = 0xB,
    ReservedControlC = 0xC,
    ReservedControlD = 0xD,
    ReservedControlE = 0xE,
    ReservedControlF = 0xF,
}

impl Opcode {
    /// Interpret lower 4 bits of `bits` as an opcode.
    pub const fn from_bits(bits: u8) -> Opcode {
        use Opcode::*;
        match bits & 0xF {
            0 => Continuation,
            1 => Text,
            2 => Binary,
            3 => ReservedData3,
            4 => ReservedData4,
            5 => ReservedData5,
            6 => ReservedData6,
            7 => ReservedData7,
            8 => ConnectionClose,
            9 => Ping,
            0xA => Pong,
            0xB => ReservedControlB,
            0xC => ReservedControlC,
            0xD => ReservedControlD,
            0xE => ReservedControlE,
            _ => ReservedControlF,
        }
    }

    /// Close, ping, pong and the reserved `0xB..=0xF` range.
    pub const fn is_control(self) -> bool {
        (self as u8) & 0x8 != 0
    }

    /// Continuation, text and binary frames.
    pub const fn is_data(self) -> bool {
        matches!(self, Opcode::Continuation | Opcode::Text | Opcode::Binary)
    }

    pub const fn is_reserved(self) -> bool {
        !self.is_data()
            && !matches!(self, Opcode::ConnectionClose | Opcode::Ping | Opcode::Pong)
    }

    pub const fn name(self) -> &'static str {
        use Opcode::*;
        match self {
            Continuation => "CONTINUATION",
            Text => "TEXT",
            Binary => "BINARY",
            ConnectionClose => "CLOSE",
            Ping => "PING",
            Pong => "PONG",
            ReservedData3 | ReservedData4 | ReservedData5 | ReservedData6 | ReservedData7 => {
                "RESERVED-DATA"
            }
            ReservedControlB | ReservedControlC | ReservedControlD | ReservedControlE
            | ReservedControlF => "RESERVED-CONTROL",
        }
    }
}

impl core::fmt::Display for Opcode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// The two fixed bytes that start every frame.
///
/// Byte 0 holds FIN, RSV1-3 and the opcode; byte 1 holds the MASK flag and the 7-bit
/// length indicator (`0..=125` literal length, `126` and `127` announce a 16- or 64-bit
/// extended length).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FrameHeader([u8; 2]);

impl FrameHeader {
    pub const FIN: u8 = 0x80;
    pub const RSV1: u8 = 0x40;
    pub const RSV2: u8 = 0x20;
    pub const RSV3: u8 = 0x10;
    pub const OPCODE: u8 = 0x0F;
    pub const MASK: u8 = 0x80;
    pub const LENGTH: u8 = 0x7F;

    pub const fn new(fin: bool, opcode: Opcode) -> FrameHeader {
        FrameHeader([if fin { Self::FIN } else { 0 } | opcode as u8, 0])
    }

    pub const fn from_bytes(bytes: [u8; 2]) -> FrameHeader {
        FrameHeader(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 2] {
        self.0
    }

    pub const fn fin(self) -> bool {
        self.0[0] & Self::FIN != 0
    }

    pub const fn rsv1(self) -> bool {
        self.0[0] & Self::RSV1 != 0
    }

    pub const fn rsv2(self) -> bool {
        self.0[0] & Self::RSV2 != 0
    }

    pub const fn rsv3(self) -> bool {
        self.0[0] & Self::RSV3 != 0
    }

    /// RSV1-3 as a 3-bit number, RSV1 being the most significant.
    pub const fn reserved(self) -> u8 {
        (self.0[0] & (Self::RSV1 | Self::RSV2 | Self::RSV3)) >> 4
    }

    pub const fn opcode(self) -> Opcode {
        Opcode::from_bits(self.0[0] & Self::OPCODE)
    }

    pub const fn masked(self) -> bool {
        self.0[1] & Self::MASK != 0
    }

    pub const fn length_indicator(self) -> u8 {
        self.0[1] & Self::LENGTH
    }

    pub fn set_fin(&mut self, fin: bool) {
        self.set_bit(0, Self::FIN, fin);
    }

    pub fn set_reserved(&mut self, reserved: u8) {
        debug_assert!(reserved & 0x7 == reserved);
        self.0[0] = (self.0[0] & !(Self::RSV1 | Self::RSV2 | Self::RSV3)) | ((reserved & 0x7) << 4);
    }

    pub fn set_opcode(&mut self, opcode: Opcode) {
        self.0[0] = (self.0[0] & !Self::OPCODE) | opcode as u8;
    }

    pub fn set_masked(&mut self, masked: bool) {
        self.set_bit(1, Self::MASK, masked);
    }

    pub fn set_length_indicator(&mut self, indicator: u8) {
        self.0[1] = (self.0[1] & Self::MASK) | (indicator & Self::LENGTH);
    }

    fn set_bit(&mut self, byte: usize, bit: u8, value: bool) {
        if value {
            self.0[byte] |= bit;
        } else {
            self.0[byte] &= !bit;
        }
    }
}

/// Description of one frame: its header bits, the full payload length and the masking key.
///
/// `mask` is only meaningful when [`FrameHeader::masked`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Frame {
    pub length: u64,
    pub header: FrameHeader,
    pub mask: [u8; 4],
}

impl Frame {
    pub const fn new(opcode: Opcode, fin: bool, length: u64) -> Frame {
        Frame {
            length,
            header: FrameHeader::new(fin, opcode),
            mask: [0; 4],
        }
    }

    /// Set the MASK flag and the key used for the payload. Clients must mask every frame.
    pub fn with_mask(mut self, mask: [u8; 4]) -> Frame {
        self.header.set_masked(true);
        self.mask = mask;
        self
    }

    #[inline]
    pub const fn opcode(&self) -> Opcode {
        self.header.opcode()
    }

    #[inline]
    pub const fn masked(&self) -> bool {
        self.header.masked()
    }
}



#[cfg(test)]
mod handshake_test;
