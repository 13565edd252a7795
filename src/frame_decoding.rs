use crate::{buffer, Frame, FrameHeader, WebsocketError};

/// Decode one frame header from the beginning of `src` into `frame`, returning the
/// number of header bytes (2 to 14) it occupies.
///
/// Reads the two basic bytes, then 0, 2 or 8 big-endian extended length bytes
/// as announced by the length indicator, then the masking key if the MASK flag is set.
///
/// Decoding is atomic: on [`WebsocketError::InsufficientInput`] `frame` is left
/// untouched, and the call has to be repeated with the same bytes plus more.
/// Payload bytes are not part of the header and are not looked at.
pub fn read_frame(src: &[u8], frame: &mut Frame) -> Result<usize, WebsocketError> {
    let mut basic = [0u8; 2];
    let mut cursor = buffer::consume(&mut basic, src, 0)?;
    let header = FrameHeader::from_bytes(basic);

    let length = match header.length_indicator() {
        0x7E => {
            let mut extended = [0u8; 2];
            cursor = buffer::consume(&mut extended, src, cursor)?;
            u16::from_be_bytes(extended).into()
        }
        0x7F => {
            let mut extended = [0u8; 8];
            cursor = buffer::consume(&mut extended, src, cursor)?;
            u64::from_be_bytes(extended)
        }
        x => x.into(),
    };

    let mut mask = [0u8; 4];
    if header.masked() {
        cursor = buffer::consume(&mut mask, src, cursor)?;
    }

    *frame = Frame {
        length,
        header,
        mask,
    };
    Ok(cursor)
}
