use tinyvec::ArrayVec;

use crate::{buffer, masking, Frame, WebsocketError, MAX_HEADER_LENGTH};

/// Serialize a frame header to bytes without touching any output buffer.
///
/// The length indicator bits of `frame.header` are ignored and recomputed from
/// `frame.length`; every other bit is taken as is.
#[inline]
pub fn encode_frame_header(frame: &Frame) -> ArrayVec<[u8; MAX_HEADER_LENGTH]> {
    let mut header = frame.header;
    let mut ret: ArrayVec<_> = ArrayVec::new();

    match frame.length {
        x if x <= 0x7D => {
            header.set_length_indicator(x as u8);
            ret.extend(header.to_bytes());
        }
        x if x <= 0xFFFF => {
            header.set_length_indicator(0x7E);
            ret.extend(header.to_bytes());
            ret.extend((x as u16).to_be_bytes());
        }
        x => {
            header.set_length_indicator(0x7F);
            ret.extend(header.to_bytes());
            ret.extend(x.to_be_bytes());
        }
    };

    if header.masked() {
        ret.extend(frame.mask);
    }

    ret
}

/// Write the header of `frame` to the beginning of `dst`, returning number of bytes written.
///
/// The caller sets FIN, RSV, opcode and the MASK flag; this function fills in the
/// length indicator of `frame.header` (which is why it takes `&mut`) and appends 0, 2
/// or 8 extended length bytes followed by the masking key if the frame is masked.
///
/// Either the whole header is written or, with
/// [`WebsocketError::InsufficientOutputSpace`], nothing is.
pub fn write_frame(dst: &mut [u8], frame: &mut Frame) -> Result<usize, WebsocketError> {
    let encoded = encode_frame_header(frame);
    let written = buffer::append(dst, 0, &encoded)?;
    if let Some(&second_byte) = encoded.get(1) {
        frame.header.set_length_indicator(second_byte);
    }
    Ok(written)
}

/// Write a complete frame, header followed by `payload`, to the beginning of `dst`.
///
/// `frame.length` is set to `payload.len()`. If `frame` is masked, the copy of the
/// payload in `dst` is masked with `frame.mask`; `payload` itself is left alone.
/// Nothing is written unless the whole frame fits.
pub fn write_frame_with_payload(
    dst: &mut [u8],
    frame: &mut Frame,
    payload: &[u8],
) -> Result<usize, WebsocketError> {
    let mut candidate = *frame;
    candidate.length = payload.len() as u64;
    let encoded = encode_frame_header(&candidate);
    buffer::reserve(dst, 0, encoded.len().checked_add(payload.len()))?;
    let header_end = write_frame(dst, &mut candidate)?;
    let end = buffer::append(dst, header_end, payload)?;
    if let Some(copied) = dst.get_mut(header_end..end) {
        masking::mask_payload(copied, &candidate, 0);
    }
    *frame = candidate;
    Ok(end)
}
