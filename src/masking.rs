//! Rolling XOR masking of frame payloads.
//!
//! Masking is its own inverse, and every function here takes the payload offset
//! already processed for the frame, so a payload split across several socket reads
//! can be (un)masked chunk by chunk.

use crate::Frame;

/// (Un)mask `payload` in place if `frame` carries the MASK flag; otherwise leave it as is.
///
/// `base_offset` is the number of payload bytes of this frame already processed by
/// earlier calls, not a per-call index. Returns `payload.len()`.
#[inline]
pub fn mask_payload(payload: &mut [u8], frame: &Frame, base_offset: u64) -> usize {
    if frame.masked() {
        apply_mask(frame.mask, payload, (base_offset % 4) as u8);
    }
    payload.len()
}

/// XOR `payload_chunk` with `mask`, starting at key byte `phase` (`0..4`).
#[cfg(feature = "unoptimised_masking")]
pub fn apply_mask(mask: [u8; 4], payload_chunk: &mut [u8], phase: u8) {
    for (i, b) in payload_chunk.iter_mut().enumerate() {
        *b ^= mask[(i + phase as usize) & 0x03];
    }
}

/// XOR `payload_chunk` with `mask`, starting at key byte `phase` (`0..4`).
///
/// The key is pre-rotated by `phase` and repeated into a wider block, which lets the
/// compiler vectorise the inner loop. This is the masking loop of the `websocket-sans-io`
/// crate, including its `masking_slice_size_*` features.
#[cfg(not(feature = "unoptimised_masking"))]
pub fn apply_mask(mask: [u8; 4], payload_chunk: &mut [u8], phase: u8) {
    #[cfg(feature = "masking_slice_size_4")]
    const ROTATED_KEY_LEN: usize = 4;
    #[cfg(feature = "masking_slice_size_8")]
    const ROTATED_KEY_LEN: usize = 8;
    #[cfg(feature = "masking_slice_size_16")]
    const ROTATED_KEY_LEN: usize = 16;
    #[cfg(feature = "masking_slice_size_32")]
    const ROTATED_KEY_LEN: usize = 32;

    #[cfg(not(any(
        feature = "masking_slice_size_4",
        feature = "masking_slice_size_8",
        feature = "masking_slice_size_16",
        feature = "masking_slice_size_32",
    )))]
    const ROTATED_KEY_LEN: usize = 32;

    let mut key = [0; ROTATED_KEY_LEN];
    for (i, k) in key.iter_mut().enumerate() {
        *k = mask[(i + phase as usize) % 4];
    }
    let mut blocks = payload_chunk.chunks_exact_mut(ROTATED_KEY_LEN);
    for block in &mut blocks {
        for (b, k) in block.iter_mut().zip(key) {
            *b ^= k;
        }
    }
    for (b, k) in blocks.into_remainder().iter_mut().zip(key) {
        *b ^= k;
    }
}
