//! Bounds-checked cursor primitives every codec is built from.
//!
//! They are the only place where "not enough room" and "not enough bytes" are detected.
//! On failure nothing is copied and the caller's cursor stays where it was.

use crate::WebsocketError;

/// Copy `src` into `dst` at `cursor`, returning the advanced cursor.
///
/// Capacity is `dst.len()`. Fails with [`WebsocketError::InsufficientOutputSpace`]
/// without writing anything if `src` does not fit entirely.
#[inline]
pub fn append(dst: &mut [u8], cursor: usize, src: &[u8]) -> Result<usize, WebsocketError> {
    let end = cursor
        .checked_add(src.len())
        .ok_or(WebsocketError::InsufficientOutputSpace)?;
    let window = dst
        .get_mut(cursor..end)
        .ok_or(WebsocketError::InsufficientOutputSpace)?;
    window.copy_from_slice(src);
    Ok(end)
}

/// Fill `scratch` with `scratch.len()` bytes of `src` starting at `cursor`,
/// returning the advanced cursor.
///
/// Fails with [`WebsocketError::InsufficientInput`] without touching `scratch`
/// if `src` holds fewer bytes than wanted.
#[inline]
pub fn consume(scratch: &mut [u8], src: &[u8], cursor: usize) -> Result<usize, WebsocketError> {
    let end = cursor
        .checked_add(scratch.len())
        .ok_or(WebsocketError::InsufficientInput)?;
    let window = src.get(cursor..end).ok_or(WebsocketError::InsufficientInput)?;
    scratch.copy_from_slice(window);
    Ok(end)
}

/// Remaining room after `cursor`, zero if the cursor is already past the end.
#[inline]
pub(crate) fn space_after(buf: &[u8], cursor: usize) -> usize {
    buf.len().saturating_sub(cursor)
}

/// Check that `len` more bytes fit into `dst` after `cursor`, so a multi-part write can
/// fail before its first part is copied. `None` stands for a length that overflowed.
#[inline]
pub(crate) fn reserve(dst: &[u8], cursor: usize, len: Option<usize>) -> Result<(), WebsocketError> {
    match len {
        Some(len) if space_after(dst, cursor) >= len => Ok(()),
        _ => Err(WebsocketError::InsufficientOutputSpace),
    }
}

/// Position of the first occurrence of `needle` in `haystack`. Exact, case-sensitive.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn append_fits_exactly() {
        let mut dst = [0u8; 5];
        let c = append(&mut dst, 0, b"abc").unwrap();
        let c = append(&mut dst, c, b"de").unwrap();
        assert_eq!(c, 5);
        assert_eq!(&dst, b"abcde");
    }

    #[test]
    fn append_short_writes_nothing() {
        let mut dst = [0u8; 4];
        assert_eq!(append(&mut dst, 2, b"abc"), Err(WebsocketError::InsufficientOutputSpace));
        assert_eq!(dst, [0u8; 4]);
        assert_eq!(append(&mut dst, 9, b""), Err(WebsocketError::InsufficientOutputSpace));
    }

    #[test]
    fn consume_short_reads_nothing() {
        let mut scratch = [7u8; 3];
        assert_eq!(consume(&mut scratch, b"ab", 0), Err(WebsocketError::InsufficientInput));
        assert_eq!(scratch, [7u8; 3]);
        assert_eq!(consume(&mut scratch[..2], b"xab", 1), Ok(3));
        assert_eq!(&scratch[..2], b"ab");
    }

    #[test]
    fn reserve_checks_room() {
        let dst = [0u8; 4];
        assert_eq!(reserve(&dst, 1, Some(3)), Ok(()));
        assert_eq!(reserve(&dst, 1, Some(4)), Err(WebsocketError::InsufficientOutputSpace));
        assert_eq!(reserve(&dst, 0, None), Err(WebsocketError::InsufficientOutputSpace));
    }

    #[test]
    fn find_locates_first() {
        assert_eq!(find(b"a\r\n\r\nb\r\n\r\n", b"\r\n\r\n"), Some(1));
        assert_eq!(find(b"abc", b"abcd"), None);
        assert_eq!(find(b"Key: ", b"key: "), None);
    }
}
