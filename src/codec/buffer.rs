//! Bounds-checked read/write helpers shared by the encoders.

use super::CodecError;

/// Width of every length and count field in the map encoding.
pub const U32_SIZE: usize = 4;

/// Safe little-endian `u32` read - returns error instead of panicking.
#[inline]
pub fn read_u32(buffer: &[u8], offset: usize) -> Result<u32, CodecError> {
    let bytes = read_slice(buffer, offset, U32_SIZE)?;
    let mut word = [0u8; U32_SIZE];
    word.copy_from_slice(bytes);
    Ok(u32::from_le_bytes(word))
}

/// Safe buffer slice read helper.
#[inline]
pub fn read_slice(buffer: &[u8], start: usize, len: usize) -> Result<&[u8], CodecError> {
    let end = start.checked_add(len).ok_or(CodecError::Truncated {
        needed: usize::MAX,
        available: buffer.len(),
    })?;
    buffer.get(start..end).ok_or(CodecError::Truncated {
        needed: end,
        available: buffer.len(),
    })
}

/// Read `len` bytes at `start` that must be followed by a NUL byte.
///
/// Returns the string without its terminator; the caller advances by
/// `len + 1`.
pub fn read_nul_terminated(buffer: &[u8], start: usize, len: usize) -> Result<&str, CodecError> {
    let bytes = read_slice(buffer, start, len)?;
    let nul_at = start + len;
    match buffer.get(nul_at) {
        Some(0) => {}
        Some(_) => return Err(CodecError::MissingNul { offset: nul_at }),
        None => {
            return Err(CodecError::Truncated {
                needed: nul_at + 1,
                available: buffer.len(),
            });
        }
    }
    std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 { offset: start })
}

/// Convert a count or length to its `u32` wire field.
///
/// Lossless on wasm32; on wider hosts anything past `u32::MAX` is rejected.
#[inline]
pub fn wire_len(len: usize) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::TooLarge { len })
}

/// Append a little-endian `u32`.
#[inline]
pub fn write_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

/// Append bytes followed by a NUL terminator.
#[inline]
pub fn write_nul_terminated(buffer: &mut Vec<u8>, data: &[u8]) {
    buffer.extend_from_slice(data);
    buffer.push(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_len_in_range() {
        assert_eq!(wire_len(0), Ok(0));
        assert_eq!(wire_len(u32::MAX as usize), Ok(u32::MAX));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_wire_len_rejects_oversized() {
        let len = u32::MAX as usize + 1;
        assert_eq!(wire_len(len), Err(CodecError::TooLarge { len }));
    }

    #[test]
    fn test_read_u32_le() {
        assert_eq!(read_u32(&[1, 0, 0, 0, 9], 0), Ok(1));
        assert_eq!(read_u32(&[9, 0, 1, 0, 0], 1), Ok(256));
    }

    #[test]
    fn test_read_u32_truncated() {
        assert_eq!(
            read_u32(&[1, 0, 0], 0),
            Err(CodecError::Truncated { needed: 4, available: 3 })
        );
    }

    #[test]
    fn test_read_slice_offset_overflow() {
        assert!(read_slice(&[0; 4], usize::MAX, 2).is_err());
    }

    #[test]
    fn test_nul_terminated() {
        assert_eq!(read_nul_terminated(b"ab\0", 0, 2), Ok("ab"));
        assert_eq!(
            read_nul_terminated(b"abc", 0, 2),
            Err(CodecError::MissingNul { offset: 2 })
        );
        assert_eq!(
            read_nul_terminated(b"ab", 0, 2),
            Err(CodecError::Truncated { needed: 3, available: 2 })
        );
    }

    #[test]
    fn test_nul_terminated_invalid_utf8() {
        assert_eq!(
            read_nul_terminated(&[0xff, 0], 0, 1),
            Err(CodecError::InvalidUtf8 { offset: 0 })
        );
    }
}
