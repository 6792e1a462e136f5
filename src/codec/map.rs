//! Ordered key/value map encoding.
//!
//! Layout (all integers little-endian `u32`):
//!
//! ```text
//! count | key_len[0] value_len[0] | ... | key[0] \0 value[0] \0 | ...
//! ```
//!
//! Pair order is preserved and duplicate keys are allowed.

use super::buffer::{
    U32_SIZE, read_nul_terminated, read_u32, wire_len, write_nul_terminated, write_u32,
};
use super::CodecError;
use crate::types::Headers;

/// Size of one `(key_len, value_len)` entry in the header region.
const PAIR_HEADER_SIZE: usize = 2 * U32_SIZE;

/// Encode pairs into the host map format.
///
/// Fails only if a count or length overflows its `u32` field.
pub fn encode_map<K, V>(pairs: &[(K, V)]) -> Result<Vec<u8>, CodecError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let body_size: usize = pairs
        .iter()
        .map(|(k, v)| k.as_ref().len() + v.as_ref().len() + 2)
        .sum();
    let mut out = Vec::with_capacity(U32_SIZE + pairs.len() * PAIR_HEADER_SIZE + body_size);

    write_u32(&mut out, wire_len(pairs.len())?);
    for (key, value) in pairs {
        write_u32(&mut out, wire_len(key.as_ref().len())?);
        write_u32(&mut out, wire_len(value.as_ref().len())?);
    }
    for (key, value) in pairs {
        write_nul_terminated(&mut out, key.as_ref().as_bytes());
        write_nul_terminated(&mut out, value.as_ref().as_bytes());
    }
    Ok(out)
}

/// Decode the host map format.
///
/// The input must be exactly one well-formed encoding with no trailing
/// bytes. Even an empty map carries its zero count, so empty input is
/// truncated.
pub fn decode_map(bytes: &[u8]) -> Result<Headers, CodecError> {
    let count = read_u32(bytes, 0)? as usize;
    let header_end = count
        .checked_mul(PAIR_HEADER_SIZE)
        .and_then(|n| n.checked_add(U32_SIZE))
        .ok_or(CodecError::Truncated {
            needed: usize::MAX,
            available: bytes.len(),
        })?;
    if header_end > bytes.len() {
        return Err(CodecError::Truncated {
            needed: header_end,
            available: bytes.len(),
        });
    }

    let mut lengths = Vec::with_capacity(count);
    let mut declared: usize = 0;
    for i in 0..count {
        let at = U32_SIZE + i * PAIR_HEADER_SIZE;
        let key_len = read_u32(bytes, at)? as usize;
        let value_len = read_u32(bytes, at + U32_SIZE)? as usize;
        declared = declared
            .saturating_add(key_len)
            .saturating_add(value_len)
            .saturating_add(2);
        lengths.push((key_len, value_len));
    }

    let available = bytes.len() - header_end;
    if declared > available {
        return Err(CodecError::LengthOverflow { declared, available });
    }

    let mut pairs = Vec::with_capacity(count);
    let mut offset = header_end;
    for (key_len, value_len) in lengths {
        let key = read_nul_terminated(bytes, offset, key_len)?;
        offset += key_len + 1;
        let value = read_nul_terminated(bytes, offset, value_len)?;
        offset += value_len + 1;
        pairs.push((key.to_string(), value.to_string()));
    }

    if offset != bytes.len() {
        return Err(CodecError::TrailingBytes {
            count: bytes.len() - offset,
        });
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Headers {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_exact_layout() {
        let encoded = encode_map(&[("ab", "c")]).unwrap();
        assert_eq!(
            encoded,
            vec![1, 0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, b'a', b'b', 0, b'c', 0]
        );
    }

    #[test]
    fn test_encode_empty_map() {
        let empty: [(&str, &str); 0] = [];
        assert_eq!(encode_map(&empty).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_decode_preserves_order_and_duplicates() {
        let input = pairs(&[("set-cookie", "a=1"), (":path", "/"), ("set-cookie", "b=2")]);
        let decoded = decode_map(&encode_map(&input).unwrap()).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_decode_empty_strings() {
        let input = pairs(&[("", ""), ("k", "")]);
        assert_eq!(decode_map(&encode_map(&input).unwrap()).unwrap(), input);
    }

    #[test]
    fn test_decode_empty_input_is_truncated() {
        assert_eq!(
            decode_map(&[]),
            Err(CodecError::Truncated {
                needed: 4,
                available: 0
            })
        );
    }

    #[test]
    fn test_decode_zero_count_is_empty_map() {
        assert_eq!(decode_map(&[0, 0, 0, 0]).unwrap(), Vec::new());
    }

    #[test]
    fn test_decode_truncated_count() {
        assert!(matches!(
            decode_map(&[1, 0]),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_truncated_header() {
        assert!(matches!(
            decode_map(&[2, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]),
            Err(CodecError::Truncated { needed: 20, .. })
        ));
    }

    #[test]
    fn test_decode_lengths_exceed_body() {
        let mut encoded = encode_map(&[("a", "b")]).unwrap();
        // Claim a 200-byte key.
        if let Some(b) = encoded.get_mut(4) {
            *b = 200;
        }
        assert!(matches!(
            decode_map(&encoded),
            Err(CodecError::LengthOverflow { .. })
        ));
    }

    #[test]
    fn test_decode_missing_nul() {
        let mut encoded = encode_map(&[("a", "b")]).unwrap();
        // Overwrite the key terminator.
        if let Some(b) = encoded.get_mut(13) {
            *b = b'x';
        }
        assert_eq!(
            decode_map(&encoded),
            Err(CodecError::MissingNul { offset: 13 })
        );
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let mut encoded = encode_map(&[("a", "b")]).unwrap();
        encoded.push(7);
        assert_eq!(
            decode_map(&encoded),
            Err(CodecError::TrailingBytes { count: 1 })
        );
    }

    #[test]
    fn test_decode_huge_count_does_not_allocate() {
        assert!(decode_map(&[0xff, 0xff, 0xff, 0xff]).is_err());
    }
}
