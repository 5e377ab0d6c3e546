//! 5-byte message header codec
//!
//! ```text
//! ┌────────────┬──────────────────┬──────────────────────┐
//! │ Type (1B)  │ Length (4 bytes) │ Payload (Length B)   │
//! │ tag byte   │ Big-endian u32   │ opaque / UTF-8 text  │
//! └────────────┴──────────────────┴──────────────────────┘
//! ```

use crate::error::{Error, Result};

/// Header size in bytes (tag + length)
pub const HEADER_LEN: usize = 5;

/// Size of the length field
pub const LENGTH_LEN: usize = 4;

/// Encode a header for a payload of `length` bytes.
///
/// Lengths that do not fit in a `u32` are a caller bug and are rejected
/// with [`Error::InvalidArgument`].
pub fn encode_header(tag: u8, length: usize) -> Result<[u8; HEADER_LEN]> {
    let length = u32::try_from(length).map_err(|_| {
        Error::InvalidArgument(format!("payload length {} exceeds u32::MAX", length))
    })?;
    let len = length.to_be_bytes();
    Ok([tag, len[0], len[1], len[2], len[3]])
}

/// Decode the big-endian length field
#[inline]
pub fn decode_length(bytes: [u8; LENGTH_LEN]) -> u32 {
    u32::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let hdr = encode_header(0x01, 14).unwrap();
        assert_eq!(hdr, [0x01, 0x00, 0x00, 0x00, 0x0E]);

        let hdr = encode_header(0x03, 0x0102_0304).unwrap();
        assert_eq!(hdr, [0x03, 0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_header_roundtrip_boundaries() {
        let lengths = [0usize, 1, 255, 256, 65_535, 65_536, 1 << 24, u32::MAX as usize];
        for tag in [0u8, 1, 2, 3, 4, 0x7F, 0xFF] {
            for &len in &lengths {
                let hdr = encode_header(tag, len).unwrap();
                assert_eq!(hdr[0], tag);
                let field = [hdr[1], hdr[2], hdr[3], hdr[4]];
                assert_eq!(decode_length(field) as usize, len);
            }
        }
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_oversized_length_rejected() {
        let result = encode_header(0x03, u32::MAX as usize + 1);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
