//! Length-prefixed CRC framing
//!
//! Wraps an opaque payload for transmission over an unreliable byte
//! channel:
//!
//! ```text
//! [len: u16 BE] [payload: len bytes] [crc: 2 or 4 bytes BE]
//! ```
//!
//! The length counts payload bytes only; the CRC covers the payload only.
//! A flipped bit anywhere in the payload or checksum surfaces as a
//! checksum mismatch on [`unframe`]. [`frame_with_id`] additionally places
//! an 8-bit numeric message id ahead of the payload for legacy channel
//! multiplexing; it is unrelated to the mode-2 varid.

use crate::crc::{crc16_bytes, crc32, crc32_bytes};
use crate::error::FramingError;

/// Maximum payload size representable by the 16-bit length prefix.
pub const MAX_FRAME_PAYLOAD: usize = u16::MAX as usize;

/// Checksum algorithm used by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcKind {
    /// CRC-16/CCITT-FALSE, 2 bytes
    Crc16,
    /// CRC-32/IEEE, 4 bytes
    Crc32,
}

impl CrcKind {
    /// Checksum size in bytes.
    pub fn size(self) -> usize {
        match self {
            CrcKind::Crc16 => 2,
            CrcKind::Crc32 => 4,
        }
    }

    fn compute(self, data: &[u8]) -> Vec<u8> {
        match self {
            CrcKind::Crc16 => crc16_bytes(data).to_vec(),
            CrcKind::Crc32 => crc32_bytes(data).to_vec(),
        }
    }

    /// Widen a stored checksum to u32 for uniform reporting.
    fn read(self, data: &[u8]) -> u32 {
        match self {
            CrcKind::Crc16 => u16::from_be_bytes([data[0], data[1]]) as u32,
            CrcKind::Crc32 => u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
        }
    }

    fn value(self, data: &[u8]) -> u32 {
        match self {
            CrcKind::Crc16 => crate::crc::crc16(data) as u32,
            CrcKind::Crc32 => crc32(data),
        }
    }
}

/// Frame a payload with a length prefix and checksum.
pub fn frame(payload: &[u8], crc: CrcKind) -> Result<Vec<u8>, FramingError> {
    if payload.len() > MAX_FRAME_PAYLOAD {
        return Err(FramingError::Oversize {
            size: payload.len(),
            max: MAX_FRAME_PAYLOAD,
        });
    }
    let mut out = Vec::with_capacity(2 + payload.len() + crc.size());
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&crc.compute(payload));
    Ok(out)
}

/// Validate and strip framing, returning the payload.
pub fn unframe(framed: &[u8], crc: CrcKind) -> Result<Vec<u8>, FramingError> {
    let overhead = 2 + crc.size();
    if framed.len() < overhead {
        return Err(FramingError::Truncated {
            needed: overhead,
            available: framed.len(),
        });
    }
    let declared = u16::from_be_bytes([framed[0], framed[1]]) as usize;
    let actual = framed.len() - overhead;
    if declared > actual {
        return Err(FramingError::Truncated {
            needed: overhead + declared,
            available: framed.len(),
        });
    }
    if declared < actual {
        return Err(FramingError::LengthMismatch { declared, actual });
    }

    let payload = &framed[2..2 + declared];
    let expected = crc.read(&framed[2 + declared..]);
    let computed = crc.value(payload);
    if expected != computed {
        return Err(FramingError::BadChecksum {
            expected,
            actual: computed,
        });
    }
    Ok(payload.to_vec())
}

/// Frame a payload with an 8-bit message id ahead of it. The length prefix
/// and checksum cover `id ‖ payload`.
pub fn frame_with_id(payload: &[u8], message_id: u8, crc: CrcKind) -> Result<Vec<u8>, FramingError> {
    let mut tagged = Vec::with_capacity(1 + payload.len());
    tagged.push(message_id);
    tagged.extend_from_slice(payload);
    frame(&tagged, crc)
}

/// Validate and strip framing from a frame built by [`frame_with_id`],
/// returning the id and payload.
pub fn unframe_with_id(framed: &[u8], crc: CrcKind) -> Result<(u8, Vec<u8>), FramingError> {
    let tagged = unframe(framed, crc)?;
    if tagged.is_empty() {
        return Err(FramingError::Truncated {
            needed: 1,
            available: 0,
        });
    }
    Ok((tagged[0], tagged[1..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_crc16() {
        let payload = b"dive report";
        let framed = frame(payload, CrcKind::Crc16).unwrap();
        assert_eq!(framed.len(), payload.len() + 4);
        assert_eq!(unframe(&framed, CrcKind::Crc16).unwrap(), payload);
    }

    #[test]
    fn test_roundtrip_crc32() {
        let payload = b"dive report";
        let framed = frame(payload, CrcKind::Crc32).unwrap();
        assert_eq!(framed.len(), payload.len() + 6);
        assert_eq!(unframe(&framed, CrcKind::Crc32).unwrap(), payload);
    }

    #[test]
    fn test_empty_payload_crc32_vector() {
        // len = 0x0000, CRC32 of the empty string = 0x00000000
        let framed = frame(b"", CrcKind::Crc32).unwrap();
        assert_eq!(framed, vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(unframe(&framed, CrcKind::Crc32).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let framed = frame(b"abc123", CrcKind::Crc16).unwrap();
        // Every bit outside the length field must trip the checksum.
        for byte in 2..framed.len() {
            for bit in 0..8 {
                let mut corrupted = framed.clone();
                corrupted[byte] ^= 1 << bit;
                let err = unframe(&corrupted, CrcKind::Crc16).unwrap_err();
                assert!(
                    matches!(err, FramingError::BadChecksum { .. }),
                    "flip at byte {} bit {} gave {:?}",
                    byte,
                    bit,
                    err
                );
            }
        }
    }

    #[test]
    fn test_truncated_frame() {
        let err = unframe(&[0x00], CrcKind::Crc16).unwrap_err();
        assert!(matches!(err, FramingError::Truncated { .. }));

        let mut framed = frame(b"abcdef", CrcKind::Crc32).unwrap();
        framed.truncate(framed.len() - 3);
        let err = unframe(&framed, CrcKind::Crc32).unwrap_err();
        assert!(matches!(err, FramingError::Truncated { .. }));
    }

    #[test]
    fn test_length_mismatch() {
        let mut framed = frame(b"abc", CrcKind::Crc16).unwrap();
        framed.push(0xEE);
        let err = unframe(&framed, CrcKind::Crc16).unwrap_err();
        assert_eq!(
            err,
            FramingError::LengthMismatch {
                declared: 3,
                actual: 4
            }
        );
    }

    #[test]
    fn test_oversize_payload() {
        let payload = vec![0u8; MAX_FRAME_PAYLOAD + 1];
        let err = frame(&payload, CrcKind::Crc16).unwrap_err();
        assert!(matches!(err, FramingError::Oversize { .. }));
    }

    #[test]
    fn test_frame_with_id_roundtrip() {
        let framed = frame_with_id(b"payload", 42, CrcKind::Crc16).unwrap();
        let (id, payload) = unframe_with_id(&framed, CrcKind::Crc16).unwrap();
        assert_eq!(id, 42);
        assert_eq!(payload, b"payload");
    }

    #[test]
    fn test_frame_with_id_empty_payload() {
        let framed = frame_with_id(b"", 7, CrcKind::Crc32).unwrap();
        let (id, payload) = unframe_with_id(&framed, CrcKind::Crc32).unwrap();
        assert_eq!(id, 7);
        assert!(payload.is_empty());
    }

    #[test]
    fn test_unframe_with_id_missing_id() {
        // A plain empty frame has no id byte to strip.
        let framed = frame(b"", CrcKind::Crc16).unwrap();
        let err = unframe_with_id(&framed, CrcKind::Crc16).unwrap_err();
        assert!(matches!(err, FramingError::Truncated { .. }));
    }
}
