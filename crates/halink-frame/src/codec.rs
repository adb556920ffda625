use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Code (2) + CRC (2): the smallest possible frame.
pub const MIN_FRAME_SIZE: usize = 4;

/// One integrity-checked message unit: a command code plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgFrame {
    /// The 16-bit command code.
    pub code: u16,
    /// The code-specific payload.
    pub payload: Bytes,
}

impl MsgFrame {
    /// Create a new frame.
    pub fn new(code: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            code,
            payload: payload.into(),
        }
    }

    /// The wire size of this frame before byte stuffing.
    pub fn wire_size(&self) -> usize {
        MIN_FRAME_SIZE + self.payload.len()
    }
}

/// CRC-16/CCITT-FALSE: poly 0x1021, init 0xFFFF, no reflection, no final
/// XOR. The check value for `b"123456789"` is 0x29B1.
pub fn crc16(bytes: &[u8]) -> u16 {
    crc16::State::<crc16::CCITT_FALSE>::calculate(bytes)
}

/// Encode a frame into the wire format (before byte stuffing).
///
/// Wire format:
/// ```text
/// ┌────────────┬───────────────┬──────────────────────────┐
/// │ Code (2B)  │ Payload (N B) │ CRC-16 (2B, big-endian,  │
/// │ big-endian │               │ over code ++ payload)    │
/// └────────────┴───────────────┴──────────────────────────┘
/// ```
pub fn encode_frame(frame: &MsgFrame, dst: &mut BytesMut) {
    dst.reserve(frame.wire_size());
    let start = dst.len();
    dst.put_u16(frame.code);
    dst.put_slice(&frame.payload);
    let crc = crc16(&dst[start..]);
    dst.put_u16(crc);
}

/// Decode a frame from an unescaped buffer, verifying the trailing CRC.
pub fn decode_frame(bb: &[u8]) -> Result<MsgFrame> {
    if bb.len() < MIN_FRAME_SIZE {
        return Err(FrameError::TooShort { len: bb.len() });
    }

    let crc_offset = bb.len() - 2;
    let expected = u16::from_be_bytes([bb[crc_offset], bb[crc_offset + 1]]);
    let computed = crc16(&bb[..crc_offset]);
    if expected != computed {
        return Err(FrameError::CrcMismatch { expected, computed });
    }

    let code = u16::from_be_bytes([bb[0], bb[1]]);
    let payload = Bytes::copy_from_slice(&bb[2..crc_offset]);
    Ok(MsgFrame { code, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wire(frame: &MsgFrame) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_frame(frame, &mut buf);
        buf
    }

    #[test]
    fn test_crc_check_value() {
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let frame = MsgFrame::new(0x1000, &b"hello, device!"[..]);
        let buf = wire(&frame);
        assert_eq!(buf.len(), frame.wire_size());

        let decoded = decode_frame(&buf).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_known_vector() {
        let bb = [0x01, 0x02, 0xFF, 0xFF, 0x81, 0x1B];

        let frame = decode_frame(&bb).unwrap();
        assert_eq!(frame.code, 0x0102);
        assert_eq!(frame.payload.as_ref(), &[0xFF, 0xFF]);

        assert_eq!(wire(&frame).as_ref(), &bb);
    }

    #[test]
    fn test_empty_payload() {
        let frame = MsgFrame::new(0x0000, Bytes::new());
        let buf = wire(&frame);
        assert_eq!(buf.len(), MIN_FRAME_SIZE);

        let decoded = decode_frame(&buf).unwrap();
        assert_eq!(decoded.code, 0x0000);
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn test_decode_too_short() {
        for len in 0..MIN_FRAME_SIZE {
            let bb = vec![0u8; len];
            let err = decode_frame(&bb).unwrap_err();
            assert!(matches!(err, FrameError::TooShort { len: l } if l == len));
        }
    }

    #[test]
    fn test_any_crc_bit_flip_is_detected() {
        let buf = wire(&MsgFrame::new(0x0102, Bytes::from_static(&[0xFF, 0xFF])));
        let crc_offset = buf.len() - 2;

        for bit in 0..16 {
            let mut corrupt = buf.to_vec();
            corrupt[crc_offset + bit / 8] ^= 1 << (bit % 8);
            let err = decode_frame(&corrupt).unwrap_err();
            assert!(matches!(err, FrameError::CrcMismatch { .. }));
        }
    }

    #[test]
    fn test_payload_corruption_is_detected() {
        let mut buf = wire(&MsgFrame::new(0x1000, &b"payload"[..])).to_vec();
        buf[4] ^= 0x20;
        let err = decode_frame(&buf).unwrap_err();
        assert!(matches!(err, FrameError::CrcMismatch { .. }));
    }

    proptest! {
        #[test]
        fn prop_roundtrip(
            code in any::<u16>(),
            payload in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let frame = MsgFrame::new(code, payload);
            let decoded = decode_frame(&wire(&frame)).unwrap();
            prop_assert_eq!(decoded, frame);
        }
    }
}
