use bytes::Bytes;
use halink_frame::MsgFrame;

use crate::code;
use crate::error::{ProtoError, Result};

/// A protocol message that knows its wire code and frame serialization.
///
/// Implemented by the generic [`Message`] control set and by peripheral
/// message enums that embed it (see [`crate::uart::UartMessage`]).
pub trait ProtoMessage: Send + std::fmt::Debug + Sized + 'static {
    /// The wire code this variant serializes under.
    fn code(&self) -> u16;

    /// Serialize into a frame carrying this variant's code.
    fn to_frame(&self) -> MsgFrame;

    /// Narrow to the generic control-set message, if this is one.
    fn into_generic(self) -> Option<Message>;
}

/// Identity of the peripheral function an adapter exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItfType {
    Unknown,
    Uart,
}

impl ItfType {
    /// Decode from the single-byte wire value.
    pub fn from_u8(x: u8) -> Option<Self> {
        match x {
            0x00 => Some(Self::Unknown),
            0x01 => Some(Self::Uart),
            _ => None,
        }
    }

    /// The single-byte wire value.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Unknown => 0x00,
            Self::Uart => 0x01,
        }
    }
}

/// The generic control set every adapter speaks, one variant per code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Liveness probe.
    Ping,
    /// Ask which peripheral interface the adapter exposes.
    ItfTypeGet,
    /// Ask for the firmware version string.
    VersionGet,
    /// Ask for the adapter's unique identifier.
    IdGet,
    /// Firmware version, UTF-8 text.
    Version(String),
    /// The peripheral interface the adapter exposes.
    ItfType(ItfType),
    /// Unique adapter identifier, raw bytes.
    Id(Bytes),
    /// Request completed.
    Good,
    /// Request failed, reason text in the payload.
    ErrGeneric(String),
    /// The request frame failed its checksum on the device side.
    ErrCrc(String),
    /// The device did not recognize the request code.
    ErrUnknownCode(String),
    /// The device rejected the request arguments.
    ErrInvalidArgs(String),
    /// The device was busy with a previous request.
    ErrBusy(String),
}

impl Message {
    /// Decode a frame that must carry `expected` as its code.
    ///
    /// A different code fails with [`ProtoError::CodeMismatch`]; a payload
    /// that does not fit the variant fails with
    /// [`ProtoError::InvalidPayload`]. Request and status payloads beyond
    /// the code itself are ignored, matching what the firmware sends.
    pub fn from_frame(expected: u16, frame: &MsgFrame) -> Result<Self> {
        if frame.code != expected {
            return Err(ProtoError::CodeMismatch {
                expected,
                got: frame.code,
            });
        }
        match expected {
            code::PING => Ok(Message::Ping),
            code::ITF_TYPE_GET => Ok(Message::ItfTypeGet),
            code::VERSION_GET => Ok(Message::VersionGet),
            code::ID_GET => Ok(Message::IdGet),
            code::VERSION => utf8_payload(frame).map(Message::Version),
            code::ITF_TYPE => itf_payload(frame).map(Message::ItfType),
            code::ID => Ok(Message::Id(frame.payload.clone())),
            code::GOOD => Ok(Message::Good),
            code::ERR_GENERIC => utf8_payload(frame).map(Message::ErrGeneric),
            code::ERR_CRC => utf8_payload(frame).map(Message::ErrCrc),
            code::ERR_UNKNOWN_CODE => utf8_payload(frame).map(Message::ErrUnknownCode),
            code::ERR_INVALID_ARGS => utf8_payload(frame).map(Message::ErrInvalidArgs),
            code::ERR_BUSY => utf8_payload(frame).map(Message::ErrBusy),
            other => Err(ProtoError::UnknownCode(other)),
        }
    }
}

impl ProtoMessage for Message {
    fn code(&self) -> u16 {
        match self {
            Message::Ping => code::PING,
            Message::ItfTypeGet => code::ITF_TYPE_GET,
            Message::VersionGet => code::VERSION_GET,
            Message::IdGet => code::ID_GET,
            Message::Version(_) => code::VERSION,
            Message::ItfType(_) => code::ITF_TYPE,
            Message::Id(_) => code::ID,
            Message::Good => code::GOOD,
            Message::ErrGeneric(_) => code::ERR_GENERIC,
            Message::ErrCrc(_) => code::ERR_CRC,
            Message::ErrUnknownCode(_) => code::ERR_UNKNOWN_CODE,
            Message::ErrInvalidArgs(_) => code::ERR_INVALID_ARGS,
            Message::ErrBusy(_) => code::ERR_BUSY,
        }
    }

    fn to_frame(&self) -> MsgFrame {
        let payload = match self {
            Message::Ping
            | Message::ItfTypeGet
            | Message::VersionGet
            | Message::IdGet
            | Message::Good => Bytes::new(),
            Message::Version(text)
            | Message::ErrGeneric(text)
            | Message::ErrCrc(text)
            | Message::ErrUnknownCode(text)
            | Message::ErrInvalidArgs(text)
            | Message::ErrBusy(text) => Bytes::copy_from_slice(text.as_bytes()),
            Message::ItfType(itf) => Bytes::copy_from_slice(&[itf.to_u8()]),
            Message::Id(id) => id.clone(),
        };
        MsgFrame::new(self.code(), payload)
    }

    fn into_generic(self) -> Option<Message> {
        Some(self)
    }
}

fn utf8_payload(frame: &MsgFrame) -> Result<String> {
    String::from_utf8(frame.payload.to_vec()).map_err(|_| ProtoError::InvalidPayload {
        code: frame.code,
        reason: "payload is not valid UTF-8".into(),
    })
}

fn itf_payload(frame: &MsgFrame) -> Result<ItfType> {
    let byte = frame
        .payload
        .first()
        .copied()
        .ok_or_else(|| ProtoError::InvalidPayload {
            code: frame.code,
            reason: "empty interface-type payload".into(),
        })?;
    ItfType::from_u8(byte).ok_or_else(|| ProtoError::InvalidPayload {
        code: frame.code,
        reason: format!("unknown interface type 0x{byte:02X}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_roundtrip() {
        let msg = Message::Version("uart-adapter 0.3.1".into());
        let frame = msg.to_frame();
        assert_eq!(frame.code, code::VERSION);
        assert_eq!(frame.payload.as_ref(), b"uart-adapter 0.3.1");

        let decoded = Message::from_frame(code::VERSION, &frame).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_itf_type_roundtrip() {
        let frame = Message::ItfType(ItfType::Uart).to_frame();
        assert_eq!(frame.payload.as_ref(), &[0x01]);

        let decoded = Message::from_frame(code::ITF_TYPE, &frame).unwrap();
        assert_eq!(decoded, Message::ItfType(ItfType::Uart));
    }

    #[test]
    fn test_id_payload_is_raw_bytes() {
        let id = Bytes::from_static(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0xC0]);
        let frame = Message::Id(id.clone()).to_frame();

        let decoded = Message::from_frame(code::ID, &frame).unwrap();
        assert_eq!(decoded, Message::Id(id));
    }

    #[test]
    fn test_ping_and_good_have_empty_payloads() {
        assert!(Message::Ping.to_frame().payload.is_empty());
        assert!(Message::Good.to_frame().payload.is_empty());
    }

    #[test]
    fn test_code_mismatch() {
        let frame = Message::Good.to_frame();
        let err = Message::from_frame(code::VERSION, &frame).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::CodeMismatch {
                expected: code::VERSION,
                got: code::GOOD,
            }
        ));
    }

    #[test]
    fn test_version_rejects_invalid_utf8() {
        let frame = MsgFrame::new(code::VERSION, Bytes::from_static(&[0xFF, 0xFE, 0x80]));
        let err = Message::from_frame(code::VERSION, &frame).unwrap_err();
        assert!(matches!(err, ProtoError::InvalidPayload { .. }));
    }

    #[test]
    fn test_itf_type_rejects_bad_payloads() {
        let empty = MsgFrame::new(code::ITF_TYPE, Bytes::new());
        assert!(matches!(
            Message::from_frame(code::ITF_TYPE, &empty),
            Err(ProtoError::InvalidPayload { .. })
        ));

        let unknown = MsgFrame::new(code::ITF_TYPE, Bytes::from_static(&[0x7F]));
        assert!(matches!(
            Message::from_frame(code::ITF_TYPE, &unknown),
            Err(ProtoError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_control_set_codes_are_bijective() {
        for code in code::CONTROL_SET {
            let payload = match code {
                code::VERSION => Bytes::from_static(b"1.0.0"),
                code::ITF_TYPE => Bytes::from_static(&[0x01]),
                c if code::is_status(c) && c != code::GOOD => Bytes::from_static(b"reason"),
                _ => Bytes::new(),
            };
            let msg = Message::from_frame(code, &MsgFrame::new(code, payload)).unwrap();
            assert_eq!(msg.code(), code);
            assert_eq!(msg.to_frame().code, code);
        }
    }
}
