//! Message family for UART adapters, a peripheral extension of the
//! generic control set.

use bytes::Bytes;
use halink_frame::MsgFrame;

use crate::code;
use crate::error::{ProtoError, Result};
use crate::message::{Message, ProtoMessage};
use crate::registry::{MessageRegistry, RegistryBuilder};

/// UART response codes an adapter can send on top of the control set.
const UART_RESPONSE_CODES: [u16; 2] = [code::UART_DATA_RX, code::UART_BAUD];

/// Everything a UART adapter session can carry, generic control-set
/// traffic included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UartMessage {
    /// A control-set message.
    Generic(Message),
    /// Bytes for the adapter to put on its UART TX line.
    DataTx(Bytes),
    /// Ask for whatever the adapter has buffered from its UART RX line.
    DataRxGet,
    /// Buffered UART RX bytes, possibly empty.
    DataRx(Bytes),
    /// Set the UART baud rate.
    BaudSet(u32),
    /// Ask for the current UART baud rate.
    BaudGet,
    /// The current UART baud rate.
    Baud(u32),
}

impl UartMessage {
    /// Decode a frame that must carry `expected` as its code.
    pub fn from_frame(expected: u16, frame: &MsgFrame) -> Result<Self> {
        if frame.code != expected {
            return Err(ProtoError::CodeMismatch {
                expected,
                got: frame.code,
            });
        }
        match expected {
            code::UART_DATA_TX => Ok(UartMessage::DataTx(frame.payload.clone())),
            code::UART_DATA_RX_GET => Ok(UartMessage::DataRxGet),
            code::UART_DATA_RX => Ok(UartMessage::DataRx(frame.payload.clone())),
            code::UART_BAUD_SET => baud_payload(frame).map(UartMessage::BaudSet),
            code::UART_BAUD_GET => Ok(UartMessage::BaudGet),
            code::UART_BAUD => baud_payload(frame).map(UartMessage::Baud),
            other => Message::from_frame(other, frame).map(UartMessage::Generic),
        }
    }
}

impl ProtoMessage for UartMessage {
    fn code(&self) -> u16 {
        match self {
            UartMessage::Generic(msg) => msg.code(),
            UartMessage::DataTx(_) => code::UART_DATA_TX,
            UartMessage::DataRxGet => code::UART_DATA_RX_GET,
            UartMessage::DataRx(_) => code::UART_DATA_RX,
            UartMessage::BaudSet(_) => code::UART_BAUD_SET,
            UartMessage::BaudGet => code::UART_BAUD_GET,
            UartMessage::Baud(_) => code::UART_BAUD,
        }
    }

    fn to_frame(&self) -> MsgFrame {
        match self {
            UartMessage::Generic(msg) => msg.to_frame(),
            UartMessage::DataTx(data) | UartMessage::DataRx(data) => {
                MsgFrame::new(self.code(), data.clone())
            }
            UartMessage::DataRxGet | UartMessage::BaudGet => {
                MsgFrame::new(self.code(), Bytes::new())
            }
            UartMessage::BaudSet(baud) | UartMessage::Baud(baud) => {
                MsgFrame::new(self.code(), Bytes::copy_from_slice(&baud.to_be_bytes()))
            }
        }
    }

    fn into_generic(self) -> Option<Message> {
        match self {
            UartMessage::Generic(msg) => Some(msg),
            _ => None,
        }
    }
}

impl From<Message> for UartMessage {
    fn from(msg: Message) -> Self {
        UartMessage::Generic(msg)
    }
}

fn baud_payload(frame: &MsgFrame) -> Result<u32> {
    let bytes: [u8; 4] =
        frame
            .payload
            .as_ref()
            .try_into()
            .map_err(|_| ProtoError::InvalidPayload {
                code: frame.code,
                reason: format!("baud payload is {} bytes, want 4", frame.payload.len()),
            })?;
    Ok(u32::from_be_bytes(bytes))
}

/// A registry covering the control set plus the UART response codes.
///
/// Request codes are left out on purpose: the table decodes the traffic
/// a host can receive, so a request code echoed back by an adapter fails
/// [`ProtoError::UnknownCode`] instead of decoding as a request.
pub fn registry() -> MessageRegistry<UartMessage> {
    let mut builder = RegistryBuilder::new();
    builder
        .with_control_set(UartMessage::Generic)
        .expect("control set codes are unique");
    for code in UART_RESPONSE_CODES {
        builder
            .register(code, move |frame| UartMessage::from_frame(code, frame))
            .expect("uart codes do not collide with the control set");
    }
    builder.build()
}
