use std::collections::HashMap;

use halink_frame::MsgFrame;

use crate::code;
use crate::error::{ProtoError, Result};
use crate::message::{Message, ProtoMessage};

type DecodeFn<M> = Box<dyn Fn(&MsgFrame) -> Result<M> + Send + Sync>;

/// Builder that collects per-code decoders before freezing them into a
/// [`MessageRegistry`].
pub struct RegistryBuilder<M: ProtoMessage> {
    decoders: HashMap<u16, DecodeFn<M>>,
}

impl<M: ProtoMessage> RegistryBuilder<M> {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register a decoder for one wire code.
    ///
    /// Fails with [`ProtoError::DuplicateCode`] if the code is already
    /// claimed, so peripheral extensions cannot silently shadow the
    /// control set or each other.
    pub fn register<F>(&mut self, code: u16, decode: F) -> Result<()>
    where
        F: Fn(&MsgFrame) -> Result<M> + Send + Sync + 'static,
    {
        if self.decoders.contains_key(&code) {
            return Err(ProtoError::DuplicateCode(code));
        }
        self.decoders.insert(code, Box::new(decode));
        Ok(())
    }

    /// Register decoders for every generic control-set code, wrapping each
    /// decoded [`Message`] into `M` with `wrap`.
    pub fn with_control_set(&mut self, wrap: fn(Message) -> M) -> Result<()> {
        for code in code::CONTROL_SET {
            self.register(code, move |frame| {
                Message::from_frame(code, frame).map(wrap)
            })?;
        }
        Ok(())
    }

    /// Freeze the decoder table. The registry has no mutators, so a built
    /// table never changes under a running reader.
    pub fn build(self) -> MessageRegistry<M> {
        MessageRegistry {
            decoders: self.decoders,
        }
    }
}

impl<M: ProtoMessage> Default for RegistryBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable map from wire code to message decoder.
///
/// One registry serves a whole device session; lookups are by the frame's
/// code, so decoding is independent of which request is in flight.
pub struct MessageRegistry<M: ProtoMessage> {
    decoders: HashMap<u16, DecodeFn<M>>,
}

impl<M: ProtoMessage> MessageRegistry<M> {
    /// Decode a checksum-verified frame into a typed message.
    ///
    /// A code with no registered decoder fails with
    /// [`ProtoError::UnknownCode`].
    pub fn dispatch(&self, frame: &MsgFrame) -> Result<M> {
        let decode = self
            .decoders
            .get(&frame.code)
            .ok_or(ProtoError::UnknownCode(frame.code))?;
        decode(frame)
    }

    /// Whether a decoder is registered for `code`.
    pub fn has_code(&self, code: u16) -> bool {
        self.decoders.contains_key(&code)
    }

    /// All registered codes, sorted.
    pub fn codes(&self) -> Vec<u16> {
        let mut codes: Vec<u16> = self.decoders.keys().copied().collect();
        codes.sort_unstable();
        codes
    }
}

impl MessageRegistry<Message> {
    /// A registry for the generic control set alone, with no peripheral
    /// extensions.
    pub fn generic() -> Self {
        let mut builder = RegistryBuilder::new();
        builder
            .with_control_set(std::convert::identity)
            .expect("control set codes are unique");
        builder.build()
    }
}

impl<M: ProtoMessage> std::fmt::Debug for MessageRegistry<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRegistry")
            .field("codes", &self.codes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_generic_registry_dispatches_control_set() {
        let registry = MessageRegistry::generic();

        let good = registry.dispatch(&MsgFrame::new(code::GOOD, Bytes::new())).unwrap();
        assert_eq!(good, Message::Good);

        let version = registry
            .dispatch(&MsgFrame::new(code::VERSION, &b"2.4.0"[..]))
            .unwrap();
        assert_eq!(version, Message::Version("2.4.0".into()));
    }

    #[test]
    fn test_generic_registry_covers_exactly_the_control_set() {
        let registry = MessageRegistry::generic();
        assert_eq!(registry.codes(), {
            let mut codes = code::CONTROL_SET.to_vec();
            codes.sort_unstable();
            codes
        });
    }

    #[test]
    fn test_dispatch_unknown_code() {
        let registry = MessageRegistry::generic();
        let err = registry
            .dispatch(&MsgFrame::new(0x1000, Bytes::new()))
            .unwrap_err();
        assert!(matches!(err, ProtoError::UnknownCode(0x1000)));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut builder: RegistryBuilder<Message> = RegistryBuilder::new();
        builder.with_control_set(std::convert::identity).unwrap();

        let err = builder
            .register(code::PING, |_| Ok(Message::Ping))
            .unwrap_err();
        assert!(matches!(err, ProtoError::DuplicateCode(code::PING)));
    }

    // A minimal peripheral extension, shaped like a GPIO adapter would be.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum GpioMessage {
        Generic(Message),
        Read,
        Value(u8),
    }

    const GPIO_READ: u16 = 0x0102;
    const GPIO_VALUE: u16 = 0xFDFF;

    impl ProtoMessage for GpioMessage {
        fn code(&self) -> u16 {
            match self {
                GpioMessage::Generic(msg) => msg.code(),
                GpioMessage::Read => GPIO_READ,
                GpioMessage::Value(_) => GPIO_VALUE,
            }
        }

        fn to_frame(&self) -> MsgFrame {
            match self {
                GpioMessage::Generic(msg) => msg.to_frame(),
                GpioMessage::Read => MsgFrame::new(GPIO_READ, Bytes::new()),
                GpioMessage::Value(v) => MsgFrame::new(GPIO_VALUE, Bytes::copy_from_slice(&[*v])),
            }
        }

        fn into_generic(self) -> Option<Message> {
            match self {
                GpioMessage::Generic(msg) => Some(msg),
                _ => None,
            }
        }
    }

    #[test]
    fn test_peripheral_extension_dispatch() {
        let mut builder = RegistryBuilder::new();
        builder.with_control_set(GpioMessage::Generic).unwrap();
        builder
            .register(GPIO_VALUE, |frame| {
                frame
                    .payload
                    .first()
                    .copied()
                    .map(GpioMessage::Value)
                    .ok_or(ProtoError::InvalidPayload {
                        code: GPIO_VALUE,
                        reason: "empty gpio value".into(),
                    })
            })
            .unwrap();
        let registry = builder.build();

        let value = registry
            .dispatch(&MsgFrame::new(GPIO_VALUE, Bytes::from_static(&[0x01])))
            .unwrap();
        assert_eq!(value, GpioMessage::Value(0x01));

        let good = registry.dispatch(&MsgFrame::new(code::GOOD, Bytes::new())).unwrap();
        assert_eq!(good, GpioMessage::Generic(Message::Good));
        assert_eq!(good.into_generic(), Some(Message::Good));
    }
}
