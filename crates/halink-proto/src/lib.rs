//! Typed command codes, messages, and the dispatch registry for halink.
//!
//! The wire layer moves opaque `code + payload` frames; this crate gives
//! the codes meaning. [`Message`] covers the generic control set every
//! adapter speaks, [`uart::UartMessage`] the UART peripheral family, and
//! [`MessageRegistry`] maps response codes to decoders so a session can
//! turn verified frames into typed values without knowing which request
//! produced them.

pub mod code;
pub mod error;
pub mod message;
pub mod registry;
pub mod uart;

pub use error::{ProtoError, Result};
pub use message::{ItfType, Message, ProtoMessage};
pub use registry::{MessageRegistry, RegistryBuilder};
