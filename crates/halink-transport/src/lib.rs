//! Byte transport contract for half-duplex serial device links.
//!
//! Provides the blocking, cancelable [`Transport`] trait the link worker
//! drives, plus an in-process [`LoopbackPort`] pair that stands in for a
//! physical serial port in tests and examples.
//!
//! This is the lowest layer of halink. Everything else builds on top of
//! the [`Transport`] contract defined here.

pub mod error;
pub mod loopback;
pub mod traits;

pub use error::{Result, TransportError};
pub use loopback::LoopbackPort;
pub use traits::Transport;
