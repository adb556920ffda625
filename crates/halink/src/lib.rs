//! Half-duplex request/response transport for serial-attached device
//! adapters.
//!
//! halink talks to small protocol-adapter boards that bridge a host to an
//! embedded peripheral bus. Requests go out SLIP-delimited with a CRC-16
//! trailer, the device answers each one, and a background worker keeps the
//! exchange strictly one request at a time.
//!
//! # Crate Structure
//!
//! - [`transport`] — Byte transport contract and the in-process loopback
//! - [`frame`] — SLIP stream codec and the code/payload/CRC frame codec
//! - [`proto`] — Typed messages, command codes, and the dispatch registry
//! - [`device`] — The client facade and its background link worker

pub mod device;
pub mod error;
mod worker;

pub use device::{Device, DeviceBuilder, DeviceConfig};
pub use error::{LinkError, Result};
pub use worker::MessageFilter;

/// Re-export transport types.
pub mod transport {
    pub use halink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use halink_frame::*;
}

/// Re-export protocol types.
pub mod proto {
    pub use halink_proto::*;
}
