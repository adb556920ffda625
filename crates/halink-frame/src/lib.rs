//! SLIP byte stuffing and CRC-16 checked command framing.
//!
//! This is the wire layer of halink. A command frame is:
//! - A 2-byte big-endian command code
//! - The code-specific payload
//! - A 2-byte big-endian CRC-16/CCITT-FALSE over code and payload
//!
//! On the line, frames are delimited by SLIP byte stuffing (`END`/`ESC`
//! reserved bytes), so a receiver can resynchronize on a frame boundary
//! regardless of where it started listening.

pub mod codec;
pub mod error;
pub mod slip;

pub use codec::{crc16, decode_frame, encode_frame, MsgFrame, MIN_FRAME_SIZE};
pub use error::{FrameError, Result};
pub use slip::{Decoder, DEFAULT_MAX_FRAME, END, ESC, ESC_END, ESC_ESC};
