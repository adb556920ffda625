use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Frame delimiter.
pub const END: u8 = 0xC0;
/// Escape introducer.
pub const ESC: u8 = 0xDB;
/// Follows [`ESC`] to encode a literal [`END`].
pub const ESC_END: u8 = 0xDC;
/// Follows [`ESC`] to encode a literal [`ESC`].
pub const ESC_ESC: u8 = 0xDD;

/// Default cap on the unescaped length of a single frame: 4 KiB.
pub const DEFAULT_MAX_FRAME: usize = 4 * 1024;

/// Byte-stuff `payload` into `dst`, appending a trailing [`END`].
///
/// With `prepend_end` set, a leading [`END`] is emitted first; it terminates
/// any garbage the far side may have accumulated before this frame starts.
pub fn encode(payload: &[u8], prepend_end: bool, dst: &mut BytesMut) {
    dst.reserve(payload.len() + 2);
    if prepend_end {
        dst.put_u8(END);
    }
    for &byte in payload {
        match byte {
            END => {
                dst.put_u8(ESC);
                dst.put_u8(ESC_END);
            }
            ESC => {
                dst.put_u8(ESC);
                dst.put_u8(ESC_ESC);
            }
            other => dst.put_u8(other),
        }
    }
    dst.put_u8(END);
}

/// Stateful SLIP decoder fed from arbitrarily-sized read chunks.
///
/// Feed bytes with [`feed`]; once it reports a complete frame, take the
/// unescaped bytes from [`frame`] and call [`reset`] before feeding anything
/// further. After an error the partial buffer is invalid and [`reset`] is
/// likewise required.
///
/// [`feed`]: Decoder::feed
/// [`frame`]: Decoder::frame
/// [`reset`]: Decoder::reset
#[derive(Debug)]
pub struct Decoder {
    buf: BytesMut,
    escaping: bool,
    max_frame: usize,
}

impl Decoder {
    /// A decoder with the [`DEFAULT_MAX_FRAME`] length cap.
    pub fn new() -> Self {
        Self::with_max_frame(DEFAULT_MAX_FRAME)
    }

    /// A decoder with an explicit cap on the unescaped frame length.
    pub fn with_max_frame(max_frame: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            escaping: false,
            max_frame,
        }
    }

    /// Process `chunk` left to right until a frame boundary or exhaustion.
    ///
    /// Returns `(consumed, frame_complete)`. A literal [`END`] stops the
    /// scan immediately: `consumed` covers the bytes processed in this call,
    /// the `END` included, and the unescaped frame is readable from
    /// [`frame`] until [`reset`]. Exhausting the chunk without a boundary
    /// returns `(chunk.len(), false)`; escape state carries over to the
    /// next call.
    ///
    /// An [`ESC`] followed by anything other than `0xDC`/`0xDD` fails with
    /// [`FrameError::InvalidEscape`]; exceeding the length cap fails with
    /// [`FrameError::TooLong`]. Both report the consumed byte count through
    /// [`FrameError::chunk_pos`] so the caller can skip past the offender.
    ///
    /// [`frame`]: Decoder::frame
    /// [`reset`]: Decoder::reset
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(usize, bool)> {
        for (i, &byte) in chunk.iter().enumerate() {
            if self.escaping {
                self.escaping = false;
                match byte {
                    ESC_END => self.push(END, i)?,
                    ESC_ESC => self.push(ESC, i)?,
                    other => {
                        return Err(FrameError::InvalidEscape {
                            byte: other,
                            pos: i + 1,
                        })
                    }
                }
            } else {
                match byte {
                    END => return Ok((i + 1, true)),
                    ESC => self.escaping = true,
                    other => self.push(other, i)?,
                }
            }
        }
        Ok((chunk.len(), false))
    }

    fn push(&mut self, byte: u8, pos: usize) -> Result<()> {
        if self.buf.len() == self.max_frame {
            return Err(FrameError::TooLong {
                limit: self.max_frame,
                pos: pos + 1,
            });
        }
        self.buf.put_u8(byte);
        Ok(())
    }

    /// The unescaped bytes accumulated for the current frame.
    pub fn frame(&self) -> &[u8] {
        &self.buf
    }

    /// Clear buffer and escape state. Required after every frame boundary,
    /// successful or not, before bytes of a new frame are fed.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.escaping = false;
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
