/// Errors that can occur during stream or frame decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An escape byte was followed by something other than 0xDC or 0xDD.
    #[error("invalid escape byte 0x{byte:02X} after ESC")]
    InvalidEscape { byte: u8, pos: usize },

    /// The unescaped frame outgrew the decoder's limit.
    #[error("frame exceeds {limit}-byte limit")]
    TooLong { limit: usize, pos: usize },

    /// The frame holds fewer bytes than code + checksum.
    #[error("frame too short ({len} bytes, need at least 4)")]
    TooShort { len: usize },

    /// The trailing checksum disagrees with the frame contents.
    #[error("crc mismatch (frame carries 0x{expected:04X}, computed 0x{computed:04X})")]
    CrcMismatch { expected: u16, computed: u16 },
}

impl FrameError {
    /// For stream-decode errors, the number of bytes of the failing `feed`
    /// call that were consumed, offending byte included. Lets a caller skip
    /// past the bad byte and resynchronize on the next frame boundary.
    pub fn chunk_pos(&self) -> Option<usize> {
        match self {
            FrameError::InvalidEscape { pos, .. } | FrameError::TooLong { pos, .. } => Some(*pos),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
