/// Errors that can occur during message decoding and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// The frame's code has no registered decoder.
    #[error("unknown code 0x{0:04X}")]
    UnknownCode(u16),

    /// A frame was parsed as a variant with a different fixed code.
    #[error("code mismatch (expected 0x{expected:04X}, got 0x{got:04X})")]
    CodeMismatch { expected: u16, got: u16 },

    /// The payload does not fit the variant's encoding.
    #[error("invalid payload for code 0x{code:04X}: {reason}")]
    InvalidPayload { code: u16, reason: String },

    /// A second decoder was registered for an already-mapped code.
    #[error("duplicate registration for code 0x{0:04X}")]
    DuplicateCode(u16),
}

pub type Result<T> = std::result::Result<T, ProtoError>;
