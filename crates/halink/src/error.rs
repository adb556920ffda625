/// Errors that can occur on a device link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] halink_transport::TransportError),

    /// Stream or frame codec error.
    #[error("frame error: {0}")]
    Frame(#[from] halink_frame::FrameError),

    /// Message decode or registry error.
    #[error("protocol error: {0}")]
    Proto(#[from] halink_proto::ProtoError),

    /// A response arrived, but not the one the request expects.
    #[error("expected response code 0x{expected:04X}, got 0x{got:04X}")]
    UnexpectedResponse { expected: u16, got: u16 },

    /// No response arrived within the configured timeout.
    #[error("no response within {0:?}")]
    Timeout(std::time::Duration),

    /// The link worker has stopped and no further messages will arrive.
    #[error("link worker stopped")]
    Stopped,

    /// The worker thread could not be spawned.
    #[error("failed to spawn link worker: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LinkError>;
