/// Errors that can occur on a device transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The other end of the link is gone.
    #[error("transport closed by peer")]
    Closed,

    /// An I/O error occurred on the underlying byte stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
