use crate::error::Result;

/// A byte-oriented link to the device.
///
/// Implementations wrap whatever carries bytes to the far end: a serial
/// port, a USB CDC endpoint, or the in-process [`LoopbackPort`] pair used in
/// tests. The link worker drives exactly one transport from a single thread;
/// the only method invoked from other threads is [`cancel_read`].
///
/// [`LoopbackPort`]: crate::loopback::LoopbackPort
/// [`cancel_read`]: Transport::cancel_read
pub trait Transport: Send + Sync {
    /// Read up to `buf.len()` bytes, blocking until at least one byte is
    /// available or the read is canceled.
    ///
    /// Returns the number of bytes read. `Ok(0)` means the read was canceled
    /// via [`cancel_read`], never end of stream; a vanished peer is reported
    /// as [`TransportError::Closed`].
    ///
    /// [`cancel_read`]: Transport::cancel_read
    /// [`TransportError::Closed`]: crate::error::TransportError::Closed
    fn read(&self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `buf` to the link.
    fn write(&self, buf: &[u8]) -> Result<()>;

    /// Push any buffered bytes out to the wire.
    fn flush(&self) -> Result<()>;

    /// Unblock a pending [`read`] without closing the transport.
    ///
    /// A cancel issued while no read is pending is remembered and consumed
    /// by the next read, so wakeups are never lost.
    ///
    /// [`read`]: Transport::read
    fn cancel_read(&self);
}
