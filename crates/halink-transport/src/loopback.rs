use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// One direction of the loopback link.
struct Pipe {
    state: Mutex<PipeState>,
    readable: Condvar,
}

#[derive(Default)]
struct PipeState {
    buf: VecDeque<u8>,
    cancel: bool,
    closed: bool,
}

impl Pipe {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PipeState::default()),
            readable: Condvar::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, PipeState> {
        self.state.lock().expect("loopback pipe lock poisoned")
    }

    fn notify(&self) {
        self.readable.notify_all();
    }
}

/// In-process transport: two linked ports, each reading what the other writes.
///
/// Stands in for a serial port wherever a scripted peer is more convenient
/// than hardware. Cancel and close semantics follow the [`Transport`]
/// contract exactly, so worker behavior observed against a loopback carries
/// over to real links.
pub struct LoopbackPort {
    /// Filled by the peer's writes, drained by this port's reads.
    rx: Arc<Pipe>,
    /// Filled by this port's writes, drained by the peer's reads.
    tx: Arc<Pipe>,
}

impl LoopbackPort {
    /// Create a linked pair. Bytes written to one port are read from the
    /// other. Dropping either port closes the link in both directions; the
    /// surviving port may still drain bytes buffered before the drop.
    pub fn pair() -> (LoopbackPort, LoopbackPort) {
        let ab = Pipe::new();
        let ba = Pipe::new();
        let a = LoopbackPort {
            rx: Arc::clone(&ba),
            tx: Arc::clone(&ab),
        };
        let b = LoopbackPort { rx: ab, tx: ba };
        (a, b)
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "loopback"
    }
}

impl Transport for LoopbackPort {
    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut state = self.rx.lock();
        loop {
            if !state.buf.is_empty() {
                let n = buf.len().min(state.buf.len());
                for (slot, byte) in buf.iter_mut().zip(state.buf.drain(..n)) {
                    *slot = byte;
                }
                return Ok(n);
            }
            if state.cancel {
                state.cancel = false;
                return Ok(0);
            }
            if state.closed {
                return Err(TransportError::Closed);
            }
            state = self
                .rx
                .readable
                .wait(state)
                .expect("loopback pipe lock poisoned");
        }
    }

    fn write(&self, buf: &[u8]) -> Result<()> {
        let mut state = self.tx.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.buf.extend(buf.iter().copied());
        drop(state);
        self.tx.notify();
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn cancel_read(&self) {
        let mut state = self.rx.lock();
        state.cancel = true;
        drop(state);
        self.rx.notify();
    }
}

impl Drop for LoopbackPort {
    fn drop(&mut self) {
        debug!("closing loopback port");
        for pipe in [&self.rx, &self.tx] {
            let mut state = pipe.lock();
            state.closed = true;
            drop(state);
            pipe.notify();
        }
    }
}

impl std::fmt::Debug for LoopbackPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.rx.lock();
        f.debug_struct("LoopbackPort")
            .field("rx_buffered", &state.buf.len())
            .field("closed", &state.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_write_then_read() {
        let (a, b) = LoopbackPort::pair();
        b.write(b"hello").unwrap();
        b.flush().unwrap();

        let mut buf = [0u8; 16];
        let n = a.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[test]
    fn test_short_reads_drain_in_order() {
        let (a, b) = LoopbackPort::pair();
        b.write(&[1, 2, 3, 4, 5, 6]).unwrap();

        let mut buf = [0u8; 4];
        let n = a.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[1, 2, 3, 4]);
        let n = a.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[5, 6]);
    }

    #[test]
    fn test_read_blocks_until_data() {
        let (a, b) = LoopbackPort::pair();

        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            b.write(b"late").unwrap();
            // keep b alive until the write is observable
            std::thread::sleep(Duration::from_millis(20));
        });

        let mut buf = [0u8; 8];
        let n = a.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"late");
        writer.join().unwrap();
    }

    #[test]
    fn test_cancel_unblocks_pending_read() {
        let (a, _b) = LoopbackPort::pair();
        let a = Arc::new(a);

        let reader = {
            let a = Arc::clone(&a);
            std::thread::spawn(move || {
                let mut buf = [0u8; 8];
                a.read(&mut buf).unwrap()
            })
        };

        std::thread::sleep(Duration::from_millis(20));
        a.cancel_read();
        assert_eq!(reader.join().unwrap(), 0);
    }

    #[test]
    fn test_cancel_with_no_pending_read_applies_to_next() {
        let (a, b) = LoopbackPort::pair();
        a.cancel_read();

        let mut buf = [0u8; 8];
        assert_eq!(a.read(&mut buf).unwrap(), 0);

        // the flag is one-shot; a later read still delivers data
        b.write(b"x").unwrap();
        assert_eq!(a.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'x');
    }

    #[test]
    fn test_peer_drop_closes_both_directions() {
        let (a, b) = LoopbackPort::pair();
        drop(b);

        let mut buf = [0u8; 8];
        assert!(matches!(a.read(&mut buf), Err(TransportError::Closed)));
        assert!(matches!(a.write(b"x"), Err(TransportError::Closed)));
    }

    #[test]
    fn test_buffered_bytes_survive_peer_drop() {
        let (a, b) = LoopbackPort::pair();
        b.write(b"tail").unwrap();
        drop(b);

        let mut buf = [0u8; 8];
        let n = a.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"tail");
        assert!(matches!(a.read(&mut buf), Err(TransportError::Closed)));
    }
}
