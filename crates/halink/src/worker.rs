use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use halink_frame::{decode_frame, encode_frame, slip, Decoder};
use halink_proto::{code, MessageRegistry, ProtoMessage};
use halink_transport::Transport;
use tracing::{debug, error, warn};

/// How many bytes each blocking transport read may return at once.
pub(crate) const READ_CHUNK_SIZE: usize = 256;

/// Hook applied to every decoded message before it reaches the inbound
/// queue.
///
/// Returning `None` drops the message without clearing the in-flight
/// gate, so unsolicited traffic never releases a pending request.
pub type MessageFilter<M> = Box<dyn FnMut(M) -> Option<M> + Send>;

/// The single thread that owns the transport and the half-duplex gate.
///
/// Exactly one request is in flight at a time: a queued request is only
/// written while the worker is not awaiting a response, and the gate
/// clears when a decoded message is delivered inbound.
pub(crate) struct Worker<M: ProtoMessage> {
    transport: Arc<dyn Transport>,
    registry: MessageRegistry<M>,
    outbound: Receiver<M>,
    inbound: Sender<M>,
    run: Arc<AtomicBool>,
    filter: MessageFilter<M>,
    decoder: Decoder,
    awaiting_response: bool,
}

impl<M: ProtoMessage> Worker<M> {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        registry: MessageRegistry<M>,
        outbound: Receiver<M>,
        inbound: Sender<M>,
        run: Arc<AtomicBool>,
        filter: MessageFilter<M>,
    ) -> Self {
        Self {
            transport,
            registry,
            outbound,
            inbound,
            run,
            filter,
            decoder: Decoder::new(),
            awaiting_response: false,
        }
    }

    /// Drive the link until the run flag clears, the transport fails, or
    /// the facade side goes away.
    pub(crate) fn run(mut self) {
        debug!("link worker started");
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        while self.run.load(Ordering::SeqCst) {
            if !self.awaiting_response {
                match self.outbound.try_recv() {
                    Ok(msg) => {
                        if let Err(err) = self.transmit(&msg) {
                            error!(error = %err, "transport write failed, link is down");
                            break;
                        }
                        self.awaiting_response = true;
                    }
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => break,
                }
            }

            // Doubles as the idle wait: enqueue and stop both cancel it.
            let n = match self.transport.read(&mut chunk) {
                Ok(n) => n,
                Err(err) => {
                    error!(error = %err, "transport read failed, link is down");
                    break;
                }
            };
            if !self.consume(&chunk[..n]) {
                break;
            }
        }
        debug!("link worker stopped");
    }

    fn transmit(&self, msg: &M) -> halink_transport::Result<()> {
        let frame = msg.to_frame();
        debug!(
            code = frame.code,
            name = code::name(frame.code),
            size = frame.payload.len(),
            "sending request"
        );
        let mut encoded = BytesMut::with_capacity(frame.wire_size());
        encode_frame(&frame, &mut encoded);
        let mut wire = BytesMut::with_capacity(encoded.len() + 2);
        slip::encode(&encoded, false, &mut wire);
        self.transport.write(&wire)?;
        self.transport.flush()
    }

    /// Feed a read chunk through the stream decoder, delivering every
    /// completed frame it holds.
    ///
    /// Corrupt input is logged and skipped byte-precisely, so a bad frame
    /// never swallows a good one arriving in the same chunk. Returns
    /// `false` once the inbound side is gone.
    fn consume(&mut self, mut bytes: &[u8]) -> bool {
        while !bytes.is_empty() {
            match self.decoder.feed(bytes) {
                Ok((used, true)) => {
                    bytes = &bytes[used..];
                    let delivered = self.deliver();
                    self.decoder.reset();
                    if !delivered {
                        return false;
                    }
                }
                Ok((_, false)) => break,
                Err(err) => {
                    warn!(error = %err, "discarding corrupt input");
                    let skip = err.chunk_pos().unwrap_or(bytes.len()).min(bytes.len());
                    bytes = &bytes[skip..];
                    self.decoder.reset();
                }
            }
        }
        true
    }

    fn deliver(&mut self) -> bool {
        let frame = match decode_frame(self.decoder.frame()) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "discarding corrupt frame");
                return true;
            }
        };
        let msg = match self.registry.dispatch(&frame) {
            Ok(msg) => msg,
            Err(err) => {
                warn!(
                    error = %err,
                    code = frame.code,
                    name = code::name(frame.code),
                    "discarding undecodable frame"
                );
                return true;
            }
        };
        debug!(
            code = frame.code,
            name = code::name(frame.code),
            size = frame.payload.len(),
            "received message"
        );
        match (self.filter)(msg) {
            Some(msg) => {
                if self.inbound.send(msg).is_err() {
                    return false;
                }
                self.awaiting_response = false;
            }
            None => debug!(code = frame.code, "message vetoed by filter"),
        }
        true
    }
}
