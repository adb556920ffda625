use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use halink_proto::{code, ItfType, Message, MessageRegistry, ProtoError, ProtoMessage};
use halink_transport::Transport;
use tracing::debug;

use crate::error::{LinkError, Result};
use crate::worker::{MessageFilter, Worker};

/// Tunables for a device session.
#[derive(Debug, Clone, Default)]
pub struct DeviceConfig {
    /// How long [`Device::request`] waits for its response; `None` waits
    /// forever.
    pub response_timeout: Option<Duration>,
}

/// Builder for a [`Device`] with an explicit config or message filter.
pub struct DeviceBuilder<M: ProtoMessage> {
    transport: Arc<dyn Transport>,
    registry: MessageRegistry<M>,
    config: DeviceConfig,
    filter: MessageFilter<M>,
}

impl<M: ProtoMessage> DeviceBuilder<M> {
    pub fn new(transport: impl Transport + 'static, registry: MessageRegistry<M>) -> Self {
        Self {
            transport: Arc::new(transport),
            registry,
            config: DeviceConfig::default(),
            filter: Box::new(Some),
        }
    }

    pub fn with_config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    /// Install a hook that sees every decoded message before delivery.
    ///
    /// Returning `None` drops the message; see [`MessageFilter`].
    pub fn with_filter(mut self, filter: impl FnMut(M) -> Option<M> + Send + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    /// Spawn the link worker and open the session.
    pub fn open(self) -> Result<Device<M>> {
        let (outbound_tx, outbound_rx) = unbounded();
        let (inbound_tx, inbound_rx) = unbounded();
        let run = Arc::new(AtomicBool::new(true));

        let worker = Worker::new(
            Arc::clone(&self.transport),
            self.registry,
            outbound_rx,
            inbound_tx,
            Arc::clone(&run),
            self.filter,
        );
        let handle = thread::Builder::new()
            .name("halink-worker".to_string())
            .spawn(move || worker.run())
            .map_err(LinkError::Spawn)?;

        Ok(Device {
            transport: self.transport,
            outbound: outbound_tx,
            inbound: inbound_rx,
            run,
            worker: Some(handle),
            config: self.config,
        })
    }
}

/// A live request/response session with one device adapter.
///
/// The session is half-duplex: requests queue up on the facade side and
/// the worker releases the next one only after the device answered the
/// previous. Any number of threads may share a `Device` reference;
/// response ordering between them follows request order.
pub struct Device<M: ProtoMessage> {
    transport: Arc<dyn Transport>,
    outbound: Sender<M>,
    inbound: Receiver<M>,
    run: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    config: DeviceConfig,
}

impl<M: ProtoMessage> Device<M> {
    /// Open a session with the default config and no filter.
    pub fn open(
        transport: impl Transport + 'static,
        registry: MessageRegistry<M>,
    ) -> Result<Self> {
        DeviceBuilder::new(transport, registry).open()
    }

    /// Start configuring a session.
    pub fn builder(
        transport: impl Transport + 'static,
        registry: MessageRegistry<M>,
    ) -> DeviceBuilder<M> {
        DeviceBuilder::new(transport, registry)
    }

    /// Queue a request and wake the worker so it goes out promptly.
    pub fn send_request(&self, req: M) -> Result<()> {
        self.outbound.send(req).map_err(|_| LinkError::Stopped)?;
        self.transport.cancel_read();
        Ok(())
    }

    /// Pop the next inbound message, waiting up to `timeout`.
    ///
    /// `None` waits indefinitely. Fails [`LinkError::Stopped`] once the
    /// worker has exited and the queue is drained.
    pub fn read_response(&self, timeout: Option<Duration>) -> Result<M> {
        match timeout {
            Some(timeout) => self.inbound.recv_timeout(timeout).map_err(|err| match err {
                RecvTimeoutError::Timeout => LinkError::Timeout(timeout),
                RecvTimeoutError::Disconnected => LinkError::Stopped,
            }),
            None => self.inbound.recv().map_err(|_| LinkError::Stopped),
        }
    }

    /// Send `req` and wait for the response carrying `expected_code`.
    ///
    /// A response with any other code is consumed, not requeued, and the
    /// call fails [`LinkError::UnexpectedResponse`].
    ///
    /// After a [`LinkError::Timeout`] the request is still in flight: only
    /// its late response releases the link, and that response lands in the
    /// inbound queue ahead of the next request's.
    pub fn request(&self, req: M, expected_code: u16) -> Result<M> {
        self.send_request(req)?;
        let resp = self.read_response(self.config.response_timeout)?;
        if resp.code() != expected_code {
            return Err(LinkError::UnexpectedResponse {
                expected: expected_code,
                got: resp.code(),
            });
        }
        Ok(resp)
    }

    /// Stop the worker and join it. Also run by `Drop`; calling twice is
    /// harmless.
    pub fn stop(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.run.store(false, Ordering::SeqCst);
            self.transport.cancel_read();
            debug!("stopping link worker");
            let _ = handle.join();
        }
    }
}

/// Control-set conveniences, available whenever `M` can carry the generic
/// messages.
impl<M: ProtoMessage + From<Message>> Device<M> {
    /// Check the device is alive and answering.
    pub fn ping(&self) -> Result<()> {
        self.request(Message::Ping.into(), code::GOOD)?;
        Ok(())
    }

    /// The device firmware version string.
    pub fn version(&self) -> Result<String> {
        let resp = self.request(Message::VersionGet.into(), code::VERSION)?;
        match resp.into_generic() {
            Some(Message::Version(version)) => Ok(version),
            _ => Err(foreign_decoder(code::VERSION)),
        }
    }

    /// Which peripheral interface the device exposes.
    pub fn itf_type(&self) -> Result<ItfType> {
        let resp = self.request(Message::ItfTypeGet.into(), code::ITF_TYPE)?;
        match resp.into_generic() {
            Some(Message::ItfType(itf)) => Ok(itf),
            _ => Err(foreign_decoder(code::ITF_TYPE)),
        }
    }

    /// The device's unique identifier.
    pub fn device_id(&self) -> Result<Bytes> {
        let resp = self.request(Message::IdGet.into(), code::ID)?;
        match resp.into_generic() {
            Some(Message::Id(id)) => Ok(id),
            _ => Err(foreign_decoder(code::ID)),
        }
    }
}

// Only reachable through a registry that maps a control-set code to a
// non-generic decoder.
fn foreign_decoder(code: u16) -> LinkError {
    LinkError::Proto(ProtoError::InvalidPayload {
        code,
        reason: "control-set code decoded to a non-generic message".into(),
    })
}

impl<M: ProtoMessage> Drop for Device<M> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<M: ProtoMessage> std::fmt::Debug for Device<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("running", &self.run.load(Ordering::SeqCst))
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halink_transport::LoopbackPort;

    #[test]
    fn stop_is_idempotent() {
        let (port, _peer) = LoopbackPort::pair();
        let mut device = Device::open(port, MessageRegistry::generic()).expect("device opens");
        device.stop();
        device.stop();
    }

    #[test]
    fn send_after_stop_fails() {
        let (port, _peer) = LoopbackPort::pair();
        let mut device = Device::open(port, MessageRegistry::generic()).expect("device opens");
        device.stop();

        let err = device.send_request(Message::Ping).unwrap_err();
        assert!(matches!(err, LinkError::Stopped));
    }

    #[test]
    fn read_response_times_out_when_device_is_silent() {
        let (port, _peer) = LoopbackPort::pair();
        let device = Device::open(port, MessageRegistry::generic()).expect("device opens");

        let err = device
            .read_response(Some(Duration::from_millis(20)))
            .unwrap_err();
        assert!(matches!(err, LinkError::Timeout(_)));
    }
}
