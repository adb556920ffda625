//! UART adapter session example — talks to a scripted device over an
//! in-process loopback link.
//!
//! Run with:
//!   cargo run --example uart-session

use std::thread;

use bytes::{Bytes, BytesMut};
use halink::frame::{decode_frame, encode_frame, slip, Decoder, MsgFrame};
use halink::proto::uart::{self, UartMessage};
use halink::proto::{code, ItfType};
use halink::transport::{LoopbackPort, Transport};
use halink::Device;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .init();

    let (host_port, adapter_port) = LoopbackPort::pair();
    let adapter = thread::spawn(move || run_adapter(adapter_port));

    let device = Device::open(host_port, uart::registry())?;

    device.ping()?;
    eprintln!("[host] device answered ping");

    let version = device.version()?;
    eprintln!("[host] firmware version: {version}");

    let itf = device.itf_type()?;
    eprintln!("[host] interface type: {itf:?}");

    device.request(UartMessage::BaudSet(115_200), code::GOOD)?;
    eprintln!("[host] baud rate set");

    device.request(UartMessage::DataTx("AT\r\n".into()), code::GOOD)?;
    let resp = device.request(UartMessage::DataRxGet, code::UART_DATA_RX)?;
    if let UartMessage::DataRx(data) = resp {
        eprintln!("[host] device buffered: {:?}", String::from_utf8_lossy(&data));
    }

    drop(device);
    adapter.join().expect("adapter thread should not panic");
    Ok(())
}

/// A stand-in for the adapter firmware: answers the control set and loops
/// UART TX bytes back into its RX buffer.
fn run_adapter(port: LoopbackPort) {
    let mut decoder = Decoder::new();
    let mut rx_buffer: Vec<u8> = Vec::new();
    let mut baud: u32 = 9_600;
    let mut chunk = [0u8; 64];

    loop {
        let n = match port.read(&mut chunk) {
            Ok(0) => continue,
            Ok(n) => n,
            Err(_) => return,
        };
        let mut bytes = &chunk[..n];
        while !bytes.is_empty() {
            match decoder.feed(bytes) {
                Ok((used, true)) => {
                    bytes = &bytes[used..];
                    let reply = respond(decoder.frame(), &mut rx_buffer, &mut baud);
                    decoder.reset();
                    if send_frame(&port, &reply).is_err() {
                        return;
                    }
                }
                Ok((_, false)) => break,
                Err(_) => {
                    decoder.reset();
                    break;
                }
            }
        }
    }
}

fn respond(frame_bytes: &[u8], rx_buffer: &mut Vec<u8>, baud: &mut u32) -> MsgFrame {
    let frame = match decode_frame(frame_bytes) {
        Ok(frame) => frame,
        Err(_) => return MsgFrame::new(code::ERR_CRC, &b"bad checksum"[..]),
    };
    match frame.code {
        code::PING => MsgFrame::new(code::GOOD, Bytes::new()),
        code::VERSION_GET => MsgFrame::new(code::VERSION, &b"uart-adapter 0.3.1"[..]),
        code::ITF_TYPE_GET => MsgFrame::new(
            code::ITF_TYPE,
            Bytes::copy_from_slice(&[ItfType::Uart.to_u8()]),
        ),
        code::ID_GET => MsgFrame::new(code::ID, Bytes::from_static(&[0xA1, 0xB2, 0xC3, 0xD4])),
        code::UART_BAUD_SET => match <[u8; 4]>::try_from(frame.payload.as_ref()) {
            Ok(raw) => {
                *baud = u32::from_be_bytes(raw);
                MsgFrame::new(code::GOOD, Bytes::new())
            }
            Err(_) => MsgFrame::new(code::ERR_INVALID_ARGS, &b"baud must be 4 bytes"[..]),
        },
        code::UART_BAUD_GET => {
            MsgFrame::new(code::UART_BAUD, Bytes::copy_from_slice(&baud.to_be_bytes()))
        }
        code::UART_DATA_TX => {
            rx_buffer.extend_from_slice(&frame.payload);
            MsgFrame::new(code::GOOD, Bytes::new())
        }
        code::UART_DATA_RX_GET => {
            MsgFrame::new(code::UART_DATA_RX, Bytes::from(std::mem::take(rx_buffer)))
        }
        _ => MsgFrame::new(code::ERR_UNKNOWN_CODE, &b"unsupported request"[..]),
    }
}

fn send_frame(port: &LoopbackPort, frame: &MsgFrame) -> halink::transport::Result<()> {
    let mut encoded = BytesMut::new();
    encode_frame(frame, &mut encoded);
    let mut wire = BytesMut::new();
    slip::encode(&encoded, false, &mut wire);
    port.write(&wire)?;
    port.flush()
}
