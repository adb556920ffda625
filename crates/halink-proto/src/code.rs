//! The closed 16-bit command code space.
//!
//! Generic request codes climb from 0x0000; peripheral request families
//! occupy disjoint blocks from 0x1000 up. Peripheral response codes descend
//! from 0xEFFF, generic responses from 0xFEFF, and status codes from 0xFFFF.
//! The values are fixed by the adapter firmware.

/// Liveness probe.
pub const PING: u16 = 0x0000;

/// Ask which peripheral interface the adapter exposes.
pub const ITF_TYPE_GET: u16 = 0x0001;

/// Ask for the firmware version string.
pub const VERSION_GET: u16 = 0x0002;

/// Ask for the adapter's unique identifier.
pub const ID_GET: u16 = 0x0003;

/// Firmware version response, UTF-8 text.
pub const VERSION: u16 = 0xFEFF;

/// Interface-type response, single byte.
pub const ITF_TYPE: u16 = 0xFEFE;

/// Identifier response, raw bytes.
pub const ID: u16 = 0xFEFD;

/// Request completed.
pub const GOOD: u16 = 0xFFFF;

/// Request failed, reason in the payload.
pub const ERR_GENERIC: u16 = 0xFFFE;

/// The request frame failed its checksum on the device side.
pub const ERR_CRC: u16 = 0xFFFD;

/// The device did not recognize the request code.
pub const ERR_UNKNOWN_CODE: u16 = 0xFFFC;

/// The device rejected the request arguments.
pub const ERR_INVALID_ARGS: u16 = 0xFFFB;

/// The device was busy with a previous request.
pub const ERR_BUSY: u16 = 0xFFFA;

/// Every code in the generic control set, requests through statuses.
pub const CONTROL_SET: [u16; 13] = [
    PING,
    ITF_TYPE_GET,
    VERSION_GET,
    ID_GET,
    VERSION,
    ITF_TYPE,
    ID,
    GOOD,
    ERR_GENERIC,
    ERR_CRC,
    ERR_UNKNOWN_CODE,
    ERR_INVALID_ARGS,
    ERR_BUSY,
];

// UART peripheral family (0x1000 request block, 0xEFxx response block).

/// Transmit bytes out the adapter's UART.
pub const UART_DATA_TX: u16 = 0x1000;

/// Drain bytes the UART has received.
pub const UART_DATA_RX_GET: u16 = 0x1001;

/// Set the UART baud rate (u32, big-endian).
pub const UART_BAUD_SET: u16 = 0x1002;

/// Ask for the current baud rate.
pub const UART_BAUD_GET: u16 = 0x1003;

/// Set the parity mode.
pub const UART_SET_PARITY: u16 = 0x1004;

/// Set the stop-bit count.
pub const UART_SET_STOP_BIT: u16 = 0x1005;

/// Set the data word size.
pub const UART_SET_DATA_SZ: u16 = 0x1006;

/// Enable or disable hardware flow control.
pub const UART_HW_FLOW_CONTROL: u16 = 0x1007;

/// Start communication-error tracking.
pub const UART_COM_ERR_START: u16 = 0x1008;

/// Ask for the communication-error count.
pub const UART_COM_ERR_SIZE: u16 = 0x1009;

/// Drained receive bytes.
pub const UART_DATA_RX: u16 = 0xEFFF;

/// Current baud rate (u32, big-endian).
pub const UART_BAUD: u16 = 0xEFFE;

/// Returns a human-readable name for a code.
pub fn name(code: u16) -> &'static str {
    match code {
        PING => "ping",
        ITF_TYPE_GET => "itf-type-get",
        VERSION_GET => "version-get",
        ID_GET => "id-get",
        VERSION => "version",
        ITF_TYPE => "itf-type",
        ID => "id",
        GOOD => "good",
        ERR_GENERIC => "err-generic",
        ERR_CRC => "err-crc",
        ERR_UNKNOWN_CODE => "err-unknown-code",
        ERR_INVALID_ARGS => "err-invalid-args",
        ERR_BUSY => "err-busy",
        UART_DATA_TX => "uart-data-tx",
        UART_DATA_RX_GET => "uart-data-rx-get",
        UART_BAUD_SET => "uart-baud-set",
        UART_BAUD_GET => "uart-baud-get",
        UART_SET_PARITY => "uart-set-parity",
        UART_SET_STOP_BIT => "uart-set-stop-bit",
        UART_SET_DATA_SZ => "uart-set-data-sz",
        UART_HW_FLOW_CONTROL => "uart-hw-flow-control",
        UART_COM_ERR_START => "uart-com-err-start",
        UART_COM_ERR_SIZE => "uart-com-err-size",
        UART_DATA_RX => "uart-data-rx",
        UART_BAUD => "uart-baud",
        other if is_peripheral_request(other) => "peripheral-request",
        other if is_peripheral_response(other) => "peripheral-response",
        _ => "unknown",
    }
}

/// Returns true for codes in the generic request block.
pub fn is_generic_request(code: u16) -> bool {
    code <= 0x0FFF
}

/// Returns true for codes in a peripheral request block.
pub fn is_peripheral_request(code: u16) -> bool {
    (0x1000..=0xDFFF).contains(&code)
}

/// Returns true for codes in a peripheral response block.
pub fn is_peripheral_response(code: u16) -> bool {
    (0xE000..=0xFDFF).contains(&code)
}

/// Returns true for codes in the generic response block.
pub fn is_generic_response(code: u16) -> bool {
    (0xFE00..=0xFEFF).contains(&code)
}

/// Returns true for status codes.
pub fn is_status(code: u16) -> bool {
    code >= 0xFF00
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_set_has_no_duplicates() {
        let mut codes = CONTROL_SET.to_vec();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), CONTROL_SET.len());
    }

    #[test]
    fn test_blocks_are_disjoint() {
        for code in CONTROL_SET {
            assert!(!is_peripheral_request(code));
            assert!(!is_peripheral_response(code));
        }
        assert!(is_peripheral_request(UART_DATA_TX));
        assert!(is_peripheral_response(UART_DATA_RX));
        assert!(is_generic_response(VERSION));
        assert!(is_status(GOOD));
        assert!(!is_status(VERSION));
    }

    #[test]
    fn test_names() {
        assert_eq!(name(PING), "ping");
        assert_eq!(name(UART_BAUD), "uart-baud");
        assert_eq!(name(0x2000), "peripheral-request");
        assert_eq!(name(0xE000), "peripheral-response");
        assert_eq!(name(0x0004), "unknown");
    }
}
