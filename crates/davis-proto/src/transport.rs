//! The byte-oriented, blocking, timeout-bounded pipe the protocol speaks
//! over. Framing above this layer belongs entirely to the console, never
//! to the transport.

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::TransportError;

/// Carriage return.
pub const CR: u8 = 0x0D;
/// Line feed.
pub const LF: u8 = 0x0A;
/// Positive acknowledgement.
pub const ACK: u8 = 0x06;
/// Negative acknowledgement.
pub const NAK: u8 = 0x21;
/// Cancel.
pub const CANCEL: u8 = 0x18;

/// Default baud rate for Davis-style consoles.
pub const DEFAULT_BAUD_RATE: u32 = 19_200;
/// Default per-read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// An abstract, full-duplex byte pipe. The protocol state machine is
/// written only against this trait, never against a concrete serial
/// library, so it can be driven in tests by an in-memory scripted pipe.
pub trait Transport {
    /// Send all of `bytes`, failing on a short write.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Read exactly `n` bytes, failing with a timeout error if fewer
    /// arrive before the transport's read timeout elapses.
    fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError>;

    /// Release the underlying port. Idempotent.
    fn close(&mut self) -> Result<(), TransportError>;

    /// Send a single `ACK` byte.
    fn write_ack(&mut self) -> Result<(), TransportError> {
        self.write(&[ACK])
    }

    /// Read one byte and report whether it was `ACK`. The caller decides
    /// what a `false` result means for the operation in progress.
    fn wait_for_ack(&mut self) -> Result<bool, TransportError> {
        let byte = self.read(1)?;
        Ok(byte[0] == ACK)
    }
}

/// A real serial port, backed by the `serialport` crate. 8 data bits, no
/// parity, 1 stop bit; no line discipline, no escape processing, no
/// buffering beyond what the OS provides.
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    /// Open `port_name` at `baud_rate`, with reads bounded by `timeout`.
    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> Result<Self, TransportError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(timeout)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .open()
            .map_err(|source| TransportError::Open {
                port: port_name.to_string(),
                source,
            })?;
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let sent = self.port.write(bytes).map_err(TransportError::Write)?;
        if sent != bytes.len() {
            return Err(TransportError::ShortWrite {
                sent,
                requested: bytes.len(),
            });
        }
        Ok(())
    }

    fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; n];
        match self.port.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut || e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(TransportError::Timeout { requested: n, got: 0 })
            }
            Err(e) => Err(TransportError::Read(e)),
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        // Dropping `port` releases the OS handle; nothing else to flush.
        Ok(())
    }
}

/// An in-memory, scripted transport for unit-testing the protocol state
/// machine without real hardware. Bytes written by the protocol are
/// recorded for inspection; bytes "sent by the console" are queued up
/// front and consumed in order by `read`.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub inbound: std::collections::VecDeque<u8>,
    pub written: Vec<u8>,
    closed: bool,
}

impl MockTransport {
    /// Build a mock whose `read` calls will be satisfied from `script`, in
    /// order.
    pub fn scripted(script: impl IntoIterator<Item = u8>) -> Self {
        Self {
            inbound: script.into_iter().collect(),
            written: Vec::new(),
            closed: false,
        }
    }

    /// Queue more bytes for future `read` calls to consume.
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }
}

impl Transport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.written.extend_from_slice(bytes);
        Ok(())
    }

    fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        if self.inbound.len() < n {
            let got = self.inbound.len();
            self.inbound.clear();
            return Err(TransportError::Timeout { requested: n, got });
        }
        Ok((0..n).filter_map(|_| self.inbound.pop_front()).collect())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_write_then_read() {
        let mut t = MockTransport::scripted([ACK, 1, 2, 3]);
        t.write(b"hello").unwrap();
        assert_eq!(t.written, b"hello");
        assert!(t.wait_for_ack().unwrap());
        assert_eq!(t.read(3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn mock_read_past_end_times_out() {
        let mut t = MockTransport::scripted([1, 2]);
        assert!(matches!(t.read(3), Err(TransportError::Timeout { .. })));
    }

    #[test]
    fn write_ack_sends_single_byte() {
        let mut t = MockTransport::default();
        t.write_ack().unwrap();
        assert_eq!(t.written, vec![ACK]);
    }
}
