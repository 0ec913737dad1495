// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use serialport::{DataBits, Parity, StopBits};

use crate::error::StationError;

// ============================================================================
// Transport Trait
// ============================================================================

/// Duplex byte channel to the station. The console is a half-duplex peer:
/// one logical session owns a transport at a time, every write is followed
/// by a blocking read.
pub trait Transport: Send {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// May return fewer than `buf.len()` bytes; an `ErrorKind::TimedOut` or
    /// `WouldBlock` error means no data arrived within `timeout`.
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;
}

// ============================================================================
// TCP Transport (WeatherLink IP logger)
// ============================================================================

pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(TcpTransport { stream })
    }
}

impl Transport for TcpTransport {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf)?;
        self.stream.flush()
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        self.stream.set_read_timeout(Some(timeout))?;
        self.stream.read(buf)
    }
}

// ============================================================================
// Serial Transport (console data logger)
// ============================================================================

/// Serial transport wrapping the serialport crate. The console always talks
/// 8N1; only the baud rate is configurable.
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, serialport::Error> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(Duration::from_millis(100))
            .open()?;

        Ok(SerialTransport { port })
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.port.write_all(buf)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        self.port.set_timeout(timeout)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        self.port.read(buf)
    }
}

// ============================================================================
// Blocking read helpers
// ============================================================================

/// Fill `buf` completely, looping over short reads until the deadline.
pub(crate) fn read_exact(
    port: &mut dyn Transport,
    buf: &mut [u8],
    timeout: Duration,
) -> Result<(), StationError> {
    let mut filled = 0;
    while filled < buf.len() {
        match port.read_timeout(&mut buf[filled..], timeout) {
            Ok(0) => {
                return Err(StationError::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by the station",
                )));
            }
            Ok(n) => filled += n,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

pub(crate) fn read_byte(port: &mut dyn Transport, timeout: Duration) -> Result<u8, StationError> {
    let mut buf = [0u8; 1];
    read_exact(port, &mut buf, timeout)?;
    Ok(buf[0])
}

// ============================================================================
// Mock Transport for Testing
// ============================================================================

#[cfg(test)]
pub struct MockTransport {
    // Data to return on reads (None = timeout)
    read_buffer: Vec<Option<u8>>,
    read_pos: usize,
    // Track what was written
    write_log: Vec<u8>,
    // Expected writes for verification
    expected_writes: Vec<u8>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new(responses: Vec<Option<u8>>, expected_writes: Vec<u8>) -> Self {
        MockTransport {
            read_buffer: responses,
            read_pos: 0,
            write_log: Vec::new(),
            expected_writes,
        }
    }

    pub fn script(bytes: &[u8]) -> Vec<Option<u8>> {
        bytes.iter().map(|&b| Some(b)).collect()
    }
}

#[cfg(test)]
impl Transport for MockTransport {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_log.extend_from_slice(buf);
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        // Out of responses = timeout
        if self.read_pos >= self.read_buffer.len() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "mock timeout"));
        }

        // If current response is None = timeout
        if self.read_buffer[self.read_pos].is_none() {
            self.read_pos += 1;
            return Err(io::Error::new(io::ErrorKind::TimedOut, "mock timeout"));
        }

        let mut bytes_read = 0;
        while bytes_read < buf.len() && self.read_pos < self.read_buffer.len() {
            match self.read_buffer[self.read_pos] {
                Some(byte) => {
                    buf[bytes_read] = byte;
                    bytes_read += 1;
                    self.read_pos += 1;
                }
                None => break, // Stop at timeout marker
            }
        }

        Ok(bytes_read)
    }
}

#[cfg(test)]
impl Drop for MockTransport {
    fn drop(&mut self) {
        assert_eq!(
            self.read_pos,
            self.read_buffer.len(),
            "MockTransport dropped with {} unconsumed responses (read {} of {} bytes)",
            self.read_buffer.len() - self.read_pos,
            self.read_pos,
            self.read_buffer.len()
        );

        assert_eq!(
            &self.write_log,
            &self.expected_writes,
            "MockTransport write log mismatch!\nExpected {} bytes:\n{:02X?}\nGot {} bytes:\n{:02X?}",
            self.expected_writes.len(),
            self.expected_writes,
            self.write_log.len(),
            self.write_log
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_exact_assembles_short_reads() {
        let mut responses = MockTransport::script(b"abc");
        responses.insert(1, None); // timeout marker between 'a' and 'b'
        let mut mock = MockTransport::new(responses, Vec::new());

        let mut buf = [0u8; 1];
        read_exact(&mut mock, &mut buf, Duration::from_millis(10)).unwrap();
        assert_eq!(&buf, b"a");

        // timeout marker
        let mut rest = [0u8; 2];
        assert!(matches!(
            read_exact(&mut mock, &mut rest, Duration::from_millis(10)),
            Err(StationError::Timeout)
        ));

        read_exact(&mut mock, &mut rest, Duration::from_millis(10)).unwrap();
        assert_eq!(&rest, b"bc");
    }

    #[test]
    fn test_read_exact_reports_closed_connection() {
        struct ClosedTransport;
        impl Transport for ClosedTransport {
            fn write_all(&mut self, _buf: &[u8]) -> io::Result<()> {
                Ok(())
            }
            fn read_timeout(&mut self, _buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
                Ok(0)
            }
        }

        let mut buf = [0u8; 4];
        let err = read_exact(&mut ClosedTransport, &mut buf, Duration::from_millis(10));
        assert!(matches!(err, Err(StationError::Transport(_))));
    }

    #[test]
    fn test_read_byte() {
        let mut mock = MockTransport::new(MockTransport::script(&[0x06]), Vec::new());
        assert_eq!(read_byte(&mut mock, Duration::from_millis(10)).unwrap(), 0x06);
    }
}
