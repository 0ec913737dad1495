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

//! Command channel to a Vantage console.
//!
//! Commands are ASCII lines terminated by a line feed. Depending on the
//! command the station answers either with CR-delimited text lines or with
//! a fixed-size binary response led by an ACK. The channel is strictly
//! request/response: one command in flight, never pipelined.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, trace};

use crate::dump;
use crate::error::StationError;
use crate::field::FieldMap;
use crate::protocol::{Control, LOOP2_PACKET_SIZE, STATION_TYPE_RESPONSE_SIZE};
use crate::records::{DmpRecord, parse_loop2};
use crate::transport::{Transport, read_byte, read_exact};

/// Default per-read deadline. Generous enough for a console that pauses
/// between archive pages on a slow serial link.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected station. Owns the transport for its lifetime: the console
/// is half duplex, so one logical session per physical connection.
pub struct Station {
    port: Box<dyn Transport>,
    timeout: Duration,
}

impl Station {
    pub fn new(port: Box<dyn Transport>) -> Station {
        Station::with_timeout(port, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(port: Box<dyn Transport>, timeout: Duration) -> Station {
        Station { port, timeout }
    }

    // ========================================================================
    // Command channel
    // ========================================================================

    /// Send an ASCII command, appending the line terminator if absent.
    fn send_command(&mut self, command: &str) -> Result<(), StationError> {
        let mut line = command.to_owned();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        trace!("-> {:?}", line);
        self.port.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Read until `count` carriage returns have arrived, then split on
    /// `"\n\r"`. A timeout or a malformed response yields `count` empty
    /// lines rather than an error: the caller treats an empty string as
    /// "no answer".
    fn read_lines(&mut self, count: usize) -> Result<Vec<String>, StationError> {
        let mut received = Vec::new();
        let mut carriage_returns = 0;
        while carriage_returns < count {
            match read_byte(self.port.as_mut(), self.timeout) {
                Ok(byte) => {
                    received.push(byte);
                    if byte == b'\r' {
                        carriage_returns += 1;
                    }
                }
                Err(StationError::Timeout) => {
                    debug!("line response timed out after {} bytes", received.len());
                    return Ok(vec![String::new(); count]);
                }
                Err(other) => return Err(other),
            }
        }

        let text = String::from_utf8_lossy(&received);
        let mut lines: Vec<String> = text.split("\n\r").map(str::to_owned).collect();
        if lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        trace!("<- {:?}", lines);

        if lines.len() == count {
            Ok(lines)
        } else {
            Ok(vec![String::new(); count])
        }
    }

    /// Read a fixed-size binary response.
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], StationError> {
        let mut buf = [0u8; N];
        read_exact(self.port.as_mut(), &mut buf, self.timeout)?;
        Ok(buf)
    }

    /// Read the single-byte verdict of a handshake step.
    fn expect_ack(&mut self, command: &'static str) -> Result<(), StationError> {
        let byte = read_byte(self.port.as_mut(), self.timeout)?;
        match Control::classify(byte) {
            Ok(Control::Ack) => Ok(()),
            _ => Err(StationError::Rejected { command, response: byte }),
        }
    }

    // ========================================================================
    // Station operations
    // ========================================================================

    /// Link liveness probe. The verdict line echoes the command back.
    pub fn test_call(&mut self) -> Result<bool, StationError> {
        self.send_command("TEST")?;
        let lines = self.read_lines(2)?;
        Ok(lines[1] == "TEST")
    }

    /// Firmware version string, e.g. "3.57".
    pub fn firmware_version(&mut self) -> Result<String, StationError> {
        self.send_command("NVER")?;
        let mut lines = self.read_lines(3)?;
        Ok(lines.remove(2))
    }

    /// Firmware build date, e.g. "Aug 24 2016".
    pub fn firmware_date(&mut self) -> Result<String, StationError> {
        self.send_command("VER")?;
        let mut lines = self.read_lines(3)?;
        Ok(lines.remove(2))
    }

    /// Hardware type id: [`crate::protocol::VANTAGE_PRO2_ID`] or
    /// [`crate::protocol::VANTAGE_VUE_ID`] on current hardware.
    pub fn station_type(&mut self) -> Result<u8, StationError> {
        self.send_command("WRD\x12\x4d")?;
        let response: [u8; STATION_TYPE_RESPONSE_SIZE] = self.read_array()?;
        Ok(response[1])
    }

    /// Current conditions: one realtime LOOP2 packet.
    pub fn current_conditions(&mut self) -> Result<FieldMap, StationError> {
        self.send_command("LPS 2 1")?;
        self.expect_ack("LPS 2 1")?;
        let packet: [u8; LOOP2_PACKET_SIZE] = self.read_array()?;
        Ok(parse_loop2(&packet))
    }

    /// Download every archive record stored after `since`.
    pub fn archive_since(&mut self, since: NaiveDateTime) -> Result<Vec<DmpRecord>, StationError> {
        dump::download(self.port.as_mut(), self.timeout, since)
    }

    /// Download the entire archive memory. A request older than anything
    /// the ring buffer can hold makes the station send every page.
    pub fn archive_all(&mut self) -> Result<Vec<DmpRecord>, StationError> {
        let epoch = NaiveDate::from_ymd_opt(2003, 6, 6)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("hard-coded date is valid");
        self.archive_since(epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;
    use crate::protocol::{ACK, NAK, VANTAGE_PRO2_ID};
    use crate::transport::MockTransport;

    fn station(responses: Vec<Option<u8>>, expected_writes: Vec<u8>) -> Station {
        Station::with_timeout(
            Box::new(MockTransport::new(responses, expected_writes)),
            Duration::from_millis(10),
        )
    }

    #[test]
    fn test_test_call() {
        let responses = MockTransport::script(b"TEST\n\rTEST\n\r");
        let mut station = station(responses, b"TEST\n".to_vec());
        assert!(station.test_call().unwrap());
    }

    #[test]
    fn test_test_call_timeout_is_no_answer() {
        let mut station = station(vec![None], b"TEST\n".to_vec());
        assert!(!station.test_call().unwrap());
    }

    #[test]
    fn test_firmware_version() {
        let responses = MockTransport::script(b"NVER\n\rOK\n\r3.57\n\r");
        let mut station = station(responses, b"NVER\n".to_vec());
        assert_eq!(station.firmware_version().unwrap(), "3.57");
    }

    #[test]
    fn test_firmware_date() {
        let responses = MockTransport::script(b"VER\n\rOK\n\rAug 24 2016\n\r");
        let mut station = station(responses, b"VER\n".to_vec());
        assert_eq!(station.firmware_date().unwrap(), "Aug 24 2016");
    }

    #[test]
    fn test_station_type() {
        let responses = vec![Some(ACK), Some(VANTAGE_PRO2_ID)];
        let mut station = station(responses, b"WRD\x12\x4d\n".to_vec());
        assert_eq!(station.station_type().unwrap(), VANTAGE_PRO2_ID);
    }

    #[test]
    fn test_current_conditions() {
        let mut packet = [0u8; LOOP2_PACKET_SIZE];
        packet[3] = 20; // bar trend: rising slowly
        packet[14] = 5; // wind speed

        let mut responses = vec![Some(ACK)];
        responses.extend(MockTransport::script(&packet));
        let mut station = station(responses, b"LPS 2 1\n".to_vec());

        let fields = station.current_conditions().unwrap();
        assert_eq!(fields["bar_trend"], FieldValue::Label("Rising Slowly"));
        assert_eq!(fields["wind_speed"], FieldValue::Number(5.0));
    }

    #[test]
    fn test_current_conditions_rejected() {
        let responses = vec![Some(NAK)];
        let mut station = station(responses, b"LPS 2 1\n".to_vec());
        let err = station.current_conditions().unwrap_err();
        assert!(matches!(err, StationError::Rejected { command: "LPS 2 1", response: 0x21 }));
    }
}
