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

//! Vantage console wire-protocol constants

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Acknowledge - station accepts the command or the last block was good
pub const ACK: u8 = 0x06;

/// Negative acknowledge - last block failed its checksum, station should know
pub const NAK: u8 = 0x21;

/// Escape - abort the transfer after an unrecoverable block
pub const ESC: u8 = 0x1B;

/// One archived observation, five per page
pub const DMP_RECORD_SIZE: usize = 52;

/// Records carried by each archive page
pub const RECORDS_PER_PAGE: usize = 5;

/// Leading sequence counter of each page
pub const PAGE_SEQUENCE_BYTES: usize = 1;

/// Reserved bytes between the last record and the page checksum
pub const PAGE_UNUSED_BYTES: usize = 4;

/// Trailing checksum of each page
pub const PAGE_CRC_BYTES: usize = 2;

/// The station's transfer unit during an archive download (263 bytes)
pub const PAGE_SIZE: usize =
    PAGE_SEQUENCE_BYTES + DMP_RECORD_SIZE * RECORDS_PER_PAGE + PAGE_UNUSED_BYTES + PAGE_CRC_BYTES;

/// Header announcing the page count before the pages themselves
pub const PAGES_INFO_SIZE: usize = 6;

/// Realtime snapshot of current conditions
pub const LOOP2_PACKET_SIZE: usize = 99;

/// ACK plus the hardware type byte returned by the WRD command
pub const STATION_TYPE_RESPONSE_SIZE: usize = 2;

/// Hardware type id of a Vantage Pro 2 console
pub const VANTAGE_PRO2_ID: u8 = 16;

/// Hardware type id of a Vantage Vue console
pub const VANTAGE_VUE_ID: u8 = 17;

/// The station's single-byte control vocabulary.
///
/// Received bytes outside the vocabulary are surfaced as the raw byte so
/// handshake code can report exactly what the station answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Ack,
    Nak,
    Esc,
}

impl Control {
    pub fn classify(byte: u8) -> Result<Control, u8> {
        match byte {
            ACK => Ok(Control::Ack),
            NAK => Ok(Control::Nak),
            ESC => Ok(Control::Esc),
            other => Err(other),
        }
    }
}

/// Pack a timestamp into the station's on-wire form: a little-endian date
/// word `day + month * 32 + (year - 2000) * 512` followed by a little-endian
/// time word `hour * 100 + minute`.
pub fn encode_timestamp(ts: NaiveDateTime) -> [u8; 4] {
    let date = ts.day() as i32 + ts.month() as i32 * 32 + (ts.year() - 2000) * 512;
    let time = ts.hour() * 100 + ts.minute();
    let mut packed = [0u8; 4];
    packed[..2].copy_from_slice(&(date as u16).to_le_bytes());
    packed[2..].copy_from_slice(&(time as u16).to_le_bytes());
    packed
}

/// Unpack an on-wire timestamp. `None` if the packed fields do not form a
/// real calendar time (erased or corrupted records produce these).
pub fn decode_timestamp(packed: [u8; 4]) -> Option<NaiveDateTime> {
    let date = u16::from_le_bytes([packed[0], packed[1]]);
    let time = u16::from_le_bytes([packed[2], packed[3]]);
    let year = (date / 512) as i32 + 2000;
    let month = (date % 512 / 32) as u32;
    let day = (date % 32) as u32;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt((time / 100) as u32, (time % 100) as u32, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, 0).unwrap()
    }

    #[test]
    fn test_classify_control_bytes() {
        assert_eq!(Control::classify(0x06), Ok(Control::Ack));
        assert_eq!(Control::classify(0x21), Ok(Control::Nak));
        assert_eq!(Control::classify(0x1B), Ok(Control::Esc));
        assert_eq!(Control::classify(b'!'), Ok(Control::Nak));
        assert_eq!(Control::classify(0x00), Err(0x00));
        assert_eq!(Control::classify(0xFF), Err(0xFF));
    }

    #[test]
    fn test_encode_timestamp() {
        // 2003-06-06 09:30: date = 6 + 6*32 + 3*512 = 1734, time = 930
        assert_eq!(encode_timestamp(ts(2003, 6, 6, 9, 30)), [0xC6, 0x06, 0xA2, 0x03]);
    }

    #[test]
    fn test_timestamp_round_trip() {
        for stamp in [
            ts(2003, 6, 6, 9, 30),
            ts(2020, 1, 3, 0, 0),
            ts(2026, 12, 31, 23, 59),
        ] {
            assert_eq!(decode_timestamp(encode_timestamp(stamp)), Some(stamp));
        }
    }

    #[test]
    fn test_decode_rejects_invalid_fields() {
        // month 0
        assert_eq!(decode_timestamp([0x06, 0x06, 0x00, 0x00]), None);
        // day 0
        assert_eq!(decode_timestamp([0xC0, 0x06, 0x00, 0x00]), None);
        // time word 2460 would be hour 24
        assert_eq!(decode_timestamp([0xC6, 0x06, 0x9C, 0x09]), None);
        // erased record bytes
        assert_eq!(decode_timestamp([0xFF, 0xFF, 0xFF, 0xFF]), None);
    }

    #[test]
    fn test_page_size() {
        assert_eq!(PAGE_SIZE, 263);
    }
}
