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

//! Client for the data logger of Davis Vantage Pro 2 and Vantage Vue
//! weather stations, over TCP (WeatherLink IP) or serial, per the Davis
//! serial protocol document (Rev 2.6.1).
//!
//! The interesting parts are the DMPAFT archive download ([`dump`]), the
//! CRC-16/CCITT framing every binary block carries ([`crc`]), and the
//! table-driven decoder for the station's fixed-offset records
//! ([`field`], [`records`]).

pub mod crc;
pub mod dump;
pub mod error;
pub mod field;
pub mod protocol;
pub mod records;
pub mod station;
pub mod transport;

pub use error::StationError;
pub use field::{FieldMap, FieldValue};
pub use records::{DmpRecord, MalformedRecord};
pub use station::Station;
pub use transport::{SerialTransport, TcpTransport, Transport};
