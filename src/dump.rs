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

//! Archive download session: the DMPAFT command and the paginated binary
//! transfer that follows it.
//!
//! The station answers a dump-after-timestamp request with a page count,
//! then streams 263-byte pages of five records each. Every block is CRC
//! checked before anything inside it is trusted; a bad page is NAKed and
//! aborts the session rather than silently hiding data loss.

use std::marker::PhantomData;
use std::time::Duration;

use chrono::NaiveDateTime;
use log::{debug, trace};

use crate::crc::{append_crc, crc16};
use crate::error::StationError;
use crate::protocol::{
    ACK, Control, DMP_RECORD_SIZE, ESC, NAK, PAGE_SEQUENCE_BYTES, PAGE_SIZE, PAGES_INFO_SIZE,
    RECORDS_PER_PAGE, encode_timestamp,
};
use crate::records::{DmpRecord, parse_dmp};
use crate::transport::{Transport, read_byte, read_exact};

/// Download every archive record stored after `since`.
pub fn download(
    port: &mut dyn Transport,
    timeout: Duration,
    since: NaiveDateTime,
) -> Result<Vec<DmpRecord>, StationError> {
    let mut state: Box<dyn DumpState<'_> + '_> = DumpFsm::new(port, timeout, since);
    loop {
        match state.step()? {
            DumpStep::Continue(next) => state = next,
            DumpStep::Done(records) => return Ok(records),
        }
    }
}

// ============================================================================
// States
// ============================================================================

pub struct RequestDump;
pub struct SendTimestamp;
pub struct ReadPagesInfo;
pub struct ReadPage;

// ============================================================================
// FSM Structure
// ============================================================================

pub struct DumpFsm<'p, State> {
    state: PhantomData<State>,
    port: &'p mut dyn Transport,
    timeout: Duration,
    since: NaiveDateTime,
    total_pages: u16,
    first_record: u16,
    page_index: u16,
    records: Vec<DmpRecord>,
    last_record_time: Option<NaiveDateTime>,
}

pub enum DumpStep<'p> {
    Continue(Box<dyn DumpState<'p> + 'p>),
    Done(Vec<DmpRecord>),
}

pub trait DumpState<'p> {
    fn step(self: Box<Self>) -> Result<DumpStep<'p>, StationError>;
}

// ============================================================================
// Helpers shared by the states
// ============================================================================

impl<'p, S> DumpFsm<'p, S> {
    fn transition<T>(self) -> Box<DumpFsm<'p, T>> {
        Box::new(DumpFsm {
            state: PhantomData,
            port: self.port,
            timeout: self.timeout,
            since: self.since,
            total_pages: self.total_pages,
            first_record: self.first_record,
            page_index: self.page_index,
            records: self.records,
            last_record_time: self.last_record_time,
        })
    }

    fn read_ack(&mut self, command: &'static str) -> Result<(), StationError> {
        let byte = read_byte(self.port, self.timeout)?;
        match Control::classify(byte) {
            Ok(Control::Ack) => Ok(()),
            _ => Err(StationError::Rejected { command, response: byte }),
        }
    }
}

// ============================================================================
// State Implementations
// ============================================================================

impl<'p> DumpState<'p> for DumpFsm<'p, RequestDump> {
    fn step(self: Box<Self>) -> Result<DumpStep<'p>, StationError> {
        let mut fsm = *self;

        fsm.port.write_all(b"DMPAFT\n")?;
        trace!("sent DMPAFT");
        fsm.read_ack("DMPAFT")?;

        Ok(DumpStep::Continue(fsm.transition::<SendTimestamp>()))
    }
}

impl<'p> DumpState<'p> for DumpFsm<'p, SendTimestamp> {
    fn step(self: Box<Self>) -> Result<DumpStep<'p>, StationError> {
        let mut fsm = *self;

        let mut frame = encode_timestamp(fsm.since).to_vec();
        append_crc(&mut frame);
        fsm.port.write_all(&frame)?;
        debug!("requested archive records since {}", fsm.since);
        fsm.read_ack("DMPAFT timestamp")?;

        Ok(DumpStep::Continue(fsm.transition::<ReadPagesInfo>()))
    }
}

impl<'p> DumpState<'p> for DumpFsm<'p, ReadPagesInfo> {
    fn step(self: Box<Self>) -> Result<DumpStep<'p>, StationError> {
        let mut fsm = *self;

        let mut header = [0u8; PAGES_INFO_SIZE];
        read_exact(fsm.port, &mut header, fsm.timeout)?;

        if crc16(&header) != 0 {
            fsm.port.write_all(&[ESC])?;
            return Err(StationError::CorruptHeader);
        }

        fsm.total_pages = u16::from_le_bytes([header[0], header[1]]);
        fsm.first_record = u16::from_le_bytes([header[2], header[3]]);
        fsm.port.write_all(&[ACK])?;
        debug!(
            "{} pages to follow, first new record at index {}",
            fsm.total_pages, fsm.first_record
        );

        if fsm.total_pages == 0 {
            return Ok(DumpStep::Done(fsm.records));
        }
        Ok(DumpStep::Continue(fsm.transition::<ReadPage>()))
    }
}

impl<'p> DumpState<'p> for DumpFsm<'p, ReadPage> {
    fn step(self: Box<Self>) -> Result<DumpStep<'p>, StationError> {
        let mut fsm = *self;

        let mut page = [0u8; PAGE_SIZE];
        read_exact(fsm.port, &mut page, fsm.timeout)?;

        if crc16(&page) != 0 {
            fsm.port.write_all(&[NAK])?;
            return Err(StationError::CorruptPage {
                page: fsm.page_index,
                since: fsm.since,
            });
        }
        fsm.port.write_all(&[ACK])?;

        fsm.decode_page(&page);

        fsm.page_index += 1;
        if fsm.page_index == fsm.total_pages {
            Ok(DumpStep::Done(fsm.records))
        } else {
            Ok(DumpStep::Continue(Box::new(fsm)))
        }
    }
}

impl<'p> DumpFsm<'p, ReadPage> {
    /// Decode one validated page into records.
    ///
    /// The leading byte of a page is its sequence counter, not part of
    /// record 0. Page 0 may begin with records predating the request; the
    /// header's first-record index says how many to skip. On the final page
    /// only, records must advance the timestamp of the newest record
    /// already accepted - the archive is a ring buffer and its tail can
    /// hold stale entries.
    fn decode_page(&mut self, page: &[u8; PAGE_SIZE]) {
        let first_slot = if self.page_index == 0 {
            self.first_record as usize
        } else {
            0
        };
        let last_page = self.page_index == self.total_pages - 1;

        for slot in first_slot..RECORDS_PER_PAGE {
            let start = PAGE_SEQUENCE_BYTES + slot * DMP_RECORD_SIZE;
            let mut record = [0u8; DMP_RECORD_SIZE];
            record.copy_from_slice(&page[start..start + DMP_RECORD_SIZE]);

            if record.iter().all(|&b| b == 0xFF) {
                trace!("page {} slot {}: erased record", self.page_index, slot);
                continue;
            }

            let parsed = match parse_dmp(&record) {
                Ok(parsed) => parsed,
                Err(_) => {
                    debug!("page {} slot {}: skipping malformed record", self.page_index, slot);
                    continue;
                }
            };

            if last_page && !self.last_record_time.is_none_or(|t| t < parsed.timestamp) {
                trace!(
                    "page {} slot {}: dropping stale trailing record {}",
                    self.page_index, slot, parsed.timestamp
                );
                continue;
            }

            self.last_record_time = Some(parsed.timestamp);
            self.records.push(parsed);
        }
    }
}

impl<'p> DumpFsm<'p, RequestDump> {
    pub fn new(
        port: &'p mut dyn Transport,
        timeout: Duration,
        since: NaiveDateTime,
    ) -> Box<DumpFsm<'p, RequestDump>> {
        Box::new(DumpFsm {
            state: PhantomData,
            port,
            timeout,
            since,
            total_pages: 0,
            first_record: 0,
            page_index: 0,
            records: Vec::new(),
            last_record_time: None,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
