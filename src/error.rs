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

use chrono::NaiveDateTime;
use std::io;
use thiserror::Error;

/// Errors surfaced to callers of the station client.
///
/// Nothing here is retried internally. A `CorruptHeader`/`CorruptPage` means
/// the in-protocol rejection byte (ESC/NAK) has already been transmitted;
/// the caller decides whether to rerun the whole download.
#[derive(Debug, Error)]
pub enum StationError {
    /// Transport-level I/O failure.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    /// The read deadline elapsed before the response was complete.
    #[error("station did not answer within the read timeout")]
    Timeout,

    /// A handshake step was answered with something other than ACK.
    /// Indicates unsupported firmware or a station in the wrong state,
    /// not a transient fault.
    #[error("station rejected {command}: expected ACK, received {response:#04x}")]
    Rejected { command: &'static str, response: u8 },

    /// The pages-info header failed its checksum. ESC has been sent.
    #[error("checksum mismatch on the pages-info header")]
    CorruptHeader,

    /// An archive page failed its checksum. NAK has been sent.
    #[error("checksum mismatch on archive page {page} (dump requested since {since})")]
    CorruptPage { page: u16, since: NaiveDateTime },
}

impl From<io::Error> for StationError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => StationError::Timeout,
            _ => StationError::Transport(err),
        }
    }
}
