//! PeriPage command frames.
//!
//! A print is framed as
//!
//! ```text
//! PRINT_START | SET_PRINT_INFO rows | row data ... | [SET_PRINT_INFO n | n feed rows] | PRINT_END
//! ```
//!
//! Every data row is [`BYTES_PER_ROW`] bytes of MSB-first packed dots. The
//! encoder only builds byte sequences; sequencing and pacing belong to
//! [`crate::Printer`].

use std::convert::TryFrom;

use crate::{error::Error, BYTES_PER_ROW};

/// Wakes the printer up for a new job.
pub const PRINT_START: [u8; 4] = [0x10, 0xFF, 0xFE, 0x01];

/// Feeds the paper past the cutter and closes the job.
pub const PRINT_END: [u8; 7] = [0x1B, 0x4A, 0x40, 0x10, 0xFF, 0xFE, 0x45];

/// `GS v 0` raster header, followed by the row count big-endian.
pub const SET_PRINT_INFO: [u8; 6] = [0x1D, 0x76, 0x30, 0x00, 0x30, 0x00];

/// Largest row count the 16-bit height field can carry.
pub const MAX_ROWS: u32 = u16::MAX as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PrintStart,
    SetPrintInfo(u16),
    PrintEnd,
}

impl Command {
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Command::PrintStart => PRINT_START.to_vec(),
            Command::SetPrintInfo(rows) => {
                let mut buf = Vec::with_capacity(SET_PRINT_INFO.len() + 2);
                buf.extend_from_slice(&SET_PRINT_INFO);
                buf.extend_from_slice(&rows.to_be_bytes());
                buf
            }
            Command::PrintEnd => PRINT_END.to_vec(),
        }
    }
}

/// Build the print info command announcing `rows` raster lines.
///
/// # Example
///
/// ```
/// let cmd = peripage::height_command(1).unwrap();
/// assert_eq!(cmd, vec![0x1D, 0x76, 0x30, 0x00, 0x30, 0x00, 0x00, 0x01]);
/// assert!(peripage::height_command(65536).is_err());
/// ```
pub fn height_command(rows: u32) -> Result<Vec<u8>, Error> {
    let rows = u16::try_from(rows).map_err(|_| Error::HeightOutOfRange(rows))?;
    Ok(Command::SetPrintInfo(rows).encode())
}

/// Constant pattern for feed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Blank,
    Solid,
}

impl Fill {
    pub fn byte(self) -> u8 {
        match self {
            Fill::Blank => 0x00,
            Fill::Solid => 0xFF,
        }
    }
}

/// One full-width row of the given pattern.
pub fn feed_row(fill: Fill) -> [u8; BYTES_PER_ROW] {
    [fill.byte(); BYTES_PER_ROW]
}
