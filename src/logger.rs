//! CSV capture engine.
//!
//! One record per tick, written straight through: the file is opened, appended
//! to and closed within the same call so nothing is held across the tick
//! sleep. A record only counts once its bytes and the close both succeeded.

use core::fmt::Write;

use heapless::String;
use time::PrimitiveDateTime;

use crate::clock::format_datetime;
use crate::config::CSV_HEADER;
use crate::error::LogError;
use crate::mount::Storage;
use crate::sensor::Sample;

/// Longest possible record: 19-char stamp plus six `-32768` fields.
pub type Line = String<72>;

pub fn format_record(
    stamp: Option<PrimitiveDateTime>,
    sample: &Sample,
) -> Result<Line, core::fmt::Error> {
    let mut line = Line::new();
    let [ax, ay, az] = sample.accel;
    let [gx, gy, gz] = sample.gyro;
    writeln!(
        line,
        "{},{},{},{},{},{},{}",
        format_datetime(stamp),
        ax,
        ay,
        az,
        gx,
        gy,
        gz
    )?;
    Ok(line)
}

pub struct CaptureLogger {
    file_name: &'static str,
    sample_count: u32,
}

impl CaptureLogger {
    pub const fn new(file_name: &'static str) -> Self {
        Self {
            file_name,
            sample_count: 0,
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Appends one record, preceded by the header when the file is empty.
    pub fn tick<S: Storage>(
        &mut self,
        storage: &mut S,
        sample: &Sample,
        stamp: Option<PrimitiveDateTime>,
    ) -> Result<u32, LogError<S::Error>> {
        let line = format_record(stamp, sample).map_err(|_| LogError::Format)?;

        let mut file = storage.open_append(self.file_name)?;
        let written = Self::append(storage, &mut file, line.as_bytes());
        let closed = storage.close(file);
        written?;
        closed?;

        self.sample_count += 1;
        Ok(self.sample_count)
    }

    fn append<S: Storage>(
        storage: &mut S,
        file: &mut S::File,
        line: &[u8],
    ) -> Result<(), S::Error> {
        if storage.size(file)? == 0 {
            storage.write(file, CSV_HEADER.as_bytes())?;
        }
        storage.write(file, line)
    }
}
