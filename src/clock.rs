//! Software wall clock.
//!
//! The RP2350 has no calendar RTC, so the date is kept as a seed datetime plus
//! the microsecond timer reading taken when it was set.

use core::fmt::Write;

use embedded_sdmmc::{TimeSource, Timestamp};
use heapless::String;
use time::{Date, Duration, Month, PrimitiveDateTime, Time};

use crate::config::NO_DATETIME;
use crate::error::ClockError;

/// Monotonic microsecond counter.
pub trait Monotonic {
    fn now_us(&self) -> u64;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WallClock {
    seed: Option<(PrimitiveDateTime, u64)>,
}

impl WallClock {
    pub const fn new() -> Self {
        Self { seed: None }
    }

    /// Sets the clock from `DD/MM/YY HH:MM:SS`, as of timer reading `now`.
    pub fn set(&mut self, datetime: &str, now: u64) -> Result<(), ClockError> {
        self.seed = Some((parse(datetime)?, now));
        Ok(())
    }

    /// Current date and time, or `None` if the clock was never set.
    pub fn now(&self, now: u64) -> Option<PrimitiveDateTime> {
        let (base, base_us) = self.seed?;
        let elapsed = i64::try_from(now.saturating_sub(base_us)).ok()?;
        base.checked_add(Duration::microseconds(elapsed))
    }

    /// Directory entry timestamp for files written at `now`.
    pub fn timestamp(&self, now: u64) -> Timestamp {
        match self.now(now) {
            Some(dt) => Timestamp {
                year_since_1970: (dt.year() - 1970).clamp(0, 255) as u8,
                zero_indexed_month: u8::from(dt.month()) - 1,
                zero_indexed_day: dt.day() - 1,
                hours: dt.hour(),
                minutes: dt.minute(),
                seconds: dt.second(),
            },
            None => Timestamp {
                year_since_1970: 0,
                zero_indexed_month: 0,
                zero_indexed_day: 0,
                hours: 0,
                minutes: 0,
                seconds: 0,
            },
        }
    }
}

/// `YYYY-MM-DD,HH:MM:SS`, or the all-zero sentinel when there is no time.
pub fn format_datetime(datetime: Option<PrimitiveDateTime>) -> String<20> {
    let mut out = String::new();
    let written = match datetime {
        Some(dt) => write!(
            out,
            "{:04}-{:02}-{:02},{:02}:{:02}:{:02}",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        ),
        None => Err(core::fmt::Error),
    };
    if written.is_err() {
        out.clear();
        let _ = out.push_str(NO_DATETIME);
    }
    out
}

fn parse(s: &str) -> Result<PrimitiveDateTime, ClockError> {
    let (date, time) = s.trim().split_once(' ').ok_or(ClockError::Format)?;
    let [day, month, year] = fields(date, '/')?;
    let [hour, minute, second] = fields(time, ':')?;

    let month = Month::try_from(month).map_err(|_| ClockError::OutOfRange)?;
    let date = Date::from_calendar_date(2000 + i32::from(year), month, day)
        .map_err(|_| ClockError::OutOfRange)?;
    let time = Time::from_hms(hour, minute, second).map_err(|_| ClockError::OutOfRange)?;
    Ok(PrimitiveDateTime::new(date, time))
}

fn fields(s: &str, sep: char) -> Result<[u8; 3], ClockError> {
    let mut out = [0u8; 3];
    let mut parts = s.split(sep);
    for slot in out.iter_mut() {
        let part = parts.next().ok_or(ClockError::Format)?;
        if part.is_empty() || part.len() > 2 {
            return Err(ClockError::Format);
        }
        *slot = part.parse().map_err(|_| ClockError::Format)?;
    }
    if parts.next().is_some() {
        return Err(ClockError::Format);
    }
    Ok(out)
}

/// [`WallClock`] paired with a timer, for stamping FAT directory entries.
#[derive(Clone, Copy)]
pub struct FatClock<M> {
    clock: WallClock,
    timer: M,
}

impl<M: Monotonic> FatClock<M> {
    pub fn new(clock: WallClock, timer: M) -> Self {
        Self { clock, timer }
    }
}

impl<M: Monotonic> TimeSource for FatClock<M> {
    fn get_timestamp(&self) -> Timestamp {
        self.clock.timestamp(self.timer.now_us())
    }
}
