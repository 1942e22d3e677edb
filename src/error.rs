use derive_more::From;

/// Failure to seed the wall clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// The string is not `DD/MM/YY HH:MM:SS`.
    Format,
    /// Fields parsed but do not name a real date or time.
    OutOfRange,
}

/// Failure to append one record to the log file.
#[derive(Debug, PartialEq, Eq, From)]
pub enum LogError<E> {
    /// The storage layer rejected an open, write or close.
    Storage(E),
    /// The record did not fit the line buffer.
    #[from(ignore)]
    Format,
}
