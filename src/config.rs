//! Configuration constants for the data logger.

/// Minimum gap between two accepted edges on the same button, in microseconds.
pub const DEBOUNCE_US: u64 = 200_000;

/// How long a transient message stays on screen, in microseconds.
pub const MESSAGE_WINDOW_US: u64 = 2_000_000;

/// Main loop period in milliseconds.
pub const TICK_MS: u32 = 500;

/// Log file created in the root directory of the card (8.3 name).
pub const LOG_FILE_NAME: &str = "dados.csv";

/// First line of a fresh log file.
pub const CSV_HEADER: &str = "Date,Tempo,X_ACLR,Y_ACLR,z_ACLR,X_GYRO,Y_GYRO,Z_GYRO\n";

/// Written in place of `YYYY-MM-DD,HH:MM:SS` when the wall clock can't be read.
pub const NO_DATETIME: &str = "0000-00-00,00:00:00";

/// Wall clock seed applied at boot (`DD/MM/YY HH:MM:SS`).
pub const BOOT_DATETIME: &str = "29/07/25 12:00:00";

/// Runtime configuration handed to [`crate::DataLogger`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub log_file_name: &'static str,
    pub boot_datetime: &'static str,
    pub tick_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file_name: LOG_FILE_NAME,
            boot_datetime: BOOT_DATETIME,
            tick_ms: TICK_MS,
        }
    }
}
