//! Main control loop.
//!
//! [`DataLogger::tick`] runs one iteration in a fixed order:
//! 1. Drain pending audio cues.
//! 2. Reconcile the card with the requested mount state.
//! 3. Update the RGB indicator.
//! 4. Sample the IMU.
//! 5. Redraw the display.
//! 6. Append a record if armed and mounted.
//!
//! Feedback and mount handling come first so the frame drawn in the same tick
//! already shows their message and mode. The caller sleeps between ticks.

use crate::clock::WallClock;
use crate::config::Config;
use crate::display::{self, Panel, Screen};
use crate::error::LogError;
use crate::feedback::{self, STARTUP, Tone};
use crate::indicator::{Indicator, StatusLight};
use crate::logger::CaptureLogger;
use crate::mount::{MountController, MountOutcome, Storage};
use crate::sensor::{InertialSensor, Sample};
use crate::state::{Cue, MessageKind, Shared, Snapshot};

/// What happened to the log during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogOutcome {
    /// Not armed, or no card.
    Idle,
    Written(u32),
    Failed,
    /// The IMU read failed; nothing to log.
    NoSample,
}

/// Summary of one tick, for the status console.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub indicator: Indicator,
    /// The frame drawn this tick.
    pub screen: Screen,
    pub mount: Option<MountOutcome>,
    pub log: LogOutcome,
    pub cues_played: u8,
    pub samples: u32,
}

/// The board's collaborators, grouped so the loop can own them.
pub struct Board<S, T, I, P, L> {
    pub storage: S,
    pub tone: T,
    pub imu: I,
    pub panel: P,
    pub light: L,
}

pub struct DataLogger<S, T, I, P, L> {
    board: Board<S, T, I, P, L>,
    mount: MountController,
    logger: CaptureLogger,
    clock: WallClock,
}

impl<S, T, I, P, L> DataLogger<S, T, I, P, L>
where
    S: Storage,
    T: Tone,
    I: InertialSensor,
    P: Panel,
    L: StatusLight,
{
    pub fn new(board: Board<S, T, I, P, L>, config: &Config, clock: WallClock) -> Self {
        Self {
            board,
            mount: MountController::new(),
            logger: CaptureLogger::new(config.log_file_name),
            clock,
        }
    }

    pub fn board(&self) -> &Board<S, T, I, P, L> {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board<S, T, I, P, L> {
        &mut self.board
    }

    pub fn sample_count(&self) -> u32 {
        self.logger.sample_count()
    }

    /// Draws the idle frame and plays the startup melody.
    pub fn start(&mut self, shared: &Shared, now: u64) {
        let snapshot = shared.snapshot();
        self.board
            .light
            .show(Indicator::from_state(snapshot.mounted, snapshot.capturing));
        self.redraw(shared, snapshot, now);
        feedback::play(&mut self.board.tone, STARTUP);
    }

    pub fn tick(&mut self, shared: &Shared, now: u64) -> TickReport {
        let cues_played = feedback::drain(shared, &mut self.board.tone);

        let mount = self.mount.reconcile(shared, &mut self.board.storage, now);

        let snapshot = shared.snapshot();
        let indicator = Indicator::from_state(snapshot.mounted, snapshot.capturing);
        self.board.light.show(indicator);

        let sample = match self.board.imu.read_raw() {
            Ok(sample) => Some(sample),
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("IMU read failed");
                None
            }
        };

        let screen = self.redraw(shared, snapshot, now);

        let log = if snapshot.mounted && snapshot.capturing {
            match sample {
                Some(sample) => self.log(shared, &sample, now),
                None => LogOutcome::NoSample,
            }
        } else {
            LogOutcome::Idle
        };

        TickReport {
            indicator,
            screen,
            mount,
            log,
            cues_played,
            samples: self.logger.sample_count(),
        }
    }

    fn log(&mut self, shared: &Shared, sample: &Sample, now: u64) -> LogOutcome {
        let stamp = self.clock.now(now);
        match self.logger.tick(&mut self.board.storage, sample, stamp) {
            Ok(count) => LogOutcome::Written(count),
            Err(e) => {
                match e {
                    LogError::Storage(_e) => {
                        #[cfg(feature = "defmt")]
                        defmt::error!("write failed: {}", defmt::Debug2Format(&_e));
                    }
                    LogError::Format => {
                        #[cfg(feature = "defmt")]
                        defmt::error!("record did not fit line buffer");
                    }
                }
                shared.post_message(MessageKind::WriteError, now);
                shared.request_cue(Cue::Error);
                LogOutcome::Failed
            }
        }
    }

    fn redraw(&mut self, shared: &Shared, snapshot: Snapshot, now: u64) -> Screen {
        let screen = Screen {
            mounted: snapshot.mounted,
            capturing: snapshot.capturing,
            samples: self.logger.sample_count(),
            message: shared.active_message(now),
        };
        if display::show(&mut self.board.panel, &screen).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("display flush failed");
        }
        screen
    }
}
