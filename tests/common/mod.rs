//! In-memory stand-ins for the board peripherals.

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use pico_datalogger::app::Board;
use pico_datalogger::display::{HEIGHT, Panel, WIDTH};
use pico_datalogger::feedback::Tone;
use pico_datalogger::indicator::{Indicator, StatusLight};
use pico_datalogger::mount::Storage;
use pico_datalogger::sensor::{InertialSensor, Sample};

/// Card with a flat directory, open handles tracked by name.
#[derive(Debug, Default)]
pub struct MemCard {
    pub files: HashMap<String, Vec<u8>>,
    pub mounted: bool,
    pub mounts: u32,
    pub unmounts: u32,
    pub open_handles: u32,
    pub fail_mount: bool,
    pub fail_writes: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CardError {
    NotMounted,
    Io,
}

impl MemCard {
    pub fn text(&self, name: &str) -> String {
        String::from_utf8(self.files.get(name).cloned().unwrap_or_default()).unwrap()
    }
}

impl Storage for MemCard {
    type Error = CardError;
    type File = String;

    fn mount(&mut self) -> Result<(), CardError> {
        self.mounts += 1;
        if self.fail_mount {
            return Err(CardError::Io);
        }
        self.mounted = true;
        Ok(())
    }

    fn unmount(&mut self) -> Result<(), CardError> {
        self.unmounts += 1;
        self.mounted = false;
        Ok(())
    }

    fn open_append(&mut self, name: &str) -> Result<String, CardError> {
        if !self.mounted {
            return Err(CardError::NotMounted);
        }
        self.files.entry(name.to_string()).or_default();
        self.open_handles += 1;
        Ok(name.to_string())
    }

    fn size(&mut self, file: &String) -> Result<u32, CardError> {
        Ok(self.files[file].len() as u32)
    }

    fn write(&mut self, file: &mut String, data: &[u8]) -> Result<(), CardError> {
        if self.fail_writes {
            return Err(CardError::Io);
        }
        self.files.get_mut(file.as_str()).ok_or(CardError::Io)?.extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self, _file: String) -> Result<(), CardError> {
        self.open_handles -= 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Buzzer {
    pub notes: Vec<(u32, u32)>,
}

impl Tone for Buzzer {
    fn play(&mut self, frequency_hz: u32, duration_ms: u32) {
        self.notes.push((frequency_hz, duration_ms));
    }
}

/// Returns an increasing X acceleration on every read.
#[derive(Debug, Default)]
pub struct RampImu {
    pub reads: i16,
    pub fail: bool,
}

impl InertialSensor for RampImu {
    type Error = ();

    fn read_raw(&mut self) -> Result<Sample, ()> {
        if self.fail {
            return Err(());
        }
        self.reads += 1;
        Ok(Sample {
            accel: [self.reads, 0, 16384],
            gyro: [0, 0, -self.reads],
        })
    }
}

#[derive(Debug, Default)]
pub struct Oled {
    pub lit: usize,
    pub frames: u32,
}

impl OriginDimensions for Oled {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl DrawTarget for Oled {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.lit += pixels.into_iter().filter(|Pixel(_, c)| c.is_on()).count();
        Ok(())
    }
}

impl Panel for Oled {
    fn flush(&mut self) -> Result<(), Self::Error> {
        self.frames += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Led {
    pub shown: Vec<Indicator>,
}

impl StatusLight for Led {
    fn show(&mut self, indicator: Indicator) {
        self.shown.push(indicator);
    }
}

pub type TestBoard = Board<MemCard, Buzzer, RampImu, Oled, Led>;

pub fn board() -> TestBoard {
    Board {
        storage: MemCard::default(),
        tone: Buzzer::default(),
        imu: RampImu::default(),
        panel: Oled::default(),
        light: Led::default(),
    }
}
