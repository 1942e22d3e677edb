//! RGB status indicator.

use embedded_hal::digital::OutputPin;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    /// Amber: no card mounted.
    Idle,
    /// Green: mounted, not recording.
    Ready,
    /// Red: recording.
    Recording,
    /// Purple: armed while unmounted.
    Anomaly,
}

/// Which channels are lit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl Indicator {
    pub fn from_state(mounted: bool, capturing: bool) -> Self {
        match (mounted, capturing) {
            (false, false) => Indicator::Idle,
            (true, false) => Indicator::Ready,
            (true, true) => Indicator::Recording,
            (false, true) => Indicator::Anomaly,
        }
    }

    pub fn rgb(self) -> Rgb {
        let (red, green, blue) = match self {
            Indicator::Idle => (true, true, false),
            Indicator::Ready => (false, true, false),
            Indicator::Recording => (true, false, false),
            Indicator::Anomaly => (true, false, true),
        };
        Rgb { red, green, blue }
    }
}

pub trait StatusLight {
    fn show(&mut self, indicator: Indicator);
}

/// Common-cathode RGB LED on three GPIOs.
pub struct RgbLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
}

impl<R: OutputPin, G: OutputPin, B: OutputPin> RgbLed<R, G, B> {
    pub fn new(red: R, green: G, blue: B) -> Self {
        Self { red, green, blue }
    }

    pub fn release(self) -> (R, G, B) {
        (self.red, self.green, self.blue)
    }
}

impl<R: OutputPin, G: OutputPin, B: OutputPin> StatusLight for RgbLed<R, G, B> {
    fn show(&mut self, indicator: Indicator) {
        let rgb = indicator.rgb();
        let _ = self.red.set_state(rgb.red.into());
        let _ = self.green.set_state(rgb.green.into());
        let _ = self.blue.set_state(rgb.blue.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn state_table() {
        assert_eq!(Indicator::from_state(false, false), Indicator::Idle);
        assert_eq!(Indicator::from_state(true, false), Indicator::Ready);
        assert_eq!(Indicator::from_state(true, true), Indicator::Recording);
        assert_eq!(Indicator::from_state(false, true), Indicator::Anomaly);
    }

    #[test]
    fn palette() {
        let lit = |i: Indicator| {
            let c = i.rgb();
            (c.red, c.green, c.blue)
        };
        assert_eq!(lit(Indicator::Idle), (true, true, false));
        assert_eq!(lit(Indicator::Ready), (false, true, false));
        assert_eq!(lit(Indicator::Recording), (true, false, false));
        assert_eq!(lit(Indicator::Anomaly), (true, false, true));
    }

    #[test]
    fn drives_pins() {
        let red = PinMock::new(&[Transaction::set(State::High)]);
        let green = PinMock::new(&[Transaction::set(State::Low)]);
        let blue = PinMock::new(&[Transaction::set(State::High)]);

        let mut led = RgbLed::new(red, green, blue);
        led.show(Indicator::Anomaly);

        let (mut red, mut green, mut blue) = led.release();
        red.done();
        green.done();
        blue.done();
    }
}
