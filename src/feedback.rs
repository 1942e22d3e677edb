//! Audio feedback.
//!
//! Cues are requested from anywhere (interrupts included) by raising a flag in
//! [`Shared`]; the main loop drains them once per tick. Playback blocks, which
//! is fine since the longest cue is 350 ms against a 500 ms tick.

use crate::state::{Cue, Shared};

/// Single-channel tone output.
pub trait Tone {
    /// Plays `frequency_hz` for `duration_ms`, blocking. A frequency of 0 is
    /// silence for the same duration.
    fn play(&mut self, frequency_hz: u32, duration_ms: u32);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

const fn note(frequency_hz: u32, duration_ms: u32) -> Note {
    Note {
        frequency_hz,
        duration_ms,
    }
}

pub const NOTE_C5: u32 = 523;
pub const NOTE_E5: u32 = 659;
pub const NOTE_G5: u32 = 784;
pub const NOTE_C6: u32 = 1047;

pub const CONFIRMATION: &[Note] = &[note(600, 120)];
pub const ERROR: &[Note] = &[note(400, 150), note(0, 50), note(400, 150)];
pub const STARTUP: &[Note] = &[
    note(NOTE_C5, 100),
    note(NOTE_E5, 100),
    note(NOTE_G5, 100),
    note(NOTE_C6, 150),
];

impl Cue {
    pub fn melody(self) -> &'static [Note] {
        match self {
            Cue::Confirmation => CONFIRMATION,
            Cue::Error => ERROR,
        }
    }
}

pub fn play<T: Tone>(tone: &mut T, melody: &[Note]) {
    for n in melody {
        tone.play(n.frequency_hz, n.duration_ms);
    }
}

/// Integer clock divider and wrap value for a square wave of `frequency_hz`
/// from a PWM slice clocked at `sys_hz`.
///
/// The divider is the smallest that keeps `top` within 16 bits, clamped to
/// the hardware's 1..=255 range.
pub fn pwm_divider(sys_hz: u32, frequency_hz: u32) -> (u8, u16) {
    let cycles = sys_hz / frequency_hz.max(1);
    let div = cycles.div_ceil(1 << 16).clamp(1, 255);
    let top = (cycles / div).saturating_sub(1).min(u16::MAX as u32);
    (div as u8, top as u16)
}

/// Plays pending cues, confirmation first. Returns how many were played.
pub fn drain<T: Tone>(shared: &Shared, tone: &mut T) -> u8 {
    let mut played = 0;
    for cue in [Cue::Confirmation, Cue::Error] {
        if shared.take_cue(cue) {
            play(tone, cue.melody());
            played += 1;
        }
    }
    played
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<(u32, u32)>);

    impl Tone for Recorder {
        fn play(&mut self, frequency_hz: u32, duration_ms: u32) {
            self.0.push((frequency_hz, duration_ms));
        }
    }

    #[test]
    fn drains_confirmation_before_error() {
        let shared = Shared::new();
        shared.request_cue(Cue::Error);
        shared.request_cue(Cue::Confirmation);

        let mut tone = Recorder::default();
        assert_eq!(drain(&shared, &mut tone), 2);
        assert_eq!(tone.0, vec![(600, 120), (400, 150), (0, 50), (400, 150)]);

        assert_eq!(drain(&shared, &mut tone), 0);
        assert_eq!(tone.0.len(), 4);
    }

    #[test]
    fn nothing_pending_plays_nothing() {
        let shared = Shared::new();
        let mut tone = Recorder::default();
        assert_eq!(drain(&shared, &mut tone), 0);
        assert!(tone.0.is_empty());
    }

    #[test]
    fn pwm_wrap_fits_sixteen_bits() {
        // 150 MHz system clock
        assert_eq!(pwm_divider(150_000_000, 400), (6, 62_499));
        assert_eq!(pwm_divider(150_000_000, 600), (4, 62_499));
        assert_eq!(pwm_divider(150_000_000, NOTE_C6), (3, 47_754));
        // Very low tones saturate the divider.
        let (div, top) = pwm_divider(150_000_000, 1);
        assert_eq!(div, 255);
        assert_eq!(top, u16::MAX);
    }

    #[test]
    fn cues_stay_short() {
        let total: u32 = [CONFIRMATION, ERROR]
            .iter()
            .flat_map(|m| m.iter())
            .map(|n| n.duration_ms)
            .sum();
        assert!(total <= 420);
    }
}
