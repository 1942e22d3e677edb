//! Debounced button input.
//!
//! Called from the GPIO interrupt: no I/O and no blocking here, only flag
//! updates on [`Shared`].

use crate::config::DEBOUNCE_US;
use crate::state::{CaptureOutcome, Shared};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Button A: start/stop recording.
    Capture,
    /// Button B: mount/unmount the card.
    Mount,
    /// Joystick press: reboot into the USB bootloader.
    Maintenance,
}

impl Button {
    const fn index(self) -> usize {
        match self {
            Button::Capture => 0,
            Button::Mount => 1,
            Button::Maintenance => 2,
        }
    }
}

/// Logical event produced by an accepted edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    Capture(CaptureOutcome),
    MountRequested(bool),
    MaintenanceRequested,
}

/// One debounce window per button.
#[derive(Clone, Copy, Debug, Default)]
pub struct Debouncer {
    last_accepted: [Option<u64>; 3],
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            last_accepted: [None; 3],
        }
    }

    /// Accepts the edge if it is the first one for this button or falls
    /// strictly outside the previous window. The first edge has no window,
    /// so a press right after boot is not lost.
    pub fn accept(&mut self, button: Button, now: u64) -> bool {
        let slot = &mut self.last_accepted[button.index()];
        let accepted = match *slot {
            None => true,
            Some(last) => now.saturating_sub(last) > DEBOUNCE_US,
        };
        if accepted {
            *slot = Some(now);
        }
        accepted
    }
}

/// Handles one falling edge. Returns the logical event it produced, or
/// `None` when the edge bounced.
pub fn on_edge(
    debouncer: &mut Debouncer,
    shared: &Shared,
    button: Button,
    now: u64,
) -> Option<InputEvent> {
    if !debouncer.accept(button, now) {
        return None;
    }

    let event = match button {
        Button::Capture => InputEvent::Capture(shared.request_capture_toggle(now)),
        Button::Mount => InputEvent::MountRequested(shared.toggle_mount_request()),
        Button::Maintenance => InputEvent::MaintenanceRequested,
    };
    Some(event)
}
