//! State shared between the GPIO interrupt and the main loop.
//!
//! Each boolean lives in its own atomic so a store from interrupt context can
//! never tear a read in the main loop. The transient message carries a 64-bit
//! timestamp, which the Cortex-M33 cannot store atomically, so it sits behind
//! a critical section instead.

use core::cell::Cell;

use critical_section::Mutex;
use portable_atomic::{AtomicBool, Ordering};

use crate::config::MESSAGE_WINDOW_US;

/// Audio cue requested by an event and played by the main loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cue {
    Confirmation,
    Error,
}

/// Feedback overlay shown in place of the steady-state prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageKind {
    Mounted,
    Unmounted,
    CaptureStarted,
    CaptureStopped,
    InvalidCapture,
    MountError,
    WriteError,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransientMessage {
    pub kind: MessageKind,
    pub issued_at: u64,
}

impl TransientMessage {
    /// The message kind while it is still inside its display window.
    pub fn active(&self, now: u64) -> Option<MessageKind> {
        (now.saturating_sub(self.issued_at) < MESSAGE_WINDOW_US).then_some(self.kind)
    }
}

/// What a capture button press did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureOutcome {
    Started,
    Stopped,
    Rejected,
}

/// Point-in-time copy of the mount and capture flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub mounted: bool,
    pub capturing: bool,
}

pub struct Shared {
    mount_requested: AtomicBool,
    mount_actual: AtomicBool,
    capture_armed: AtomicBool,
    confirmation_cue: AtomicBool,
    error_cue: AtomicBool,
    message: Mutex<Cell<Option<TransientMessage>>>,
}

impl Shared {
    pub const fn new() -> Self {
        Self {
            mount_requested: AtomicBool::new(false),
            mount_actual: AtomicBool::new(false),
            capture_armed: AtomicBool::new(false),
            confirmation_cue: AtomicBool::new(false),
            error_cue: AtomicBool::new(false),
            message: Mutex::new(Cell::new(None)),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mounted: self.is_mounted(),
            capturing: self.is_capturing(),
        }
    }

    pub fn mount_requested(&self) -> bool {
        self.mount_requested.load(Ordering::SeqCst)
    }

    pub fn is_mounted(&self) -> bool {
        self.mount_actual.load(Ordering::SeqCst)
    }

    pub fn is_capturing(&self) -> bool {
        self.capture_armed.load(Ordering::SeqCst)
    }

    /// Mount button: flip the desired state only. The slow card access
    /// happens later in the main loop.
    pub fn toggle_mount_request(&self) -> bool {
        !self.mount_requested.fetch_xor(true, Ordering::SeqCst)
    }

    /// Drops a request that could not be honoured by aligning it with the
    /// actual mount state. A press racing the failure is dropped with it.
    pub fn withdraw_mount_request(&self) {
        self.mount_requested
            .store(self.is_mounted(), Ordering::SeqCst);
    }

    /// Only the main loop writes the actual mount state.
    pub fn set_mounted(&self, mounted: bool) {
        self.mount_actual.store(mounted, Ordering::SeqCst);
    }

    /// Capture button. Arming needs a mounted card; disarming is always
    /// allowed so an armed-but-unmounted device can be brought back to idle.
    pub fn request_capture_toggle(&self, now: u64) -> CaptureOutcome {
        let armed = self.is_capturing();
        if !armed && !self.is_mounted() {
            self.post_message(MessageKind::InvalidCapture, now);
            self.request_cue(Cue::Error);
            return CaptureOutcome::Rejected;
        }

        self.capture_armed.store(!armed, Ordering::SeqCst);
        let (kind, outcome) = if armed {
            (MessageKind::CaptureStopped, CaptureOutcome::Stopped)
        } else {
            (MessageKind::CaptureStarted, CaptureOutcome::Started)
        };
        self.post_message(kind, now);
        self.request_cue(Cue::Confirmation);
        outcome
    }

    /// Requests a cue. A second request before playback coalesces.
    pub fn request_cue(&self, cue: Cue) {
        self.cue_flag(cue).store(true, Ordering::SeqCst);
    }

    /// Clears a pending cue, returning whether it was pending.
    pub fn take_cue(&self, cue: Cue) -> bool {
        self.cue_flag(cue).swap(false, Ordering::SeqCst)
    }

    pub fn cue_pending(&self, cue: Cue) -> bool {
        self.cue_flag(cue).load(Ordering::SeqCst)
    }

    fn cue_flag(&self, cue: Cue) -> &AtomicBool {
        match cue {
            Cue::Confirmation => &self.confirmation_cue,
            Cue::Error => &self.error_cue,
        }
    }

    pub fn post_message(&self, kind: MessageKind, now: u64) {
        critical_section::with(|cs| {
            self.message.borrow(cs).set(Some(TransientMessage {
                kind,
                issued_at: now,
            }))
        });
    }

    /// The transient message, if one was posted and has not yet expired.
    pub fn active_message(&self, now: u64) -> Option<MessageKind> {
        critical_section::with(|cs| self.message.borrow(cs).get())
            .and_then(|msg| msg.active(now))
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}
