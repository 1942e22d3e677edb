//! SD card mount lifecycle.
//!
//! The mount button only flips `mount_requested`; the card is touched here,
//! from the main loop, at most once per request edge. The lifecycle is a typed
//! state machine: `reconcile` feeds it the requested state, performs whatever
//! storage action the machine asks for, then reports completion back to it.

use core::fmt::Debug;

use typed_fsm::{Transition, state_machine};

use crate::state::{Cue, MessageKind, Shared};

/// Removable storage with a FAT-style file API.
pub trait Storage {
    type Error: Debug;
    type File;

    fn mount(&mut self) -> Result<(), Self::Error>;
    fn unmount(&mut self) -> Result<(), Self::Error>;
    /// Opens (creating if needed) `name` positioned at its end.
    fn open_append(&mut self, name: &str) -> Result<Self::File, Self::Error>;
    fn size(&mut self, file: &Self::File) -> Result<u32, Self::Error>;
    fn write(&mut self, file: &mut Self::File, data: &[u8]) -> Result<(), Self::Error>;
    /// Flushes and releases the handle.
    fn close(&mut self, file: Self::File) -> Result<(), Self::Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MountAction {
    Mount,
    Unmount,
}

/// Result of one storage transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MountOutcome {
    Mounted,
    Unmounted,
    Failed(MountAction),
}

// FSM Context
#[derive(Debug, Default)]
pub struct MountContext {
    pub mounted: bool,
    pub action: Option<MountAction>, // Storage call the machine is waiting on
    pub outcome: Option<MountOutcome>,
}

// FSM Events
#[derive(Clone, Copy, Debug)]
pub enum MountEvent {
    Reconcile { requested: bool },
    Completed { ok: bool },
}

state_machine! {
    Name: MountFsm,
    Context: MountContext,
    Event: MountEvent,
    States: {
        Unmounted => {
            entry: |ctx| {
                ctx.mounted = false;
            }
            process: |_ctx, evt| {
                match evt {
                    MountEvent::Reconcile { requested: true } => Transition::To(MountFsm::Mounting),
                    _ => Transition::None,
                }
            }
        },

        Mounting => {
            entry: |ctx| {
                ctx.action = Some(MountAction::Mount);
            }
            process: |ctx, evt| {
                match evt {
                    MountEvent::Completed { ok: true } => {
                        ctx.outcome = Some(MountOutcome::Mounted);
                        Transition::To(MountFsm::Mounted)
                    }
                    MountEvent::Completed { ok: false } => {
                        ctx.outcome = Some(MountOutcome::Failed(MountAction::Mount));
                        Transition::To(MountFsm::Unmounted)
                    }
                    MountEvent::Reconcile { .. } => Transition::None,
                }
            }
        },

        Mounted => {
            entry: |ctx| {
                ctx.mounted = true;
            }
            process: |_ctx, evt| {
                match evt {
                    MountEvent::Reconcile { requested: false } => Transition::To(MountFsm::Unmounting),
                    _ => Transition::None,
                }
            }
        },

        Unmounting => {
            entry: |ctx| {
                ctx.action = Some(MountAction::Unmount);
            }
            process: |ctx, evt| {
                match evt {
                    MountEvent::Completed { ok: true } => {
                        ctx.outcome = Some(MountOutcome::Unmounted);
                        Transition::To(MountFsm::Unmounted)
                    }
                    MountEvent::Completed { ok: false } => {
                        ctx.outcome = Some(MountOutcome::Failed(MountAction::Unmount));
                        Transition::To(MountFsm::Mounted)
                    }
                    MountEvent::Reconcile { .. } => Transition::None,
                }
            }
        }
    }
}

pub struct MountController {
    fsm: MountFsm,
    ctx: MountContext,
}

impl MountController {
    pub fn new() -> Self {
        let mut ctx = MountContext::default();
        let mut fsm = MountFsm::Unmounted;
        fsm.init(&mut ctx);
        Self { fsm, ctx }
    }

    pub fn is_mounted(&self) -> bool {
        self.ctx.mounted
    }

    /// Brings the card in line with the requested state. Does nothing, and
    /// touches no storage, while requested and actual agree.
    pub fn reconcile<S: Storage>(
        &mut self,
        shared: &Shared,
        storage: &mut S,
        now: u64,
    ) -> Option<MountOutcome> {
        let requested = shared.mount_requested();
        self.fsm
            .dispatch(&mut self.ctx, &MountEvent::Reconcile { requested });

        let action = self.ctx.action.take()?;
        let result = match action {
            MountAction::Mount => storage.mount(),
            MountAction::Unmount => storage.unmount(),
        };
        if let Err(_e) = &result {
            #[cfg(feature = "defmt")]
            defmt::warn!("{} failed: {}", action, defmt::Debug2Format(_e));
        }

        self.fsm
            .dispatch(&mut self.ctx, &MountEvent::Completed { ok: result.is_ok() });
        shared.set_mounted(self.ctx.mounted);

        let outcome = self.ctx.outcome.take()?;
        match outcome {
            MountOutcome::Mounted => {
                shared.request_cue(Cue::Confirmation);
                shared.post_message(MessageKind::Mounted, now);
            }
            MountOutcome::Unmounted => {
                shared.request_cue(Cue::Confirmation);
                shared.post_message(MessageKind::Unmounted, now);
            }
            MountOutcome::Failed(_) => {
                // Withdraw the request so the failed edge is not retried
                // every tick; the next press starts over.
                shared.withdraw_mount_request();
                shared.request_cue(Cue::Error);
                shared.post_message(MessageKind::MountError, now);
            }
        }
        Some(outcome)
    }
}

impl Default for MountController {
    fn default() -> Self {
        Self::new()
    }
}
