//! SPDX-License-Identifier: MIT OR Apache-2.0
//!
//! # Pico Inertial Data Logger
//!
//! Board-independent core of the data logger firmware:
//! - **Input:** Debounced button edges turned into logical events (`input.rs`).
//! - **State:** Flags shared between interrupt and main-loop context (`state.rs`).
//! - **Mount FSM:** Typed state machine for the SD card lifecycle (`mount.rs`).
//! - **Logger:** CSV capture engine (`logger.rs`).
//! - **Main loop:** One fixed-order tick driving all of the above (`app.rs`).
//!
//! The RP2350 binary (`main.rs`) wires the real peripherals into these traits.

#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod feedback;
pub mod indicator;
pub mod input;
pub mod logger;
pub mod mount;
pub mod sdcard;
pub mod sensor;
pub mod state;

pub use app::{DataLogger, TickReport};
pub use config::Config;
pub use error::{ClockError, LogError};
pub use state::{MessageKind, Shared};
