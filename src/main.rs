//! SPDX-License-Identifier: MIT OR Apache-2.0
//!
//! # Pico Inertial Data Logger
//!
//! Records MPU6050 accelerometer and gyroscope readings to a CSV file on an
//! SD card, with an OLED status screen, RGB indicator and buzzer feedback.
//! - **Hardware Module:** HAL setup and peripheral adapters (`hardware.rs`).
//! - **USB Module:** Status console over CDC serial (`usb_module.rs`).
//! - **Library:** Mount FSM, capture engine and main-loop tick (`pico_datalogger`).
//!
//! Buttons are handled in `IO_IRQ_BANK0`; everything that touches the card,
//! the buses or the buzzer runs in the main loop.
//!
//! Target: Raspberry Pi Pico 2 W (RP2350).

#![no_std]
#![no_main]

// --- Imports ---
use core::cell::RefCell;
use critical_section::Mutex;
use defmt::*;
use defmt_rtt as _;
use embedded_hal::delay::DelayNs;
use panic_probe as _;

use pico_datalogger::app::{Board, LogOutcome};
use pico_datalogger::clock::{FatClock, WallClock};
use pico_datalogger::display;
use pico_datalogger::input::{self, Button, Debouncer, InputEvent};
use pico_datalogger::mount::MountOutcome;
use pico_datalogger::sdcard::SdStorage;
use pico_datalogger::{Config, DataLogger, Shared};

// --- Modules ---
mod hardware;
mod usb_module;

use hardware::{Buttons, Timer, Uptime};

// --- HAL Selection ---
use rp235x_hal as hal;
use hal::entry;
use hal::gpio::Interrupt::EdgeLow;
use hal::pac;
use hal::pac::interrupt;

// --- Bootloader Configuration ---

#[unsafe(link_section = ".start_block")]
#[used]
pub static IMAGE_DEF: hal::block::ImageDef = hal::block::ImageDef::secure_exe();

// --- Shared State ---

/// Flags written by the button interrupt and read by the main loop.
static SHARED: Shared = Shared::new();

struct ButtonIrq {
    buttons: Buttons,
    debouncer: Debouncer,
    timer: Timer,
}

static BUTTON_IRQ: Mutex<RefCell<Option<ButtonIrq>>> = Mutex::new(RefCell::new(None));

/// Entry point.
#[entry]
fn main() -> ! {
    info!("Program start");

    // 1. Initialize Hardware Stack (Clocks, GPIO, Timer, buses, USB)
    let hw = hardware::init();
    let config = Config::default();
    let timer = hw.timer;

    // 2. Wall clock seeded at boot; there is no RTC battery.
    let mut clock = WallClock::new();
    if let Err(e) = clock.set(config.boot_datetime, timer.get_counter().ticks()) {
        warn!("boot datetime rejected: {}", e);
    }

    // 3. Assemble the logger
    let board = Board {
        storage: SdStorage::new(hw.sd_card, FatClock::new(clock, Uptime(timer))),
        tone: hw.buzzer,
        imu: hw.imu,
        panel: hw.oled,
        light: hw.led,
    };
    let mut logger = DataLogger::new(board, &config, clock);
    logger.start(&SHARED, timer.get_counter().ticks());

    // 4. Publish buttons to the ISR, then let edges through
    critical_section::with(|cs| {
        BUTTON_IRQ.borrow_ref_mut(cs).replace(ButtonIrq {
            buttons: hw.buttons,
            debouncer: Debouncer::new(),
            timer,
        });
    });
    unsafe {
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::IO_IRQ_BANK0);
    }

    usb_module::print(format_args!(
        "Pico DataLogger ready, log file {}",
        config.log_file_name
    ));

    // 5. Main Application Loop
    let mut delay = timer;
    loop {
        let report = logger.tick(&SHARED, timer.get_counter().ticks());

        match report.mount {
            Some(MountOutcome::Mounted) => usb_module::print(format_args!("SD card mounted")),
            Some(MountOutcome::Unmounted) => usb_module::print(format_args!("SD card unmounted")),
            Some(MountOutcome::Failed(action)) => {
                usb_module::print(format_args!("SD card {:?} failed", action))
            }
            None => {}
        }
        match report.log {
            LogOutcome::Failed => {
                usb_module::print(format_args!("write to {} failed", config.log_file_name))
            }
            LogOutcome::NoSample => usb_module::print(format_args!("IMU read failed")),
            LogOutcome::Written(_) | LogOutcome::Idle => {}
        }
        usb_module::print(format_args!(
            "{} samples={}",
            display::footer(&report.screen),
            report.samples
        ));

        delay.delay_ms(config.tick_ms);
    }
}

// --- Interrupt Handlers ---

/// Falling edge on any button. Only flags are touched here.
#[allow(non_snake_case)]
#[interrupt]
fn IO_IRQ_BANK0() {
    let reboot = critical_section::with(|cs| {
        let mut guard = BUTTON_IRQ.borrow_ref_mut(cs);
        let Some(irq) = guard.as_mut() else {
            return false;
        };
        let now = irq.timer.get_counter().ticks();
        let mut reboot = false;

        let capture = irq.buttons.capture.interrupt_status(EdgeLow);
        let mount = irq.buttons.mount.interrupt_status(EdgeLow);
        let maintenance = irq.buttons.maintenance.interrupt_status(EdgeLow);
        irq.buttons.capture.clear_interrupt(EdgeLow);
        irq.buttons.mount.clear_interrupt(EdgeLow);
        irq.buttons.maintenance.clear_interrupt(EdgeLow);

        let mut handle = |button: Button, fired: bool| {
            if !fired {
                return;
            }
            match input::on_edge(&mut irq.debouncer, &SHARED, button, now) {
                Some(InputEvent::MaintenanceRequested) => reboot = true,
                Some(event) => debug!("{}", event),
                None => {}
            }
        };

        handle(Button::Capture, capture);
        handle(Button::Mount, mount);
        handle(Button::Maintenance, maintenance);
        reboot
    });

    if reboot {
        info!("rebooting into USB bootloader");
        hal::reboot::reboot(
            hal::reboot::RebootKind::BootSel {
                msd_disabled: false,
                picoboot_disabled: false,
            },
            hal::reboot::RebootArch::Normal,
        );
    }
}

// --- Metadata ---

#[unsafe(link_section = ".bi_entries")]
#[used]
pub static PICOTOOL_ENTRIES: [hal::binary_info::EntryAddr; 4] = [
    hal::binary_info::rp_cargo_bin_name!(),
    hal::binary_info::rp_cargo_version!(),
    hal::binary_info::rp_program_description!(c"Pico inertial data logger"),
    hal::binary_info::rp_program_build_attribute!()
];
