//! Hardware Abstraction Module
//!
//! This module handles the low-level configuration of the RP2350 peripherals.
//! It encapsulates the setup of Clocks, PLLs, Timer, GPIOs, I2C, SPI and PWM,
//! exposing a `Hardware` struct whose members plug into the logger's traits.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::SetDutyCycle;
use embedded_hal::spi::{ErrorType, Operation, SpiDevice};
use embedded_hal_bus::spi::ExclusiveDevice;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

use rp235x_hal as hal;
use hal::fugit::RateExtU32;
use hal::gpio::bank0::{
    Gpio0, Gpio1, Gpio5, Gpio6, Gpio11, Gpio12, Gpio13, Gpio14, Gpio15, Gpio16, Gpio17,
    Gpio18, Gpio19, Gpio22,
};
use hal::gpio::{
    FunctionI2C, FunctionSio, FunctionSpi, Interrupt, Pin, PullDown, PullUp, SioInput,
    SioOutput,
};
use hal::pac;
use hal::Clock;

use pico_datalogger::clock::Monotonic;
use pico_datalogger::display::Panel;
use pico_datalogger::feedback::{Tone, pwm_divider};
use pico_datalogger::indicator::RgbLed;
use pico_datalogger::sdcard::SpiClock;
use pico_datalogger::sensor::Mpu6050;

use crate::usb_module;

/// External crystal frequency used by the Raspberry Pi Pico 2.
const XTAL_FREQ_HZ: u32 = 12_000_000u32;

/// SD cards must be initialised at 400 kHz or less.
const SD_INIT_HZ: u32 = 400_000;
const SD_DATA_HZ: u32 = 16_000_000;

pub type Timer = hal::Timer<hal::timer::CopyableTimer0>;

type OutputPin<G> = Pin<G, FunctionSio<SioOutput>, PullDown>;
type ButtonPin<G> = Pin<G, FunctionSio<SioInput>, PullUp>;
type I2cPin<G> = Pin<G, FunctionI2C, PullUp>;
type SpiPin<G> = Pin<G, FunctionSpi, PullDown>;

pub type CaptureButton = ButtonPin<Gpio5>;
pub type MountButton = ButtonPin<Gpio6>;
pub type MaintenanceButton = ButtonPin<Gpio22>;

pub type StatusLed = RgbLed<OutputPin<Gpio13>, OutputPin<Gpio11>, OutputPin<Gpio12>>;

type SensorBus = hal::I2C<pac::I2C0, (I2cPin<Gpio0>, I2cPin<Gpio1>)>;
type DisplayBus = hal::I2C<pac::I2C1, (I2cPin<Gpio14>, I2cPin<Gpio15>)>;
type SdSpiBus =
    hal::spi::Spi<hal::spi::Enabled, pac::SPI0, (SpiPin<Gpio19>, SpiPin<Gpio16>, SpiPin<Gpio18>), 8>;

pub type Imu = Mpu6050<SensorBus>;
type SdDevice = ExclusiveDevice<SdSpiBus, OutputPin<Gpio17>, Timer>;

pub type SdCard = embedded_sdmmc::SdCard<SdSpi, Timer>;

/// SPI0 link to the SD card, clock switchable between init and data rates.
pub struct SdSpi {
    device: SdDevice,
    peripheral_hz: u32,
}

impl SdSpi {
    fn set_clock(&mut self, hz: u32) {
        let peripheral_hz = self.peripheral_hz;
        self.device
            .bus_mut()
            .set_baudrate(peripheral_hz.Hz(), hz.Hz());
    }
}

impl ErrorType for SdSpi {
    type Error = <SdDevice as ErrorType>::Error;
}

impl SpiDevice for SdSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        self.device.transaction(operations)
    }
}

impl SpiClock for SdSpi {
    fn init_speed(&mut self) {
        self.set_clock(SD_INIT_HZ);
    }

    fn data_speed(&mut self) {
        self.set_clock(SD_DATA_HZ);
    }
}

type Ssd1306Buffered =
    Ssd1306<I2CInterface<DisplayBus>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// SSD1306 in buffered mode.
pub struct Oled(Ssd1306Buffered);

impl OriginDimensions for Oled {
    fn size(&self) -> Size {
        self.0.size()
    }
}

impl DrawTarget for Oled {
    type Color = BinaryColor;
    type Error = <Ssd1306Buffered as DrawTarget>::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
    {
        self.0.draw_iter(pixels)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.0.clear(color)
    }
}

impl Panel for Oled {
    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush()
    }
}

/// Piezo buzzer on GPIO21 (PWM slice 2, channel B).
pub struct Buzzer {
    slice: hal::pwm::Slice<hal::pwm::Pwm2, hal::pwm::FreeRunning>,
    sys_hz: u32,
    delay: Timer,
}

impl Tone for Buzzer {
    fn play(&mut self, frequency_hz: u32, duration_ms: u32) {
        if frequency_hz == 0 {
            self.delay.delay_ms(duration_ms);
            return;
        }
        let (div, top) = pwm_divider(self.sys_hz, frequency_hz);
        self.slice.set_div_int(div);
        self.slice.set_top(top);
        let _ = self.slice.channel_b.set_duty_cycle(top / 2); // 50% duty
        self.slice.enable();
        self.delay.delay_ms(duration_ms);
        self.slice.disable();
    }
}

/// Microsecond uptime from TIMER0.
#[derive(Clone, Copy)]
pub struct Uptime(pub Timer);

impl Monotonic for Uptime {
    fn now_us(&self) -> u64 {
        self.0.get_counter().ticks()
    }
}

pub struct Buttons {
    pub capture: CaptureButton,
    pub mount: MountButton,
    pub maintenance: MaintenanceButton,
}

pub struct Hardware {
    pub timer: Timer,
    pub buttons: Buttons,
    pub led: StatusLed,
    pub buzzer: Buzzer,
    pub imu: Imu,
    pub oled: Oled,
    pub sd_card: SdCard,
}

/// Initializes the entire hardware stack.
///
/// This function:
/// 1.  Takes ownership of the raw PAC peripherals.
/// 2.  Configures the Watchdog and Clocks (System & USB).
/// 3.  Initializes the Microsecond Timer.
/// 4.  Configures the RGB LED, buttons (falling edge IRQ) and buzzer PWM.
/// 5.  Brings up I2C0 (MPU6050), I2C1 (SSD1306) and SPI0 (SD card, at the
///     init clock until a mount raises it).
/// 6.  Initializes the USB Serial console.
///
/// The button interrupt is configured but left masked in the NVIC; `main`
/// unmasks it once the shared state is published.
pub fn init() -> Hardware {
    // 1. Take ownership of raw peripherals
    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    // 2. Configure Clocks
    let clocks = hal::clocks::init_clocks_and_plls(
        XTAL_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .unwrap();

    // 3. Configure Timer (Microsecond precision)
    let mut timer = hal::Timer::new_timer0(pac.TIMER0, &mut pac.RESETS, &clocks);

    // 4. Configure GPIOs
    let sio = hal::Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let led = RgbLed::new(
        pins.gpio13.into_push_pull_output(),
        pins.gpio11.into_push_pull_output(),
        pins.gpio12.into_push_pull_output(),
    );

    // Active-low buttons with pull-ups, interrupt on press
    let buttons = Buttons {
        capture: pins.gpio5.into_pull_up_input(),
        mount: pins.gpio6.into_pull_up_input(),
        maintenance: pins.gpio22.into_pull_up_input(),
    };
    buttons.capture.set_interrupt_enabled(Interrupt::EdgeLow, true);
    buttons.mount.set_interrupt_enabled(Interrupt::EdgeLow, true);
    buttons.maintenance.set_interrupt_enabled(Interrupt::EdgeLow, true);

    let pwm_slices = hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);
    let mut slice = pwm_slices.pwm2;
    slice.disable();
    slice.channel_b.output_to(pins.gpio21);
    let buzzer = Buzzer {
        slice,
        sys_hz: clocks.system_clock.freq().to_Hz(),
        delay: timer,
    };

    // 5. Buses
    let sensor_bus = hal::I2C::i2c0(
        pac.I2C0,
        pins.gpio0.reconfigure(),
        pins.gpio1.reconfigure(),
        400.kHz(),
        &mut pac.RESETS,
        &clocks.system_clock,
    );
    let mut imu = Mpu6050::new(sensor_bus);
    if imu.reset(&mut timer).is_err() {
        defmt::warn!("MPU6050 did not acknowledge reset");
    }

    let display_bus = hal::I2C::i2c1(
        pac.I2C1,
        pins.gpio14.reconfigure(),
        pins.gpio15.reconfigure(),
        400.kHz(),
        &mut pac.RESETS,
        &clocks.system_clock,
    );
    let mut display = Ssd1306::new(
        I2CDisplayInterface::new(display_bus),
        DisplaySize128x64,
        DisplayRotation::Rotate0,
    )
    .into_buffered_graphics_mode();
    if display.init().is_err() {
        defmt::warn!("SSD1306 init failed");
    }

    let sd_spi = hal::spi::Spi::<_, _, _, 8>::new(
        pac.SPI0,
        (
            pins.gpio19.into_function::<FunctionSpi>(),
            pins.gpio16.into_function::<FunctionSpi>(),
            pins.gpio18.into_function::<FunctionSpi>(),
        ),
    )
    .init(
        &mut pac.RESETS,
        clocks.peripheral_clock.freq(),
        SD_INIT_HZ.Hz(),
        embedded_hal::spi::MODE_0,
    );
    let sd_cs = pins.gpio17.into_push_pull_output();
    let sd_link = SdSpi {
        device: ExclusiveDevice::new(sd_spi, sd_cs, timer).unwrap(),
        peripheral_hz: clocks.peripheral_clock.freq().to_Hz(),
    };
    // Card init is deferred to the first mount.
    let sd_card = embedded_sdmmc::SdCard::new(sd_link, timer);

    // 6. Configure USB Serial (via module)
    usb_module::init(
        pac.USB,
        pac.USB_DPRAM,
        clocks.usb_clock,
        &mut pac.RESETS,
    );

    // Return ready-to-use hardware
    Hardware {
        timer,
        buttons,
        led,
        buzzer,
        imu,
        oled: Oled(display),
        sd_card,
    }
}
