//! USB status console
//!
//! CDC serial port the firmware prints its status lines to. The device and
//! port live in globals shared with the `USBCTRL_IRQ` handler, which keeps
//! enumeration alive while the main loop is blocked on the card or a tone.

use core::cell::RefCell;
use core::fmt::{self, Write as FmtWrite};
use critical_section::Mutex;
use heapless::String;
use usb_device::prelude::*;
use usbd_serial::SerialPort;

use rp235x_hal as hal;
use hal::pac;
use hal::pac::interrupt;

type UsbBusType = hal::usb::UsbBus;

/// Longest line `print` will emit; longer output is truncated.
const LINE_CAPACITY: usize = 96;

static USB_DEVICE: Mutex<RefCell<Option<UsbDevice<UsbBusType>>>> = Mutex::new(RefCell::new(None));
static USB_SERIAL: Mutex<RefCell<Option<SerialPort<UsbBusType>>>> = Mutex::new(RefCell::new(None));

/// Brings up the CDC port and unmasks the USB interrupt.
///
/// Must be called once, before any other interrupt that prints is enabled.
pub fn init(
    usb_periph: pac::USB,
    usb_dpram: pac::USB_DPRAM,
    usb_clock: hal::clocks::UsbClock,
    resets: &mut pac::RESETS,
) {
    let usb_bus = hal::usb::UsbBus::new(usb_periph, usb_dpram, usb_clock, true, resets);

    static mut USB_BUS: Option<usb_device::bus::UsbBusAllocator<UsbBusType>> = None;

    // Safety: single call at boot, USB interrupt still masked.
    let bus_allocator = unsafe {
        let bus_ptr = core::ptr::addr_of_mut!(USB_BUS);
        *bus_ptr = Some(usb_device::bus::UsbBusAllocator::new(usb_bus));
        (*bus_ptr).as_ref().unwrap()
    };

    let serial = SerialPort::new(bus_allocator);
    let usb_dev = UsbDeviceBuilder::new(bus_allocator, UsbVidPid(0x16c0, 0x27dd))
        .strings(&[StringDescriptors::default()
            .manufacturer("Raspberry Pi")
            .product("Pico DataLogger")
            .serial_number("DLOG001")])
        .unwrap()
        .device_class(usbd_serial::USB_CLASS_CDC)
        .build();

    critical_section::with(|cs| {
        USB_DEVICE.borrow_ref_mut(cs).replace(usb_dev);
        USB_SERIAL.borrow_ref_mut(cs).replace(serial);
    });

    unsafe {
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::USBCTRL_IRQ);
    }
}

/// Writes raw bytes. Dropped silently when no host is attached.
pub fn write(data: &[u8]) {
    critical_section::with(|cs| {
        let mut serial = USB_SERIAL.borrow_ref_mut(cs);
        if let Some(serial) = serial.as_mut() {
            let _ = serial.write(data);
        }
    });
}

/// Formats one line, appends CRLF, and writes it.
pub fn print(args: fmt::Arguments) {
    let mut line: String<LINE_CAPACITY> = String::new();
    let _ = line.write_fmt(args);
    if line.len() > LINE_CAPACITY - 2 {
        line.truncate(LINE_CAPACITY - 2);
    }
    let _ = line.push_str("\r\n");
    write(line.as_bytes());
}

#[allow(non_snake_case)]
#[interrupt]
fn USBCTRL_IRQ() {
    critical_section::with(|cs| {
        let mut dev = USB_DEVICE.borrow_ref_mut(cs);
        let mut serial = USB_SERIAL.borrow_ref_mut(cs);

        if let (Some(dev), Some(serial)) = (dev.as_mut(), serial.as_mut()) {
            if dev.poll(&mut [serial]) {
                // The console is output only; discard whatever the host sends.
                let mut buf = [0u8; 64];
                let _ = serial.read(&mut buf);
            }
        }
    });
}
