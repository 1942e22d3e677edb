//! Status screen for the 128x64 OLED.
//!
//! Rendering is a pure function of [`Screen`]: the whole frame is redrawn every
//! tick and pushed with [`Panel::flush`].

use core::fmt::Write;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

use crate::state::MessageKind;

pub const WIDTH: u32 = 128;
pub const HEIGHT: u32 = 64;

pub const TITLE: &str = "PICO DATALOGGER";
const TITLE_Y: i32 = 4;
const RULE_TOP_Y: i32 = 14;
const RULE_BOTTOM_Y: i32 = 50;
const BODY_Y: [i32; 2] = [25, 35];
const FOOTER_Y: i32 = 54;
const TEXT_X: i32 = 4;

/// Buffered display: draw into RAM, then push the frame.
pub trait Panel: DrawTarget<Color = BinaryColor> {
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Everything a frame depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Screen {
    pub mounted: bool,
    pub capturing: bool,
    pub samples: u32,
    pub message: Option<MessageKind>,
}

pub type BodyLine = String<24>;

fn line(text: &str) -> BodyLine {
    let mut out = BodyLine::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

fn message_text(kind: MessageKind) -> (&'static str, &'static str) {
    match kind {
        MessageKind::Mounted => ("-> SD Card", "   Mounted!"),
        MessageKind::Unmounted => ("-> SD Card", "   Unmounted."),
        MessageKind::CaptureStarted => ("-> Recording", "   Started!"),
        MessageKind::CaptureStopped => ("-> Recording", "   Paused."),
        MessageKind::InvalidCapture => ("ERROR: Mount SD", "to record."),
        MessageKind::MountError => ("ERROR: SD Card", "   not ready."),
        MessageKind::WriteError => ("ERROR: Write", "   failed."),
    }
}

/// The two body lines: the transient message if any, else the prompt.
pub fn body(screen: &Screen) -> [BodyLine; 2] {
    if let Some(kind) = screen.message {
        let (first, second) = message_text(kind);
        return [line(first), line(second)];
    }

    if !screen.mounted {
        [line("Action: Mount SD"), line("      (Button B)")]
    } else if screen.capturing {
        let mut count = BodyLine::new();
        let _ = write!(count, "Samples: {}", screen.samples);
        [line("Status: Capturing"), count]
    } else {
        [line("Action: Record"), line("      (Button A)")]
    }
}

pub fn footer(screen: &Screen) -> &'static str {
    match (screen.mounted, screen.capturing) {
        (true, true) => "MODE: RECORDING",
        (true, false) => "MODE: READY",
        (false, _) => "MODE: IDLE",
    }
}

/// Draws the full frame into `target`. Does not flush.
pub fn render<D>(target: &mut D, screen: &Screen) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let text = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);

    target.clear(BinaryColor::Off)?;

    Rectangle::new(Point::zero(), Size::new(WIDTH, HEIGHT))
        .into_styled(stroke)
        .draw(target)?;
    Text::with_baseline(TITLE, Point::new(TEXT_X, TITLE_Y), text, Baseline::Top).draw(target)?;
    for y in [RULE_TOP_Y, RULE_BOTTOM_Y] {
        Line::new(Point::new(1, y), Point::new(WIDTH as i32 - 2, y))
            .into_styled(stroke)
            .draw(target)?;
    }

    for (content, y) in body(screen).iter().zip(BODY_Y) {
        Text::with_baseline(content, Point::new(TEXT_X, y), text, Baseline::Top).draw(target)?;
    }
    Text::with_baseline(
        footer(screen),
        Point::new(TEXT_X, FOOTER_Y),
        text,
        Baseline::Top,
    )
    .draw(target)?;

    Ok(())
}

/// Renders and pushes one frame.
pub fn show<P: Panel>(panel: &mut P, screen: &Screen) -> Result<(), P::Error> {
    render(panel, screen)?;
    panel.flush()
}
