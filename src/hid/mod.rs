//! HID report types and the device's report-publishing seam.

pub mod gamepad;
pub mod keyboard;
pub mod mouse;


use crate::config::{
    LAYOUT_GAMEPAD, LAYOUT_KEYBOARD, LAYOUT_MOUSE, REG_GAMEPAD, REG_KEYBOARD, REG_MOUSE,
};
use crate::error::HidError;
use gamepad::{GamepadReport, GAMEPAD_REPORT_SIZE};
use keyboard::{KeyboardReport, KEYBOARD_REPORT_SIZE};
use mouse::{MouseReport, MOUSE_REPORT_SIZE};

/// The HID interfaces this protocol revision can drive.
///
/// The composite layout may name further interfaces (joystick, pen, ...);
/// those bits are carried as configuration but have no report register
/// here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidInterface {
    Keyboard,
    Mouse,
    Gamepad,
}

impl HidInterface {
    /// The register a host writes reports for this interface to.
    pub const fn register_index(self) -> u8 {
        match self {
            HidInterface::Keyboard => REG_KEYBOARD,
            HidInterface::Mouse => REG_MOUSE,
            HidInterface::Gamepad => REG_GAMEPAD,
        }
    }

    /// The composite-layout bit that enables this interface.
    pub const fn layout_bit(self) -> u16 {
        match self {
            HidInterface::Keyboard => LAYOUT_KEYBOARD,
            HidInterface::Mouse => LAYOUT_MOUSE,
            HidInterface::Gamepad => LAYOUT_GAMEPAD,
        }
    }

    /// Exact payload length the interface's register accepts.
    pub const fn report_len(self) -> usize {
        match self {
            HidInterface::Keyboard => KEYBOARD_REPORT_SIZE,
            HidInterface::Mouse => MOUSE_REPORT_SIZE,
            HidInterface::Gamepad => GAMEPAD_REPORT_SIZE,
        }
    }
}

/// A decoded report for any of the supported interfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidReport {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
    Gamepad(GamepadReport),
}

impl HidReport {
    /// Decode a register payload for the given interface. `None` when
    /// the payload does not match the interface's exact shape.
    pub fn decode(interface: HidInterface, payload: &[u8]) -> Option<HidReport> {
        match interface {
            HidInterface::Keyboard => {
                KeyboardReport::from_payload(payload).map(HidReport::Keyboard)
            }
            HidInterface::Mouse => MouseReport::from_payload(payload).map(HidReport::Mouse),
            HidInterface::Gamepad => GamepadReport::from_payload(payload).map(HidReport::Gamepad),
        }
    }

    pub const fn interface(&self) -> HidInterface {
        match self {
            HidReport::Keyboard(_) => HidInterface::Keyboard,
            HidReport::Mouse(_) => HidInterface::Mouse,
            HidReport::Gamepad(_) => HidInterface::Gamepad,
        }
    }

    /// Encode into `buf`, returning the number of bytes written. `buf`
    /// must hold at least `interface().report_len()` bytes or nothing
    /// is written.
    pub fn encode(&self, buf: &mut [u8]) -> usize {
        match self {
            HidReport::Keyboard(r) => copy_into(buf, &r.to_bytes()),
            HidReport::Mouse(r) => copy_into(buf, &r.to_bytes()),
            HidReport::Gamepad(r) => copy_into(buf, &r.to_bytes()),
        }
    }
}

fn copy_into(buf: &mut [u8], bytes: &[u8]) -> usize {
    if buf.len() < bytes.len() {
        return 0;
    }
    buf[..bytes.len()].copy_from_slice(bytes);
    bytes.len()
}

/// Where validated reports go: the USB HID stack (or a test double).
///
/// The device core treats publishing as an opaque side effect with a
/// pass/fail outcome. A publish failure surfaces to the host only as a
/// missing `OK` bit; the protocol has no status code for it.
pub trait ReportSink {
    fn publish(&mut self, interface: HidInterface, report: &[u8]) -> Result<(), HidError>;
}
