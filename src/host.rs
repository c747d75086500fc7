//! Host-side master driver.
//!
//! Frames register writes and status reads for a HIDra device behind
//! any byte-oriented addressed bus (I2C via an FT232H/CH341A bridge, a
//! native peripheral, or the loopback used in tests). Pure plumbing:
//! the driver validates sizes before touching the bus, but protocol
//! outcomes arrive only through the status register.

use crate::config::{
    DEFAULT_BUS_ADDR, MAX_REPORT_SIZE, MAX_STRING_LENGTH, REG_CONFIG_BUS_ADDR,
    REG_CONFIG_COMPOSITE, REG_CONFIG_USB_IDS, REG_STATUS,
};
use crate::device::{CompositeLayout, StringField};
use crate::error::{Error, TransportError};
use crate::hid::gamepad::GamepadReport;
use crate::hid::keyboard::KeyboardReport;
use crate::hid::mouse::MouseReport;
use crate::hid::HidInterface;
use crate::status::Status;

/// The addressed, half-duplex byte channel both roles share.
///
/// Both calls may fail; a failure here is the transport layer speaking,
/// not the device's status register.
pub trait Transport {
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), TransportError>;
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), TransportError>;
}

/// Driver for one HIDra device on the bus.
///
/// After `change_address` the driver retargets itself; after any
/// identity change the device reboots and the next status read is
/// expected to fail until it re-enumerates.
pub struct HidraHost<T: Transport> {
    bus: T,
    address: u8,
}

impl<T: Transport> HidraHost<T> {
    /// Attach to a device at the factory-default address.
    pub fn new(bus: T) -> Self {
        HidraHost::with_address(bus, DEFAULT_BUS_ADDR)
    }

    pub fn with_address(bus: T, address: u8) -> Self {
        HidraHost { bus, address }
    }

    /// The address this driver currently targets.
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn bus(&self) -> &T {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut T {
        &mut self.bus
    }

    /// Write a raw report payload to a register.
    ///
    /// Guards `1..=MAX_REPORT_SIZE` before any bus traffic; the device
    /// would reject an oversized frame anyway, but a master has no
    /// business occupying the bus with one.
    pub fn send_report(&mut self, register: u8, report: &[u8]) -> Result<(), Error> {
        if report.is_empty() || report.len() > MAX_REPORT_SIZE {
            return Err(Error::ReportTooLong);
        }
        let mut frame = [0u8; MAX_REPORT_SIZE + 1];
        frame[0] = register;
        frame[1..=report.len()].copy_from_slice(report);
        self.bus.write(self.address, &frame[..report.len() + 1])?;
        Ok(())
    }

    pub fn send_keyboard(&mut self, report: &KeyboardReport) -> Result<(), Error> {
        self.send_report(
            HidInterface::Keyboard.register_index(),
            &report.to_bytes(),
        )
    }

    pub fn send_mouse(&mut self, report: &MouseReport) -> Result<(), Error> {
        self.send_report(HidInterface::Mouse.register_index(), &report.to_bytes())
    }

    pub fn send_gamepad(&mut self, report: &GamepadReport) -> Result<(), Error> {
        self.send_report(HidInterface::Gamepad.register_index(), &report.to_bytes())
    }

    /// Read and clear the device's status register: an addressed write
    /// of the register index, then a 1-byte read.
    pub fn read_status(&mut self) -> Result<Status, Error> {
        self.bus.write(self.address, &[REG_STATUS])?;
        let mut buf = [0u8; 1];
        self.bus.read(self.address, &mut buf)?;
        Ok(Status::from_bits(buf[0]))
    }

    /// Rewrite the device's USB VID/PID. The device persists the pair
    /// and reboots; expect the session to die.
    pub fn set_usb_ids(&mut self, vid: u16, pid: u16) -> Result<(), Error> {
        let vid = vid.to_le_bytes();
        let pid = pid.to_le_bytes();
        self.bus.write(
            self.address,
            &[REG_CONFIG_USB_IDS, vid[0], vid[1], pid[0], pid[1]],
        )?;
        Ok(())
    }

    /// Select which HID interfaces the device enumerates. Reboots the
    /// device on success.
    pub fn set_composite_layout(&mut self, layout: CompositeLayout) -> Result<(), Error> {
        let bits = layout.bits().to_le_bytes();
        self.bus
            .write(self.address, &[REG_CONFIG_COMPOSITE, bits[0], bits[1]])?;
        Ok(())
    }

    /// Rewrite one USB descriptor string (NUL-terminated on the wire).
    /// Reboots the device on success.
    pub fn set_usb_string(&mut self, field: StringField, value: &str) -> Result<(), Error> {
        if value.len() > MAX_STRING_LENGTH {
            return Err(Error::StringTooLong);
        }
        let mut frame = [0u8; MAX_STRING_LENGTH + 2];
        frame[0] = field.register_index();
        frame[1..=value.len()].copy_from_slice(value.as_bytes());
        // frame[value.len() + 1] is already the NUL terminator.
        self.bus.write(self.address, &frame[..value.len() + 2])?;
        Ok(())
    }

    /// Move the device to a new bus address and retarget the driver.
    /// The device reboots; it answers at the new address only after
    /// re-joining the bus.
    pub fn change_address(&mut self, new_address: u8) -> Result<(), Error> {
        self.bus
            .write(self.address, &[REG_CONFIG_BUS_ADDR, new_address])?;
        self.address = new_address;
        Ok(())
    }
}
