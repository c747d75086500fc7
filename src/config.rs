//! Wire-contract constants and compile-time configuration.
//!
//! Register indices, status bits, protocol limits and factory defaults
//! live here so the device core, the host driver and the conformance
//! tests all share one table. This table IS the bus protocol; changing
//! a value here changes the wire format.

// HID data registers (write-only)
//
// Register index = (HID usage page << 4) | usage ID.

/// Mouse report register: Generic Desktop (0x01) | Mouse (0x02).
pub const REG_MOUSE: u8 = 0x12;

/// Gamepad report register: Generic Desktop (0x01) | Gamepad (0x05).
pub const REG_GAMEPAD: u8 = 0x15;

/// Keyboard report register: Generic Desktop (0x01) | Keyboard (0x06).
pub const REG_KEYBOARD: u8 = 0x16;

// Configuration registers (write-only)

/// USB VID/PID, 4 bytes: [VID lo, VID hi, PID lo, PID hi].
pub const REG_CONFIG_USB_IDS: u8 = 0xF0;

/// Manufacturer string, UTF-8, up to 63 bytes plus optional NUL.
pub const REG_CONFIG_MANUFACTURER: u8 = 0xF1;

/// Product string, same encoding as the manufacturer register.
pub const REG_CONFIG_PRODUCT: u8 = 0xF2;

/// Serial string, same encoding as the manufacturer register.
pub const REG_CONFIG_SERIAL: u8 = 0xF3;

/// Composite-device layout, 2 bytes: little-endian interface bitmap.
pub const REG_CONFIG_COMPOSITE: u8 = 0xF4;

/// Bus address, 1 byte: new 7-bit slave address.
pub const REG_CONFIG_BUS_ADDR: u8 = 0xFE;

/// Status register (read-only). Writing a payload here is an unknown
/// register error.
pub const REG_STATUS: u8 = 0xFF;

// Status register bits

/// Last command successful.
pub const STATUS_OK: u8 = 0x01;

/// Write addressed an undefined register.
pub const ERROR_UNKNOWN_REGISTER: u8 = 0x02;

/// Payload did not fit the addressed register.
pub const ERROR_PAYLOAD_TOO_LARGE: u8 = 0x04;

/// HID report for an interface the composite layout disables.
pub const ERROR_INTERFACE_DISABLED: u8 = 0x08;

/// Configuration could not be persisted to non-volatile storage.
pub const ERROR_NVS_WRITE_FAILED: u8 = 0x10;

// Protocol limits

/// Maximum payload bytes in one register write. A 64-byte payload
/// reaches its handler; 65 bytes is rejected by the dispatcher.
pub const MAX_REPORT_SIZE: usize = 64;

/// Maximum content bytes of a USB string (NUL terminator excluded).
pub const MAX_STRING_LENGTH: usize = 63;

// Composite layout bitmap

pub const LAYOUT_KEYBOARD: u16 = 1 << 0;
pub const LAYOUT_MOUSE: u16 = 1 << 1;
pub const LAYOUT_JOYSTICK: u16 = 1 << 2;
pub const LAYOUT_GAMEPAD: u16 = 1 << 3;
pub const LAYOUT_CONSUMER: u16 = 1 << 4;
pub const LAYOUT_PEN: u16 = 1 << 5;
pub const LAYOUT_TOUCHSCREEN: u16 = 1 << 6;
pub const LAYOUT_TOUCHPAD: u16 = 1 << 7;

// Factory defaults

/// Bus address the device listens on out of the box.
pub const DEFAULT_BUS_ADDR: u8 = 0x70;

pub const DEFAULT_USB_VID: u16 = 0x413D;
pub const DEFAULT_USB_PID: u16 = 0x0001;

pub const DEFAULT_MANUFACTURER: &str = "HIDra Project";
pub const DEFAULT_PRODUCT: &str = "HIDra Composite HID";
pub const DEFAULT_SERIAL: &str = "HIDra-000000";

/// Keyboard | Mouse | Gamepad.
pub const DEFAULT_COMPOSITE_LAYOUT: u16 = 0x000B;

// Non-volatile storage keys

pub const NVS_KEY_BUS_ADDR: &str = "i2c.addr";
pub const NVS_KEY_USB_VID: &str = "usb.vid";
pub const NVS_KEY_USB_PID: &str = "usb.pid";
pub const NVS_KEY_MANUFACTURER: &str = "usb.manuf";
pub const NVS_KEY_PRODUCT: &str = "usb.prod";
pub const NVS_KEY_SERIAL: &str = "usb.serial";
pub const NVS_KEY_COMPOSITE_LAYOUT: &str = "usb.layout";
