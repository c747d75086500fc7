//! Status register: the protocol's only error channel.
//!
//! The device accumulates outcome bits across write transactions and
//! hands the mask to the host on a status read, which resets it. A
//! freshly booted device reads as the empty baseline; so does a second
//! read with no write in between.

use crate::config::{
    ERROR_INTERFACE_DISABLED, ERROR_NVS_WRITE_FAILED, ERROR_PAYLOAD_TOO_LARGE,
    ERROR_UNKNOWN_REGISTER, STATUS_OK,
};

/// One transaction's outcome, or a snapshot of the accumulated mask.
///
/// A thin wrapper over the wire byte so handler results and host-side
/// decoding share the same bit logic.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(u8);

impl Status {
    /// Empty mask: no outcome recorded.
    pub const NONE: Status = Status(0);

    /// Last command successful.
    pub const OK: Status = Status(STATUS_OK);

    pub const UNKNOWN_REGISTER: Status = Status(ERROR_UNKNOWN_REGISTER);
    pub const PAYLOAD_TOO_LARGE: Status = Status(ERROR_PAYLOAD_TOO_LARGE);
    pub const INTERFACE_DISABLED: Status = Status(ERROR_INTERFACE_DISABLED);
    pub const NVS_WRITE_FAILED: Status = Status(ERROR_NVS_WRITE_FAILED);

    /// Decode a raw status byte read off the bus.
    pub const fn from_bits(bits: u8) -> Self {
        Status(bits)
    }

    /// The wire byte.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Union of two outcomes.
    #[must_use]
    pub const fn with(self, other: Status) -> Status {
        Status(self.0 | other.0)
    }

    pub const fn contains(self, other: Status) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_ok(self) -> bool {
        self.contains(Status::OK)
    }

    /// Any error bit set, regardless of `OK`.
    pub const fn is_err(self) -> bool {
        self.0 & !STATUS_OK != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// The device-side accumulator with read-to-clear semantics.
///
/// Mutated only by the dispatcher and its handlers; read only by the
/// host-facing status-read path.
#[derive(Debug, Default)]
pub struct StatusRegister {
    bits: u8,
}

impl StatusRegister {
    /// Boot baseline: empty mask.
    pub const fn new() -> Self {
        StatusRegister { bits: 0 }
    }

    /// OR outcome bits into the register. Bits stick until read.
    pub fn merge(&mut self, outcome: Status) {
        self.bits |= outcome.bits();
    }

    /// Destructive read: returns the accumulated mask and resets the
    /// register to the baseline.
    pub fn read(&mut self) -> Status {
        let out = Status::from_bits(self.bits);
        self.bits = 0;
        out
    }

    /// Reset to the boot baseline without reporting (device restart).
    pub fn reset(&mut self) {
        self.bits = 0;
    }
}
