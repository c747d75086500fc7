//! Protocol core for HIDra, an I2C-driven composite USB HID adapter.
//!
//! A host writes `[register][payload...]` frames to the device and
//! polls a read-to-clear status register for the outcome. This crate
//! implements both ends of that contract as pure, hardware-free state
//! machines:
//!
//! - [`Device`]: the slave-side dispatcher, status accumulator, HID
//!   report emitters and the persist-then-restart reconfiguration
//!   handlers (USB identity, composite layout, bus address);
//! - [`HidraHost`]: the master-side driver that frames transactions
//!   over any [`Transport`].
//!
//! Hardware lives behind three traits: [`Transport`] (the bus),
//! [`ReportSink`] (the USB HID stack) and [`ConfigStore`] (non-volatile
//! storage). Firmware supplies real implementations; the tests here run
//! on the host against in-memory doubles.
//!
//! `no_std` by default; the test builds use std.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod device;
pub mod error;
pub mod hid;
pub mod host;
pub mod status;
pub mod storage;

pub use device::{CompositeLayout, Device, DeviceConfig, Register, RestartReason, StringField};
pub use error::{Error, HidError, StoreError, TransportError};
pub use hid::{HidInterface, HidReport, ReportSink};
pub use host::{HidraHost, Transport};
pub use status::Status;
pub use storage::{ConfigStore, MemStore};
