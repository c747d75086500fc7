//! Unified error types for the collaborator layer.
//!
//! These errors never cross the bus: the register protocol reports all
//! device-side failures in-band through the status bitmask. What lives
//! here is the other failure layer - the transport call itself, the
//! storage backend, the USB stack - which a host or firmware sees as a
//! failed `Result`, not as a status bit.
//!
//! All variants carry only fixed-size data (no `alloc`).

/// Top-level error type used across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The bus transaction itself failed (not a protocol-level status).
    Transport(TransportError),

    /// Non-volatile storage backend failed.
    Store(StoreError),

    /// The USB HID stack refused the report.
    Hid(HidError),

    /// Host-side guard: report payload outside `1..=MAX_REPORT_SIZE`.
    ReportTooLong,

    /// Host-side guard: USB string longer than `MAX_STRING_LENGTH`.
    StringTooLong,
}

/// Failures of the byte-oriented bus transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// No device acknowledged the address.
    AddressNack,
    /// Transaction started but the bus errored mid-transfer.
    Bus,
    /// The adapter gave up waiting.
    Timeout,
}

/// Failures of the non-volatile configuration store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Write could not be committed.
    WriteFailed,
    /// No space left for the value.
    CapacityExceeded,
}

/// Failures of the HID report sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidError {
    /// Endpoint not ready (host not enumerated or queue full).
    NotReady,
    /// USB session gone.
    Disconnected,
}

// Convenience conversions

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Error::Store(e)
    }
}

impl From<HidError> for Error {
    fn from(e: HidError) -> Self {
        Error::Hid(e)
    }
}
