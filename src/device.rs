//! Device-side protocol core.
//!
//! One `Device` owns everything a bus write can touch: the persisted
//! configuration, the status accumulator, the report sink and the
//! session state. The dispatcher processes one transaction at a time -
//! validate, handle, record the outcome - and never fails out-of-band:
//! the status register is the only error channel the bus offers.
//!
//! Identity and address changes persist first, then park the session in
//! `RestartPending`. A pending device drops every frame until the
//! supervisor completes the restart, which reloads the configuration
//! from storage; the old bus identity is dead from the host's point of
//! view the moment the write is accepted.

use crate::config::{
    DEFAULT_BUS_ADDR, DEFAULT_COMPOSITE_LAYOUT, DEFAULT_MANUFACTURER, DEFAULT_PRODUCT,
    DEFAULT_SERIAL, DEFAULT_USB_PID, DEFAULT_USB_VID, MAX_REPORT_SIZE, MAX_STRING_LENGTH,
    NVS_KEY_BUS_ADDR, NVS_KEY_COMPOSITE_LAYOUT, NVS_KEY_MANUFACTURER, NVS_KEY_PRODUCT,
    NVS_KEY_SERIAL, NVS_KEY_USB_PID, NVS_KEY_USB_VID, REG_CONFIG_BUS_ADDR, REG_CONFIG_COMPOSITE,
    REG_CONFIG_MANUFACTURER, REG_CONFIG_PRODUCT, REG_CONFIG_SERIAL, REG_CONFIG_USB_IDS,
    REG_GAMEPAD, REG_KEYBOARD, REG_MOUSE, REG_STATUS,
};
use crate::error::StoreError;
use crate::hid::{HidInterface, HidReport, ReportSink};
use crate::status::{Status, StatusRegister};
use crate::storage::{ConfigStore, MAX_VALUE_LENGTH};
use heapless::String;

/// The closed set of writable registers.
///
/// Dispatch is a total function over this enum plus an unknown
/// fallback; there is no dynamic handler registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// HID report for one of the composite interfaces.
    Report(HidInterface),
    /// USB VID/PID reconfiguration.
    UsbIds,
    /// One of the USB descriptor strings.
    UsbString(StringField),
    /// Composite-device interface bitmap.
    CompositeLayout,
    /// The device's own bus address.
    BusAddress,
}

impl Register {
    /// Look up a register index. `None` for anything outside the known
    /// set - including `REG_STATUS`, which is read-only and not a
    /// write target.
    pub const fn from_index(index: u8) -> Option<Register> {
        match index {
            REG_KEYBOARD => Some(Register::Report(HidInterface::Keyboard)),
            REG_MOUSE => Some(Register::Report(HidInterface::Mouse)),
            REG_GAMEPAD => Some(Register::Report(HidInterface::Gamepad)),
            REG_CONFIG_USB_IDS => Some(Register::UsbIds),
            REG_CONFIG_MANUFACTURER => Some(Register::UsbString(StringField::Manufacturer)),
            REG_CONFIG_PRODUCT => Some(Register::UsbString(StringField::Product)),
            REG_CONFIG_SERIAL => Some(Register::UsbString(StringField::Serial)),
            REG_CONFIG_COMPOSITE => Some(Register::CompositeLayout),
            REG_CONFIG_BUS_ADDR => Some(Register::BusAddress),
            _ => None,
        }
    }
}

/// Which USB descriptor string a register write targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StringField {
    Manufacturer,
    Product,
    Serial,
}

impl StringField {
    pub const fn register_index(self) -> u8 {
        match self {
            StringField::Manufacturer => REG_CONFIG_MANUFACTURER,
            StringField::Product => REG_CONFIG_PRODUCT,
            StringField::Serial => REG_CONFIG_SERIAL,
        }
    }
}

/// The composite-device interface bitmap.
///
/// Bits beyond the three dispatchable interfaces (joystick, consumer,
/// pen, touch) are carried for forward compatibility but have no
/// report register in this protocol revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompositeLayout(u16);

impl CompositeLayout {
    pub const fn from_bits(bits: u16) -> Self {
        CompositeLayout(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Is the interface enabled for enumeration and report emission?
    pub const fn enables(self, interface: HidInterface) -> bool {
        self.0 & interface.layout_bit() != 0
    }
}

impl Default for CompositeLayout {
    fn default() -> Self {
        CompositeLayout(DEFAULT_COMPOSITE_LAYOUT)
    }
}

/// Why a restart is pending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RestartReason {
    /// USB identity changed (IDs, strings or layout); the device must
    /// re-enumerate.
    Identity,
    /// The bus address changed; the device must re-join the bus.
    BusAddress,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Session {
    Active,
    RestartPending(RestartReason),
}

/// Everything the device persists across restarts.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    pub bus_address: u8,
    pub usb_vid: u16,
    pub usb_pid: u16,
    pub manufacturer: String<MAX_STRING_LENGTH>,
    pub product: String<MAX_STRING_LENGTH>,
    pub serial: String<MAX_STRING_LENGTH>,
    pub layout: CompositeLayout,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            bus_address: DEFAULT_BUS_ADDR,
            usb_vid: DEFAULT_USB_VID,
            usb_pid: DEFAULT_USB_PID,
            manufacturer: default_string(DEFAULT_MANUFACTURER),
            product: default_string(DEFAULT_PRODUCT),
            serial: default_string(DEFAULT_SERIAL),
            layout: CompositeLayout::default(),
        }
    }
}

fn default_string(s: &str) -> String<MAX_STRING_LENGTH> {
    String::try_from(s).unwrap_or_default()
}

impl DeviceConfig {
    /// Load from the store, falling back to factory defaults for any
    /// key that is missing or unreadable.
    pub fn load<C: ConfigStore>(store: &mut C) -> Self {
        let mut config = DeviceConfig::default();
        if let Ok(Some(addr)) = store.fetch_u8(NVS_KEY_BUS_ADDR) {
            config.bus_address = addr;
        }
        if let Ok(Some(vid)) = store.fetch_u16(NVS_KEY_USB_VID) {
            config.usb_vid = vid;
        }
        if let Ok(Some(pid)) = store.fetch_u16(NVS_KEY_USB_PID) {
            config.usb_pid = pid;
        }
        if let Ok(Some(bits)) = store.fetch_u16(NVS_KEY_COMPOSITE_LAYOUT) {
            config.layout = CompositeLayout::from_bits(bits);
        }
        load_string(store, NVS_KEY_MANUFACTURER, &mut config.manufacturer);
        load_string(store, NVS_KEY_PRODUCT, &mut config.product);
        load_string(store, NVS_KEY_SERIAL, &mut config.serial);
        config
    }

    /// Persist every key. Not atomic: a mid-save failure leaves the
    /// store partially updated, which the caller reports as a write
    /// failure without applying the new config in memory.
    pub fn save<C: ConfigStore>(&self, store: &mut C) -> Result<(), StoreError> {
        store.persist_u8(NVS_KEY_BUS_ADDR, self.bus_address)?;
        store.persist_u16(NVS_KEY_USB_VID, self.usb_vid)?;
        store.persist_u16(NVS_KEY_USB_PID, self.usb_pid)?;
        store.persist_u16(NVS_KEY_COMPOSITE_LAYOUT, self.layout.bits())?;
        store.persist(NVS_KEY_MANUFACTURER, self.manufacturer.as_bytes())?;
        store.persist(NVS_KEY_PRODUCT, self.product.as_bytes())?;
        store.persist(NVS_KEY_SERIAL, self.serial.as_bytes())?;
        Ok(())
    }
}

fn load_string<C: ConfigStore>(store: &mut C, key: &str, slot: &mut String<MAX_STRING_LENGTH>) {
    let mut buf = [0u8; MAX_VALUE_LENGTH];
    let Ok(Some(len)) = store.fetch(key, &mut buf) else {
        return;
    };
    let Ok(text) = core::str::from_utf8(&buf[..len]) else {
        return;
    };
    if let Ok(value) = String::try_from(text) {
        *slot = value;
    }
}

/// The protocol state machine behind the bus slave.
pub struct Device<S: ReportSink, C: ConfigStore> {
    sink: S,
    store: C,
    config: DeviceConfig,
    status: StatusRegister,
    session: Session,
}

impl<S: ReportSink, C: ConfigStore> Device<S, C> {
    /// Boot the device: load persisted configuration (defaults where
    /// absent) and start with the baseline status.
    pub fn new(sink: S, mut store: C) -> Self {
        let config = DeviceConfig::load(&mut store);
        Device {
            sink,
            store,
            config,
            status: StatusRegister::new(),
            session: Session::Active,
        }
    }

    /// Process one addressed bus write, `[register][payload...]`.
    ///
    /// Returns `Some(byte)` when the frame was a status-read request
    /// and the device has a reply to clock out. A 1-byte frame naming
    /// any other register is ignored without a status change; so is an
    /// empty frame. While a restart is pending every frame is dropped.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Option<u8> {
        if matches!(self.session, Session::RestartPending(_)) {
            return None;
        }
        let (&register, payload) = frame.split_first()?;
        if register == REG_STATUS && payload.is_empty() {
            return Some(self.read_status());
        }
        if !payload.is_empty() {
            self.dispatch(register, payload);
        }
        None
    }

    /// Dispatch one transaction and record its outcome.
    ///
    /// Never panics and has no out-of-band error path: the returned
    /// outcome (also merged into the status register) is the whole
    /// story. At most one handler runs per call.
    pub fn dispatch(&mut self, register: u8, payload: &[u8]) -> Status {
        let outcome = self.execute(register, payload);
        self.status.merge(outcome);
        outcome
    }

    fn execute(&mut self, register: u8, payload: &[u8]) -> Status {
        let Some(register) = Register::from_index(register) else {
            return Status::UNKNOWN_REGISTER;
        };
        if payload.len() > MAX_REPORT_SIZE {
            return Status::PAYLOAD_TOO_LARGE;
        }
        match register {
            Register::Report(interface) => self.emit_report(interface, payload),
            Register::UsbIds => self.configure_usb_ids(payload),
            Register::UsbString(field) => self.configure_usb_string(field, payload),
            Register::CompositeLayout => self.configure_composite_layout(payload),
            Register::BusAddress => self.configure_bus_address(payload),
        }
    }

    /// Destructive status read: hand the accumulated mask to the host
    /// and reset to the baseline.
    pub fn read_status(&mut self) -> u8 {
        self.status.read().bits()
    }

    /// The address the device currently answers on.
    pub fn bus_address(&self) -> u8 {
        self.config.bus_address
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn store_mut(&mut self) -> &mut C {
        &mut self.store
    }

    /// `Some(reason)` once a configuration write has committed and the
    /// device is waiting for its supervisor to reboot it.
    pub fn pending_restart(&self) -> Option<RestartReason> {
        match self.session {
            Session::Active => None,
            Session::RestartPending(reason) => Some(reason),
        }
    }

    /// Finish a reboot: reload configuration from storage, reset the
    /// status register to the boot baseline and re-activate the
    /// session. Pending reports and unread status are gone.
    pub fn complete_restart(&mut self) {
        self.config = DeviceConfig::load(&mut self.store);
        self.status.reset();
        self.session = Session::Active;
    }

    /// Wipe persisted configuration and reboot with factory defaults.
    pub fn factory_reset(&mut self) -> Result<(), StoreError> {
        self.store.wipe()?;
        self.config = DeviceConfig::default();
        self.status.reset();
        self.session = Session::Active;
        Ok(())
    }

    // Handlers. Each returns the transaction outcome; the dispatcher
    // does the merging.

    fn emit_report(&mut self, interface: HidInterface, payload: &[u8]) -> Status {
        // A disabled interface makes the payload shape irrelevant.
        if !self.config.layout.enables(interface) {
            return Status::INTERFACE_DISABLED;
        }
        let Some(report) = HidReport::decode(interface, payload) else {
            return Status::PAYLOAD_TOO_LARGE;
        };
        let mut buf = [0u8; MAX_REPORT_SIZE];
        let len = report.encode(&mut buf);
        match self.sink.publish(interface, &buf[..len]) {
            Ok(()) => Status::OK,
            // No status code exists for a sink failure; the host sees
            // the missing OK bit.
            Err(_) => Status::NONE,
        }
    }

    fn configure_usb_ids(&mut self, payload: &[u8]) -> Status {
        let &[vid_lo, vid_hi, pid_lo, pid_hi] = payload else {
            return Status::PAYLOAD_TOO_LARGE;
        };
        let mut next = self.config.clone();
        next.usb_vid = u16::from_le_bytes([vid_lo, vid_hi]);
        next.usb_pid = u16::from_le_bytes([pid_lo, pid_hi]);
        self.commit_config(next, RestartReason::Identity)
    }

    fn configure_usb_string(&mut self, field: StringField, payload: &[u8]) -> Status {
        // A single trailing NUL is part of the wire encoding, not the
        // string.
        let content = match payload.split_last() {
            Some((&0, rest)) => rest,
            _ => payload,
        };
        if content.len() > MAX_STRING_LENGTH {
            return Status::PAYLOAD_TOO_LARGE;
        }
        let Ok(text) = core::str::from_utf8(content) else {
            return Status::PAYLOAD_TOO_LARGE;
        };
        let Ok(value) = String::try_from(text) else {
            return Status::PAYLOAD_TOO_LARGE;
        };
        let mut next = self.config.clone();
        match field {
            StringField::Manufacturer => next.manufacturer = value,
            StringField::Product => next.product = value,
            StringField::Serial => next.serial = value,
        }
        self.commit_config(next, RestartReason::Identity)
    }

    fn configure_composite_layout(&mut self, payload: &[u8]) -> Status {
        let &[lo, hi] = payload else {
            return Status::PAYLOAD_TOO_LARGE;
        };
        let mut next = self.config.clone();
        next.layout = CompositeLayout::from_bits(u16::from_le_bytes([lo, hi]));
        self.commit_config(next, RestartReason::Identity)
    }

    fn configure_bus_address(&mut self, payload: &[u8]) -> Status {
        let &[address] = payload else {
            return Status::PAYLOAD_TOO_LARGE;
        };
        let mut next = self.config.clone();
        next.bus_address = address;
        self.commit_config(next, RestartReason::BusAddress)
    }

    /// Persist-then-restart: the new config is applied and the session
    /// ends only once storage has accepted it.
    fn commit_config(&mut self, next: DeviceConfig, reason: RestartReason) -> Status {
        match next.save(&mut self.store) {
            Ok(()) => {
                self.config = next;
                self.session = Session::RestartPending(reason);
                Status::OK
            }
            Err(_) => Status::NVS_WRITE_FAILED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        LAYOUT_KEYBOARD, LAYOUT_MOUSE, NVS_KEY_USB_VID, REG_CONFIG_BUS_ADDR, REG_CONFIG_USB_IDS,
        REG_KEYBOARD, REG_MOUSE, REG_STATUS,
    };
    use crate::error::HidError;
    use crate::storage::MemStore;

    struct TestSink {
        published: Vec<(HidInterface, Vec<u8>)>,
        fail: bool,
    }

    impl TestSink {
        fn new() -> Self {
            TestSink {
                published: Vec::new(),
                fail: false,
            }
        }
    }

    impl ReportSink for TestSink {
        fn publish(&mut self, interface: HidInterface, report: &[u8]) -> Result<(), HidError> {
            if self.fail {
                return Err(HidError::NotReady);
            }
            self.published.push((interface, report.to_vec()));
            Ok(())
        }
    }

    fn boot() -> Device<TestSink, MemStore> {
        Device::new(TestSink::new(), MemStore::new())
    }

    #[test]
    fn boots_with_defaults_and_baseline_status() {
        let mut device = boot();
        assert_eq!(device.bus_address(), 0x70);
        assert_eq!(device.config().usb_vid, 0x413D);
        assert_eq!(device.read_status(), 0x00);
    }

    #[test]
    fn unknown_register_sets_exactly_that_bit() {
        let mut device = boot();
        let outcome = device.dispatch(0x99, &[0x01]);
        assert_eq!(outcome, Status::UNKNOWN_REGISTER);
        assert!(device.sink().published.is_empty());
        assert_eq!(device.read_status(), 0x02);
    }

    #[test]
    fn status_register_is_not_a_write_target() {
        let mut device = boot();
        assert_eq!(device.dispatch(REG_STATUS, &[0x00]), Status::UNKNOWN_REGISTER);
    }

    #[test]
    fn oversized_payload_never_reaches_a_handler() {
        let mut device = boot();
        let payload = [0u8; 65];
        let outcome = device.dispatch(REG_KEYBOARD, &payload);
        assert_eq!(outcome, Status::PAYLOAD_TOO_LARGE);
        assert!(device.sink().published.is_empty());
    }

    #[test]
    fn keyboard_report_publishes_and_sets_ok() {
        let mut device = boot();
        let payload = [0, 0, 0x04, 0, 0, 0, 0, 0];
        assert_eq!(device.dispatch(REG_KEYBOARD, &payload), Status::OK);
        assert_eq!(
            device.sink().published,
            vec![(HidInterface::Keyboard, payload.to_vec())]
        );
        assert_eq!(device.read_status(), 0x01);
    }

    #[test]
    fn mouse_report_keeps_signed_deltas() {
        let mut device = boot();
        assert_eq!(device.dispatch(REG_MOUSE, &[0, 10, 246, 0]), Status::OK);
        let (interface, bytes) = &device.sink().published[0];
        assert_eq!(*interface, HidInterface::Mouse);
        assert_eq!(bytes[1] as i8, 10);
        assert_eq!(bytes[2] as i8, -10);
    }

    #[test]
    fn wrong_shape_is_a_payload_error() {
        let mut device = boot();
        // Undersized and oversized both land on the same bit; the
        // mask has exactly one payload-shape error.
        assert_eq!(
            device.dispatch(REG_KEYBOARD, &[0; 7]),
            Status::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            device.dispatch(REG_MOUSE, &[0; 5]),
            Status::PAYLOAD_TOO_LARGE
        );
        assert!(device.sink().published.is_empty());
    }

    #[test]
    fn disabled_interface_wins_over_shape() {
        let (sink, mut store) = (TestSink::new(), MemStore::new());
        // Keyboard+mouse only; gamepad bit off.
        store
            .persist_u16(
                crate::config::NVS_KEY_COMPOSITE_LAYOUT,
                LAYOUT_KEYBOARD | LAYOUT_MOUSE,
            )
            .unwrap();
        let mut device = Device::new(sink, store);
        // Even a well-formed report is refused, and a malformed one
        // reports the interface error, not the shape error.
        assert_eq!(
            device.dispatch(crate::config::REG_GAMEPAD, &[0; 6]),
            Status::INTERFACE_DISABLED
        );
        assert_eq!(
            device.dispatch(crate::config::REG_GAMEPAD, &[0; 3]),
            Status::INTERFACE_DISABLED
        );
        assert!(device.sink().published.is_empty());
    }

    #[test]
    fn sink_failure_withholds_ok_without_error_bit() {
        let mut device = boot();
        device.sink.fail = true;
        let outcome = device.dispatch(REG_KEYBOARD, &[0; 8]);
        assert_eq!(outcome, Status::NONE);
        assert_eq!(device.read_status(), 0x00);
    }

    #[test]
    fn same_report_twice_is_ok_both_times() {
        let mut device = boot();
        let payload = [0, 0, 0x04, 0, 0, 0, 0, 0];
        assert_eq!(device.dispatch(REG_KEYBOARD, &payload), Status::OK);
        assert_eq!(device.dispatch(REG_KEYBOARD, &payload), Status::OK);
        // No unrelated bits accumulated.
        assert_eq!(device.read_status(), 0x01);
        assert_eq!(device.sink().published.len(), 2);
    }

    #[test]
    fn outcomes_accumulate_until_read() {
        let mut device = boot();
        device.dispatch(REG_KEYBOARD, &[0; 8]);
        device.dispatch(0x99, &[0x01]);
        assert_eq!(device.read_status(), 0x01 | 0x02);
        assert_eq!(device.read_status(), 0x00);
    }

    #[test]
    fn usb_ids_persist_then_restart() {
        let mut device = boot();
        // VID 0x1234, PID 0x5678, little-endian.
        let outcome = device.dispatch(REG_CONFIG_USB_IDS, &[0x34, 0x12, 0x78, 0x56]);
        assert_eq!(outcome, Status::OK);
        assert_eq!(device.pending_restart(), Some(RestartReason::Identity));
        assert_eq!(device.config().usb_vid, 0x1234);

        device.complete_restart();
        assert_eq!(device.pending_restart(), None);
        // Survived the reboot via storage.
        assert_eq!(device.config().usb_vid, 0x1234);
        assert_eq!(device.config().usb_pid, 0x5678);
        assert_eq!(device.read_status(), 0x00);
    }

    #[test]
    fn usb_ids_wrong_length_does_not_restart() {
        let mut device = boot();
        assert_eq!(
            device.dispatch(REG_CONFIG_USB_IDS, &[0x34, 0x12]),
            Status::PAYLOAD_TOO_LARGE
        );
        assert_eq!(device.pending_restart(), None);
        assert_eq!(device.config().usb_vid, 0x413D);
    }

    #[test]
    fn persistence_failure_keeps_old_identity() {
        let mut device = boot();
        device.store_mut().fail_writes(true);
        let outcome = device.dispatch(REG_CONFIG_USB_IDS, &[0x34, 0x12, 0x78, 0x56]);
        assert_eq!(outcome, Status::NVS_WRITE_FAILED);
        assert_eq!(device.pending_restart(), None);
        assert_eq!(device.config().usb_vid, 0x413D);
        assert_eq!(device.read_status(), 0x10);
    }

    #[test]
    fn address_change_moves_the_device() {
        let mut device = boot();
        assert_eq!(device.dispatch(REG_CONFIG_BUS_ADDR, &[0x42]), Status::OK);
        assert_eq!(device.pending_restart(), Some(RestartReason::BusAddress));
        device.complete_restart();
        assert_eq!(device.bus_address(), 0x42);
    }

    #[test]
    fn composite_layout_change_disables_interfaces_after_restart() {
        let mut device = boot();
        let outcome = device.dispatch(
            crate::config::REG_CONFIG_COMPOSITE,
            &(LAYOUT_KEYBOARD).to_le_bytes(),
        );
        assert_eq!(outcome, Status::OK);
        device.complete_restart();
        assert!(device.config().layout.enables(HidInterface::Keyboard));
        assert!(!device.config().layout.enables(HidInterface::Mouse));
        assert_eq!(
            device.dispatch(REG_MOUSE, &[0; 4]),
            Status::INTERFACE_DISABLED
        );
    }

    #[test]
    fn usb_string_strips_trailing_nul() {
        let mut device = boot();
        let outcome = device.dispatch(crate::config::REG_CONFIG_PRODUCT, b"Custom HID\0");
        assert_eq!(outcome, Status::OK);
        device.complete_restart();
        assert_eq!(device.config().product.as_str(), "Custom HID");
    }

    #[test]
    fn usb_string_rejects_invalid_utf8() {
        let mut device = boot();
        assert_eq!(
            device.dispatch(crate::config::REG_CONFIG_MANUFACTURER, &[0xFF, 0xFE, 0x00]),
            Status::PAYLOAD_TOO_LARGE
        );
        assert_eq!(device.pending_restart(), None);
    }

    #[test]
    fn usb_string_accepts_full_64_byte_payload() {
        let mut device = boot();
        // 63 content bytes plus NUL: the largest frame a register
        // accepts, pinning the MAX_REPORT_SIZE boundary.
        let mut payload = [b'x'; 64];
        payload[63] = 0;
        assert_eq!(
            device.dispatch(crate::config::REG_CONFIG_SERIAL, &payload),
            Status::OK
        );
        device.complete_restart();
        assert_eq!(device.config().serial.len(), 63);
    }

    #[test]
    fn usb_string_rejects_64_content_bytes() {
        let mut device = boot();
        let payload = [b'x'; 64]; // no NUL: 64 bytes of content
        assert_eq!(
            device.dispatch(crate::config::REG_CONFIG_SERIAL, &payload),
            Status::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn frames_route_to_dispatch_and_status() {
        let mut device = boot();
        assert_eq!(device.handle_frame(&[]), None);
        // Status read request.
        device.dispatch(0x99, &[0x01]);
        assert_eq!(device.handle_frame(&[REG_STATUS]), Some(0x02));
        assert_eq!(device.handle_frame(&[REG_STATUS]), Some(0x00));
        // 1-byte frame naming a writable register: ignored, no status
        // change.
        assert_eq!(device.handle_frame(&[REG_KEYBOARD]), None);
        assert_eq!(device.handle_frame(&[REG_STATUS]), Some(0x00));
        // Write frame.
        assert_eq!(
            device.handle_frame(&[REG_KEYBOARD, 0, 0, 0x04, 0, 0, 0, 0, 0]),
            None
        );
        assert_eq!(device.handle_frame(&[REG_STATUS]), Some(0x01));
    }

    #[test]
    fn pending_restart_drops_frames() {
        let mut device = boot();
        device.dispatch(REG_CONFIG_BUS_ADDR, &[0x42]);
        assert!(device.pending_restart().is_some());
        // Writes are lost, status reads unanswered.
        assert_eq!(
            device.handle_frame(&[REG_KEYBOARD, 0, 0, 0x04, 0, 0, 0, 0, 0]),
            None
        );
        assert_eq!(device.handle_frame(&[REG_STATUS]), None);
        assert!(device.sink().published.is_empty());
    }

    #[test]
    fn factory_reset_restores_defaults() {
        let mut device = boot();
        device.dispatch(REG_CONFIG_USB_IDS, &[0x34, 0x12, 0x78, 0x56]);
        device.complete_restart();
        assert_eq!(device.config().usb_vid, 0x1234);

        device.factory_reset().unwrap();
        assert_eq!(device.config().usb_vid, 0x413D);
        assert_eq!(device.bus_address(), 0x70);
        // Storage wiped too: a plain restart keeps the defaults.
        device.complete_restart();
        assert_eq!(device.config().usb_vid, 0x413D);
    }

    #[test]
    fn config_load_ignores_corrupt_store_values() {
        let mut store = MemStore::new();
        // A 1-byte blob where a u16 lives.
        store.persist(NVS_KEY_USB_VID, &[0x12]).unwrap();
        let config = DeviceConfig::load(&mut store);
        assert_eq!(config.usb_vid, 0x413D);
    }
}
