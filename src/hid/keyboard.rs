//! Keyboard report (boot protocol layout).
//!
//! Register payload (8 bytes, exact):
//! ```text
//! Byte 0: Modifier keys (bitfield)
//!         Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//!         Bit 2 = Left Alt,   Bit 3 = Left GUI,
//!         Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//!         Bit 6 = Right Alt,  Bit 7 = Right GUI
//! Byte 1: Reserved (0x00)
//! Byte 2-7: Up to 6 simultaneous key codes (0 = no key)
//! ```
//!
//! An emitted report becomes the device's keyboard state until the next
//! report supersedes it; an all-zero report releases every key.

/// Keyboard register payload size in bytes.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Boot-protocol keyboard report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Reserved byte, carried through as received.
    pub reserved: u8,
    /// Up to 6 simultaneously pressed key codes.
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// All-keys-released report.
    pub const fn release_all() -> Self {
        KeyboardReport {
            modifier: 0,
            reserved: 0,
            keycodes: [0; 6],
        }
    }

    /// Decode a register payload. The register accepts exactly 8 bytes;
    /// anything else is a payload-shape error.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        if payload.len() != KEYBOARD_REPORT_SIZE {
            return None;
        }
        let mut keycodes = [0u8; 6];
        keycodes.copy_from_slice(&payload[2..8]);
        Some(KeyboardReport {
            modifier: payload[0],
            reserved: payload[1],
            keycodes,
        })
    }

    /// Encode into the wire payload.
    pub fn to_bytes(&self) -> [u8; KEYBOARD_REPORT_SIZE] {
        let mut out = [0u8; KEYBOARD_REPORT_SIZE];
        out[0] = self.modifier;
        out[1] = self.reserved;
        out[2..8].copy_from_slice(&self.keycodes);
        out
    }

    /// Add a key code to the first free slot. Returns `false` when all
    /// six slots are taken (the key is dropped, not rolled over).
    pub fn press(&mut self, keycode: u8) -> bool {
        if keycode == 0 || self.keycodes.contains(&keycode) {
            return true;
        }
        match self.keycodes.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => {
                *slot = keycode;
                true
            }
            None => false,
        }
    }

    /// `true` when no keys and no modifiers are held.
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }
}
