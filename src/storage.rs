//! Non-volatile configuration storage.
//!
//! The device core only sees the `ConfigStore` trait: a small key-value
//! blob store with the same shape as an NVS namespace. Firmware backs
//! it with flash (`sequential-storage` or the platform NVS); hosts and
//! tests use the in-memory `MemStore`.
//!
//! Values are raw little-endian bytes; the typed helpers keep the
//! encoding in one place.

use crate::error::StoreError;
use heapless::{FnvIndexMap, String, Vec};

/// Longest key the store accepts (the NVS keys are all shorter).
pub const MAX_KEY_LENGTH: usize = 16;

/// Largest value blob: one USB string (63 bytes content + NUL).
pub const MAX_VALUE_LENGTH: usize = 64;

/// Distinct keys the device persists. Must be a power of two for the
/// index-map backing.
pub const MAX_KEYS: usize = 8;

/// Abstract persistence backend for the device configuration.
///
/// `fetch` takes `&mut self` to match flash-backed implementations,
/// which need exclusive access to the peripheral even for reads.
pub trait ConfigStore {
    /// Read the value stored under `key` into `buf`. Returns the value
    /// length, or `None` when the key has never been written.
    fn fetch(&mut self, key: &str, buf: &mut [u8]) -> Result<Option<usize>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    fn persist(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Erase every key (factory reset).
    fn wipe(&mut self) -> Result<(), StoreError>;

    fn fetch_u8(&mut self, key: &str) -> Result<Option<u8>, StoreError> {
        let mut buf = [0u8; 1];
        match self.fetch(key, &mut buf)? {
            Some(1) => Ok(Some(buf[0])),
            _ => Ok(None),
        }
    }

    fn fetch_u16(&mut self, key: &str) -> Result<Option<u16>, StoreError> {
        let mut buf = [0u8; 2];
        match self.fetch(key, &mut buf)? {
            Some(2) => Ok(Some(u16::from_le_bytes(buf))),
            _ => Ok(None),
        }
    }

    fn persist_u8(&mut self, key: &str, value: u8) -> Result<(), StoreError> {
        self.persist(key, &[value])
    }

    fn persist_u16(&mut self, key: &str, value: u16) -> Result<(), StoreError> {
        self.persist(key, &value.to_le_bytes())
    }
}

/// In-memory `ConfigStore` with write-failure injection for tests.
#[derive(Debug, Default)]
pub struct MemStore {
    entries: FnvIndexMap<String<MAX_KEY_LENGTH>, Vec<u8, MAX_VALUE_LENGTH>, MAX_KEYS>,
    fail_writes: bool,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore {
            entries: FnvIndexMap::new(),
            fail_writes: false,
        }
    }

    /// Make every subsequent `persist` fail with `WriteFailed`, the
    /// way a worn-out or unmounted flash would.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigStore for MemStore {
    fn fetch(&mut self, key: &str, buf: &mut [u8]) -> Result<Option<usize>, StoreError> {
        let Ok(key) = String::<MAX_KEY_LENGTH>::try_from(key) else {
            return Ok(None);
        };
        let Some(value) = self.entries.get(&key) else {
            return Ok(None);
        };
        if buf.len() < value.len() {
            return Err(StoreError::CapacityExceeded);
        }
        buf[..value.len()].copy_from_slice(value);
        Ok(Some(value.len()))
    }

    fn persist(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::WriteFailed);
        }
        let key: String<MAX_KEY_LENGTH> =
            String::try_from(key).map_err(|_| StoreError::CapacityExceeded)?;
        let value: Vec<u8, MAX_VALUE_LENGTH> =
            Vec::from_slice(value).map_err(|_| StoreError::CapacityExceeded)?;
        match self.entries.insert(key, value) {
            Ok(_) => Ok(()),
            Err(_) => Err(StoreError::CapacityExceeded),
        }
    }

    fn wipe(&mut self) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::WriteFailed);
        }
        self.entries.clear();
        Ok(())
    }
}
