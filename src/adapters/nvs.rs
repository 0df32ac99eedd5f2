//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`SettingsPort`] by storing one postcard-encoded
//! [`StoredSettings`] blob under `growlight/settings`.
//!
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`, so
//!   a failed save leaves the previous record in place.
//! - Versioned records: the first byte is the record version.  A record
//!   from an unknown version is ignored rather than misread.
//! - The simulation backend keeps blobs in a `HashMap` (dev/test only).

use core::ffi::CStr;

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::{LoadError, SettingsPort};
use crate::config::Settings;
use crate::error::PersistFailure;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &CStr = c"growlight";
const SETTINGS_KEY: &CStr = c"settings";

/// Current on-flash record layout.
pub const RECORD_VERSION: u8 = 1;

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 64;

/// The settings blob as written to flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSettings {
    pub version: u8,
    pub settings: Settings,
}

impl StoredSettings {
    pub fn current(settings: Settings) -> Self {
        Self {
            version: RECORD_VERSION,
            settings,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, PersistFailure> {
        postcard::to_allocvec(self).map_err(|_| PersistFailure::Encode)
    }

    /// Decode a blob, rejecting records from other firmware versions.
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        match bytes.first() {
            Some(&RECORD_VERSION) => {
                postcard::from_bytes(bytes).map_err(|_| LoadError::Corrupted)
            }
            Some(&other) => Err(LoadError::UnsupportedVersion(other)),
            None => Err(LoadError::Corrupted),
        }
    }
}

pub struct NvsSettingsStore {
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsSettingsStore {
    /// Initialise NVS flash and open the settings store.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, PersistFailure> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                let ret = unsafe { nvs_flash_erase() };
                if ret != ESP_OK {
                    return Err(PersistFailure::Io(ret));
                }
                let ret = unsafe { nvs_flash_init() };
                if ret != ESP_OK {
                    return Err(PersistFailure::Io(ret));
                }
            } else if ret != ESP_OK {
                return Err(PersistFailure::Io(ret));
            }
            info!("NvsSettingsStore: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsSettingsStore: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &CStr, key: &CStr) -> String {
        format!("{}::{}", namespace.to_string_lossy(), key.to_string_lossy())
    }

    /// Place raw bytes in the settings slot (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn insert_raw(&mut self, bytes: &[u8]) {
        self.store
            .insert(Self::composite_key(NAMESPACE, SETTINGS_KEY), bytes.to_vec());
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &CStr, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(namespace.as_ptr(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, i32> {
        let result = Self::with_nvs_handle(NAMESPACE, false, |handle| {
            let mut size: usize = 0;

            // First call: get size
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    SETTINGS_KEY.as_ptr(),
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Ok(Vec::new());
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    SETTINGS_KEY.as_ptr(),
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(buf)
        });

        match result {
            Ok(bytes) => Ok(Some(bytes)),
            // A fresh partition has no namespace yet either.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, i32> {
        Ok(self
            .store
            .get(&Self::composite_key(NAMESPACE, SETTINGS_KEY))
            .cloned())
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), PersistFailure> {
        let result = Self::with_nvs_handle(NAMESPACE, true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    SETTINGS_KEY.as_ptr(),
                    bytes.as_ptr() as *const _,
                    bytes.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|e| {
            warn!("NvsSettingsStore: NVS write error {}", e);
            if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                PersistFailure::Full
            } else {
                PersistFailure::Io(e)
            }
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), PersistFailure> {
        self.insert_raw(bytes);
        Ok(())
    }
}

impl SettingsPort for NvsSettingsStore {
    fn load_saved(&self) -> Result<Option<Settings>, LoadError> {
        let Some(bytes) = self.read_blob().map_err(LoadError::Io)? else {
            info!("NvsSettingsStore: no stored settings");
            return Ok(None);
        };
        let record = StoredSettings::decode(&bytes)?;
        info!("NvsSettingsStore: loaded settings ({} bytes)", bytes.len());
        Ok(Some(record.settings))
    }

    fn save(&mut self, settings: &Settings) -> Result<(), PersistFailure> {
        let bytes = StoredSettings::current(*settings).encode()?;
        self.write_blob(&bytes)?;
        info!("NvsSettingsStore: settings saved ({} bytes)", bytes.len());
        Ok(())
    }
}
