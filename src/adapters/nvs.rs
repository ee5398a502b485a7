//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`CalibrationPort`] for the irrigation controller.
//!
//! - The calibration set is stored as one postcard blob under
//!   `calib::refs`, so a save replaces all three channels at once.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - The simulation backend is an in-memory map (dev/test only).

use crate::app::ports::{CalibrationPort, StorageError};
use crate::calibration::CalibrationSet;
use log::info;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::warn;

const CALIB_NAMESPACE: &str = "calib";
const CALIB_KEY: &str = "refs";

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const MAX_BLOB_SIZE: usize = 256;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(StorageError::IoError)` if flash initialisation fails
    /// unrecoverably.  On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as esp_err_t
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as esp_err_t
            {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK as esp_err_t {
                    return Err(StorageError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK as esp_err_t {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK as esp_err_t {
                return Err(StorageError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = namespace.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK as esp_err_t {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn key_buf(key: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let kb = key.as_bytes();
        let kl = kb.len().min(15);
        buf[..kl].copy_from_slice(&kb[..kl]);
        buf
    }

    /// Raw blob for `key`, `Ok(None)` when absent.
    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let composite = Self::composite_key(CALIB_NAMESPACE, key);
        Ok(self.store.get(&composite).cloned())
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key_buf = Self::key_buf(key);
        let result = Self::with_nvs_handle(CALIB_NAMESPACE, false, |handle| {
            let mut size: usize = 0;

            // First call: get size
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH as esp_err_t);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            Ok(buf)
        });

        match result {
            Ok(bytes) => Ok(Some(bytes)),
            // A namespace that was never written cannot be opened read-only.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND as esp_err_t => Ok(None),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH as esp_err_t => {
                Err(StorageError::Corrupted)
            }
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}", e);
                Err(StorageError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let composite = Self::composite_key(CALIB_NAMESPACE, key);
        self.store.insert(composite, data.to_vec());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let key_buf = Self::key_buf(key);
        let result = Self::with_nvs_handle(CALIB_NAMESPACE, true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    data.as_ptr() as *const _,
                    data.len(),
                )
            };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|e| {
            warn!("NvsAdapter: NVS write error {}", e);
            if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE as esp_err_t {
                StorageError::Full
            } else {
                StorageError::IoError
            }
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn erase_namespace(&mut self) -> Result<(), StorageError> {
        let prefix = format!("{}::", CALIB_NAMESPACE);
        self.store.retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn erase_namespace(&mut self) -> Result<(), StorageError> {
        let result = Self::with_nvs_handle(CALIB_NAMESPACE, true, |handle| {
            let ret = unsafe { nvs_erase_all(handle) };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|e| {
            warn!("NvsAdapter: NVS erase error {}", e);
            StorageError::IoError
        })
    }
}

impl CalibrationPort for NvsAdapter {
    fn load(&self) -> Result<Option<CalibrationSet>, StorageError> {
        let Some(bytes) = self.read_blob(CALIB_KEY)? else {
            info!("NvsAdapter: no stored calibration");
            return Ok(None);
        };
        let set: CalibrationSet =
            postcard::from_bytes(&bytes).map_err(|_| StorageError::Corrupted)?;
        info!("NvsAdapter: loaded calibration ({} bytes)", bytes.len());
        Ok(Some(set))
    }

    fn save(&mut self, set: &CalibrationSet) -> Result<(), StorageError> {
        let bytes = postcard::to_allocvec(set).map_err(|_| StorageError::IoError)?;
        self.write_blob(CALIB_KEY, &bytes)?;
        info!("NvsAdapter: calibration saved ({} bytes)", bytes.len());
        Ok(())
    }

    fn reset(&mut self) -> Result<(), StorageError> {
        self.erase_namespace()?;
        info!("NvsAdapter: calibration erased");
        Ok(())
    }
}
