//! JSON settings file adapter.
//!
//! Implements [`ConfigPort`] over a single JSON document on a filesystem.
//! On ESP-IDF the file lives on a SPIFFS partition mounted by
//! [`mount_storage`]; on the host it is any path (tests use a temp dir).
//!
//! - Validation: every field is range-checked before persistence.
//! - Atomic writes: the document is written to a sibling temp file and
//!   renamed over the old one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::{SystemConfig, validate_config};

/// Mount point of the settings partition on the device.
pub const STORAGE_BASE_PATH: &str = "/spiffs";

/// Default settings file location on the device.
pub const DEFAULT_SETTINGS_PATH: &str = "/spiffs/settings.json";

pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    fn write_atomic(&self, bytes: &[u8]) -> io::Result<()> {
        let tmp = self.temp_path();
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(bytes)?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &self.path)
    }
}

impl ConfigPort for FileSettingsStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let text = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::IoError,
        })?;
        serde_json::from_str(&text).map_err(|e| {
            debug!("Settings parse error in {}: {}", self.path.display(), e);
            ConfigError::Corrupted
        })
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let json = serde_json::to_vec_pretty(config).map_err(|_| ConfigError::Corrupted)?;
        self.write_atomic(&json).map_err(|_| ConfigError::IoError)?;
        info!("Settings saved to {}", self.path.display());
        Ok(())
    }
}

/// Mount the SPIFFS settings partition at [`STORAGE_BASE_PATH`],
/// formatting it on first boot.
#[cfg(target_os = "espidf")]
pub fn mount_storage() -> Result<(), ConfigError> {
    use esp_idf_sys::*;

    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: called once from main() before any file access; the
    // strings are 'static.
    let ret = unsafe { esp_vfs_spiffs_register(&conf) };
    if ret != ESP_OK as i32 {
        log::error!("SPIFFS mount failed (rc={})", ret);
        return Err(ConfigError::IoError);
    }
    info!("SPIFFS mounted at {}", STORAGE_BASE_PATH);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn mount_storage() -> Result<(), ConfigError> {
    info!("Settings storage (sim): using the host filesystem");
    Ok(())
}
