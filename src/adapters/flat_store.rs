//! Settings file adapter.
//!
//! Implements [`ConfigPort`] over the flat positional settings file (see
//! [`crate::config`]).  On ESP-IDF the file lives on the SPIFFS partition
//! mounted by [`mount_spiffs`]; on the host any directory works.
//!
//! Saves go through a temporary file and a rename so a power cut never
//! leaves a half-written settings file behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::NodeConfig;

/// Where the firmware keeps its settings.
pub const SETTINGS_PATH: &str = "/spiffs/settings.txt";

pub struct FlatFileStore {
    path: PathBuf,
}

impl FlatFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a settings file has ever been saved.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

impl ConfigPort for FlatFileStore {
    fn load(&self) -> Result<NodeConfig, ConfigError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => NodeConfig::from_flat(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Store: no settings file, using defaults");
                Ok(NodeConfig::default())
            }
            Err(e) => {
                warn!("Store: read {} failed: {}", self.path.display(), e);
                Err(ConfigError::IoError)
            }
        }
    }

    fn save(&self, config: &NodeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let tmp = self.temp_path();
        fs::write(&tmp, config.to_flat())
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|e| {
                warn!("Store: write {} failed: {}", self.path.display(), e);
                ConfigError::IoError
            })
    }

    fn erase(&self) -> Result<(), ConfigError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Store: settings erased");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("Store: erase failed: {}", e);
                Err(ConfigError::IoError)
            }
        }
    }
}

/// Mount the SPIFFS partition at `/spiffs`, formatting it on first boot.
#[cfg(target_os = "espidf")]
pub fn mount_spiffs() -> crate::error::Result<()> {
    use esp_idf_svc::sys::{esp, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register};

    use crate::app::ports::StorageError;

    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    esp!(unsafe { esp_vfs_spiffs_register(&conf) }).map_err(|e| {
        log::error!("Store: SPIFFS mount failed: {}", e);
        StorageError::MountFailed
    })?;
    info!("Store: SPIFFS mounted at /spiffs");
    Ok(())
}
