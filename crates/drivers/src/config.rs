use std::path::Path;

use memeify_application::StoragePolicy;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage_root: String,
    pub app_name: String,
    pub scoped_storage: bool,
    pub recovery_supported: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_root: "shared-storage".to_string(),
            app_name: "Memeify".to_string(),
            scoped_storage: true,
            recovery_supported: true,
        }
    }
}

impl AppConfig {
    /// Loads the config file next to the binary, falling back to defaults
    /// when it is absent or malformed.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|error| {
                log::warn!("ignoring malformed config {}: {error}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn policy(&self) -> StoragePolicy {
        if self.scoped_storage {
            StoragePolicy::Scoped {
                recovery_supported: self.recovery_supported,
            }
        } else {
            StoragePolicy::Legacy
        }
    }
}
