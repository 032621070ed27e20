//! YAML-backed configuration store with atomic writes.
//!
//! The store owns one in-memory [`AppConfig`] behind a mutex and the YAML file
//! it was loaded from. Mutations go through [`ConfigStore::apply_patch`]:
//! deep-merge, re-deserialize, validate, write to a temp file, rename over the
//! original, and only then swap the in-memory copy. A failure at any step
//! leaves both disk and memory unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::schema::{AppConfig, validate};

/// Durable configuration store. Cheap to share behind an `Arc`; all methods
/// take `&self`.
pub struct ConfigStore {
    path: PathBuf,
    current: Mutex<AppConfig>,
}

impl ConfigStore {
    /// Load configuration from a YAML file. A missing file is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: AppConfig =
            serde_yaml::from_str(&text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        validate(&config)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(Self {
            path,
            current: Mutex::new(config),
        })
    }

    /// Return an immutable snapshot of the current configuration.
    pub fn snapshot(&self) -> AppConfig {
        self.current.lock().clone()
    }

    /// Path of the backing YAML file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply a partial patch, validate the result, and persist it atomically.
    /// Nested objects merge key by key; scalars, arrays, and nulls replace the
    /// existing value. Returns the full configuration after the patch.
    pub fn apply_patch(&self, patch: &Value) -> Result<AppConfig, ConfigError> {
        if !patch.is_object() {
            return Err(ConfigError::Patch(
                "patch body must be a JSON object".to_string(),
            ));
        }

        let mut guard = self.current.lock();
        let mut merged = serde_json::to_value(&*guard)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        merge_value(&mut merged, patch);
        let candidate: AppConfig = serde_json::from_value(merged)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        validate(&candidate)?;
        self.write_atomic(&candidate)?;
        *guard = candidate.clone();
        debug!("configuration patch applied and persisted");
        Ok(candidate)
    }

    /// Serialize to YAML and replace the config file via temp-file-then-rename.
    fn write_atomic(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let text =
            serde_yaml::to_string(config).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        let temp_path = self.path.with_extension("yaml.tmp");
        fs::write(&temp_path, text).map_err(|source| ConfigError::Write {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            ConfigError::Write {
                path: self.path.clone(),
                source,
            }
        })
    }
}

/// Recursive deep merge: objects merge per key, everything else replaces.
fn merge_value(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match target_map.get_mut(key) {
                    Some(existing) => merge_value(existing, patch_value),
                    None => {
                        target_map.insert(key.clone(), patch_value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}
