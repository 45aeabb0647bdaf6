// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Startup configuration of the resource system.
//!
//! A [`ResourceConfig`] is built once, usually from a RON file, and handed to
//! the database, the registry and the loaders as an `Arc<ResourceConfig>`.

use crate::resource::ResourceId;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};
use thiserror::Error;

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The contents are not valid RON for this structure.
    #[error("invalid configuration: {0}")]
    Parse(String),
    /// A field holds an unusable value.
    #[error("invalid configuration value for '{field}': {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Settings shared by every component of the resource system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// The storage root scanned by the database.
    pub root: PathBuf,
    /// Human readable name written to the database document.
    pub database_name: String,
    /// Prefix every id derived from a path with `database_name`, so the
    /// database can be mounted next to others in a facade.
    pub mount_ids: bool,
    /// Number of loader worker threads.
    pub worker_threads: usize,
    /// How often the registry re-validates the database, in milliseconds.
    /// Zero disables the check.
    pub staleness_check_interval_ms: u64,
    /// Shader assigned to materials that do not name one.
    pub default_material_shader: ResourceId,
    /// Glyph ranges assigned to fonts that do not declare any.
    pub default_glyph_ranges: Vec<(u32, u32)>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("resources"),
            database_name: "resources".to_string(),
            mount_ids: false,
            worker_threads: 4,
            staleness_check_interval_ms: 5_000,
            default_material_shader: ResourceId::new("engine/shaders/pbr.slang"),
            default_glyph_ranges: vec![(0x20, 0x7e)],
        }
    }
}

impl ResourceConfig {
    /// Default settings rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Parses RON text. Missing fields take their default value.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            ron::de::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a RON file. A relative `root` is resolved against the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_ron_str(&text)?;
        if config.root.is_relative() {
            if let Some(parent) = path.parent() {
                config.root = parent.join(&config.root);
            }
        }
        log::info!("Loaded resource configuration from {}", path.display());
        Ok(config)
    }

    /// Serializes to pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The staleness check interval, `None` when disabled.
    pub fn staleness_check_interval(&self) -> Option<Duration> {
        (self.staleness_check_interval_ms > 0)
            .then(|| Duration::from_millis(self.staleness_check_interval_ms))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "worker_threads",
                reason: "at least one worker is required".to_string(),
            });
        }
        if let Some((first, last)) = self
            .default_glyph_ranges
            .iter()
            .find(|(first, last)| first > last)
        {
            return Err(ConfigError::Invalid {
                field: "default_glyph_ranges",
                reason: format!("range {first:#x}..={last:#x} is reversed"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = ResourceConfig::from_ron_str("(worker_threads: 2)").unwrap();
        assert_eq!(config.worker_threads, 2);
        assert_eq!(config.database_name, "resources");
        assert_eq!(
            config.staleness_check_interval(),
            Some(Duration::from_millis(5_000))
        );
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = ResourceConfig::from_ron_str("(worker_threads: 0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "worker_threads", .. }));
    }

    #[test]
    fn ron_round_trip() {
        let mut config = ResourceConfig::with_root("assets");
        config.staleness_check_interval_ms = 0;
        let text = config.to_ron_string().unwrap();
        let back = ResourceConfig::from_ron_str(&text).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.staleness_check_interval(), None);
    }

    #[test]
    fn load_resolves_relative_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resources.ron");
        fs::write(
            &path,
            "(root: \"content\", database_name: \"game\", mount_ids: true)",
        )
        .unwrap();
        let config = ResourceConfig::load(&path).unwrap();
        assert_eq!(config.root, dir.path().join("content"));
        assert_eq!(config.database_name, "game");
        assert!(config.mount_ids);
    }
}
