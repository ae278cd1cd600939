//! Build configuration
//!
//! Settings that can be serialized and loaded from RON files.

use std::path::Path;

use pcad_kernel::CsgKernelConfig;
use pcad_kernel::constants::{DEFAULT_SAMPLE_RESOLUTION, DEFAULT_TOLERANCE};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::shape_list::DEFAULT_GROUP_DIGITS;

/// Tolerances and sampling used by a build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Linear tolerance for geometric comparisons
    pub tolerance: f64,
    /// Decimal places kept when grouping shapes by a key
    pub group_digits: u32,
    /// Samples per axis used by the reference kernel to measure boolean results
    pub sample_resolution: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            group_digits: DEFAULT_GROUP_DIGITS,
            sample_resolution: DEFAULT_SAMPLE_RESOLUTION,
        }
    }
}

impl BuildConfig {
    /// Tight tolerance and dense sampling
    pub fn precise() -> Self {
        Self {
            tolerance: 1e-9,
            group_digits: 9,
            sample_resolution: 128,
        }
    }

    /// Loose tolerance and sparse sampling, for quick previews
    pub fn coarse() -> Self {
        Self {
            tolerance: 1e-4,
            group_digits: 3,
            sample_resolution: 16,
        }
    }

    /// Kernel settings derived from this configuration
    pub fn kernel_config(&self) -> CsgKernelConfig {
        CsgKernelConfig {
            resolution: self.sample_resolution,
            tolerance: self.tolerance,
        }
    }

    /// Parse a configuration from RON text
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Serialize this configuration as pretty RON
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = self.to_ron_string()?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ron_round_trip() {
        let config = BuildConfig::coarse();
        let text = config.to_ron_string().unwrap();
        assert_eq!(BuildConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = BuildConfig::from_ron_str("(tolerance: 0.001)").unwrap();
        assert_eq!(config.tolerance, 0.001);
        assert_eq!(config.group_digits, DEFAULT_GROUP_DIGITS);
        assert_eq!(config.sample_resolution, DEFAULT_SAMPLE_RESOLUTION);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.ron");
        let config = BuildConfig::precise();
        config.save(&path).unwrap();
        assert_eq!(BuildConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BuildConfig::load(dir.path().join("missing.ron"));
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_kernel_config_follows_build_config() {
        let kernel = BuildConfig::coarse().kernel_config();
        assert_eq!(kernel.resolution, 16);
        assert_eq!(kernel.tolerance, 1e-4);
    }
}
