//! Store configuration.

use crate::error::{HashStateError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the in-memory host delivers change notifications.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Listeners run inside the fragment write.
    #[default]
    Synchronous,
    /// Listeners run as a microtask after the current task.
    Microtask,
}

/// Hash state configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashStateConfig {
    /// Max buffered events per subscriber before it is dropped.
    /// Default: 1000
    pub subscription_buffer: usize,

    /// Load the in-memory state from the current fragment when the store
    /// is attached, instead of starting empty.
    pub restore_on_attach: bool,

    /// Notification delivery of `MemoryHost`.
    pub dispatch: DispatchMode,
}

impl Default for HashStateConfig {
    fn default() -> Self {
        Self {
            subscription_buffer: 1000,
            restore_on_attach: false,
            dispatch: DispatchMode::Synchronous,
        }
    }
}

impl HashStateConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.subscription_buffer == 0 {
            return Err(HashStateError::Config(
                "subscription_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = HashStateConfig::from_json_str("{}").unwrap();
        assert_eq!(config, HashStateConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config =
            HashStateConfig::from_json_str(r#"{"restore_on_attach": true, "dispatch": "microtask"}"#)
                .unwrap();
        assert!(config.restore_on_attach);
        assert_eq!(config.dispatch, DispatchMode::Microtask);
        assert_eq!(config.subscription_buffer, 1000);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let result = HashStateConfig::from_json_str(r#"{"subscription_buffer": 0}"#);
        assert!(matches!(result, Err(HashStateError::Config(_))));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = HashStateConfig::from_json_str("{not json");
        assert!(matches!(result, Err(HashStateError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"subscription_buffer": 16}}"#).unwrap();

        let config = HashStateConfig::load(file.path()).unwrap();
        assert_eq!(config.subscription_buffer, 16);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = HashStateConfig::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(HashStateError::Io(_))));
    }
}
