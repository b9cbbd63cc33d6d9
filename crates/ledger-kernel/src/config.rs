//! Ledger configuration
//!
//! Defaults suit tests and the CLI; deployments load a TOML file:
//!
//! ```toml
//! max_batch_size = 64
//! progress_interval = 5
//! enforce_record_authority = false
//! enabled_operations = ["add", "subtract"]
//! ```

use crate::error::ConfigError;
use crate::operation::OperationKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Limits and policies enforced by the batch processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Largest batch accepted in one invocation
    pub max_batch_size: usize,
    /// Emit a progress event every N operations
    pub progress_interval: usize,
    /// Require the batch authority to control every referenced record
    pub enforce_record_authority: bool,
    /// Operation kinds accepted by the processor
    pub enabled_operations: Vec<OperationKind>,
}

impl LedgerConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the largest accepted batch
    #[inline]
    #[must_use]
    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max;
        self
    }

    /// Set how often progress is logged
    #[inline]
    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Require signers to control the records they change
    #[inline]
    #[must_use]
    pub fn with_record_authority(mut self, enforce: bool) -> Self {
        self.enforce_record_authority = enforce;
        self
    }

    /// Replace the accepted operation kinds
    #[must_use]
    pub fn with_enabled_operations(mut self, kinds: impl IntoIterator<Item = OperationKind>) -> Self {
        self.enabled_operations = kinds.into_iter().collect();
        self
    }

    /// Whether `kind` is accepted
    pub fn is_enabled(&self, kind: OperationKind) -> bool {
        self.enabled_operations.contains(&kind)
    }

    /// Reject settings under which no batch could succeed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::Invalid("max_batch_size must be positive".to_string()));
        }
        if self.progress_interval == 0 {
            return Err(ConfigError::Invalid("progress_interval must be positive".to_string()));
        }
        if self.enabled_operations.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one operation kind must be enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate TOML
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 64,
            progress_interval: 5,
            enforce_record_authority: false,
            enabled_operations: OperationKind::ALL.to_vec(),
        }
    }
}
