//! Run configuration (`wrangle.yaml`).
//!
//! Parses and validates the settings of a pipeline run:
//! - `environment` selects production or testing behaviour
//! - `batch_size` must be positive
//! - `grammar_version`, when set, pins the recipe `#pragma version`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ============================================================================
// Types
// ============================================================================

/// Deployment environment a pipeline runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Testing,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Settings for a recipe run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub environment: Environment,

    /// Rows per batch when streaming input.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Required `#pragma version`, if any.
    #[serde(default)]
    pub grammar_version: Option<String>,
}

fn default_batch_size() -> usize {
    1000
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            batch_size: default_batch_size(),
            grammar_version: None,
        }
    }
}

impl RunConfig {
    /// Configuration used by test helpers.
    pub fn testing() -> Self {
        Self {
            environment: Environment::Testing,
            ..Self::default()
        }
    }
}

// ============================================================================
// Parsing and validation
// ============================================================================

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a run configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RunConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_config(&content)
}

/// Parse a run configuration from a YAML string. Empty input yields defaults.
pub fn parse_config(yaml: &str) -> Result<RunConfig, String> {
    if yaml.trim().is_empty() {
        return Ok(RunConfig::default());
    }
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &RunConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.batch_size == 0 {
        errors.push(ValidationError {
            message: "batch_size must be greater than 0".to_string(),
        });
    }

    if let Some(version) = &config.grammar_version {
        if version.trim().is_empty() {
            errors.push(ValidationError {
                message: "grammar_version must not be empty when set".to_string(),
            });
        }
    }

    errors
}
