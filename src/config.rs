//! Oracle configuration
//!
//! Controls the default contract applied to calls no specification
//! constrains. Loaded from YAML (or JSON, chosen by file extension).
//!
//! ```yaml
//! checked_exception: expected
//! unchecked_exception: error
//! npe_on_null_input: expected
//! npe_on_non_null_input: error
//! oom_exception: invalid
//! sof_exception: invalid
//! flaky_exceptions:
//!   - ConcurrentModificationException
//! ```

use crate::classification::BehaviorType;
use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default-contract policy, one verdict per exception category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OracleConfig {
    /// Verdict for a checked exception escaping the call
    pub checked_exception: BehaviorType,

    /// Verdict for an unchecked exception escaping the call
    pub unchecked_exception: BehaviorType,

    /// Verdict for a null dereference when some argument was null
    pub npe_on_null_input: BehaviorType,

    /// Verdict for a null dereference when no argument was null
    pub npe_on_non_null_input: BehaviorType,

    /// Verdict for running out of memory
    pub oom_exception: BehaviorType,

    /// Verdict for a stack overflow
    pub sof_exception: BehaviorType,

    /// Exception type names whose occurrence is non-deterministic; always
    /// classified invalid
    pub flaky_exceptions: Vec<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            checked_exception: BehaviorType::Expected,
            unchecked_exception: BehaviorType::Expected,
            npe_on_null_input: BehaviorType::Expected,
            npe_on_non_null_input: BehaviorType::Error,
            oom_exception: BehaviorType::Invalid,
            sof_exception: BehaviorType::Invalid,
            flaky_exceptions: Vec::new(),
        }
    }
}

impl OracleConfig {
    /// Parse configuration from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_norway::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_norway::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Parse configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a file; `.json` is read as JSON, anything
    /// else as YAML
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        let problems = config.validate();
        if !problems.is_empty() {
            return Err(Error::Config(format!(
                "{}: {}",
                path.display(),
                problems.join("; ")
            )));
        }
        Ok(config)
    }

    /// Validate configuration, returning human-readable problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        for name in &self.flaky_exceptions {
            if name.trim().is_empty() {
                errors.push("Flaky exception names must not be empty".to_string());
            } else if !seen.insert(name.as_str()) {
                errors.push(format!("Duplicate flaky exception: {}", name));
            }
        }
        errors
    }

    pub fn is_flaky(&self, name: &str) -> bool {
        self.flaky_exceptions.iter().any(|f| f == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let config = OracleConfig::default();
        assert_eq!(config.npe_on_non_null_input, BehaviorType::Error);
        assert_eq!(config.oom_exception, BehaviorType::Invalid);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = OracleConfig::from_yaml("unchecked_exception: error\n").unwrap();
        assert_eq!(config.unchecked_exception, BehaviorType::Error);
        assert_eq!(config.checked_exception, BehaviorType::Expected);
        assert_eq!(config.sof_exception, BehaviorType::Invalid);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = OracleConfig {
            flaky_exceptions: vec!["ConcurrentModificationException".into()],
            ..Default::default()
        };
        let parsed = OracleConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_verdict_rejected() {
        assert!(matches!(
            OracleConfig::from_yaml("oom_exception: maybe\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validate_flaky_names() {
        let config = OracleConfig {
            flaky_exceptions: vec!["A".into(), "".into(), "A".into()],
            ..Default::default()
        };
        let problems = config.validate();
        assert_eq!(problems.len(), 2);
        assert!(problems[1].contains("Duplicate"));
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"checked_exception": "invalid"}}"#).unwrap();
        let config = OracleConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.checked_exception, BehaviorType::Invalid);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "flaky_exceptions: [X, X]").unwrap();
        assert!(OracleConfig::load_from_file(file.path()).is_err());
    }
}
