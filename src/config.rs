//! SafeScan configuration management

use crate::error::{Error, Result};
use crate::privacy::types::PiiType;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main SafeScan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeScanConfig {
    /// Input admission limits
    pub limits: LimitsConfig,

    /// Detection configuration
    pub detection: DetectionConfig,

    /// Redaction configuration
    pub redaction: RedactionConfig,

    /// Audit reporting configuration
    pub reporting: ReportingConfig,
}

impl SafeScanConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Reject configurations that would disable admission control or
    /// produce meaningless confidence thresholds.
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_input_bytes == 0 {
            return Err(Error::Config("limits.max_input_bytes must be > 0".into()));
        }
        if self.limits.max_depth == 0 {
            return Err(Error::Config("limits.max_depth must be > 0".into()));
        }
        for (name, value) in [
            ("detection.min_confidence", self.detection.min_confidence),
            (
                "detection.flag_confidence_threshold",
                self.detection.flag_confidence_threshold,
            ),
            ("redaction.min_confidence", self.redaction.min_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be within [0.0, 1.0], got {}",
                    name, value
                )));
            }
        }
        for custom in &self.detection.custom_patterns {
            if !(0.0..=1.0).contains(&custom.specificity) {
                return Err(Error::Config(format!(
                    "custom pattern '{}' specificity must be within [0.0, 1.0]",
                    custom.name
                )));
            }
        }
        if self.reporting.max_history == 0 {
            return Err(Error::Config("reporting.max_history must be > 0".into()));
        }
        Ok(())
    }
}

/// Input admission limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum serialized input size in bytes
    pub max_input_bytes: usize,

    /// Maximum nesting depth of structured input
    pub max_depth: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 1_000_000,
            max_depth: 100,
        }
    }
}

/// Detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Detections scoring below this are discarded
    pub min_confidence: f64,

    /// Bytes before a match searched for context keywords
    pub context_window: usize,

    /// Time budget per pattern application in milliseconds
    pub pattern_timeout_ms: u64,

    /// Minimum confidence counted by the compliance fast path
    pub flag_confidence_threshold: f64,

    /// Salt for value hashes (random per detector when unset)
    pub hash_salt: Option<String>,

    /// Additional user-defined patterns
    pub custom_patterns: Vec<CustomPattern>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            context_window: 40,
            pattern_timeout_ms: 100,
            flag_confidence_threshold: 0.5,
            hash_salt: None,
            custom_patterns: Vec::new(),
        }
    }
}

/// User-defined detection pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPattern {
    /// Pattern name (used in logs)
    pub name: String,

    /// PII type reported for matches
    pub pii_type: PiiType,

    /// Regex pattern; a `value` capture group narrows the reported span
    pub pattern: String,

    /// Base confidence for a match
    #[serde(default = "default_specificity")]
    pub specificity: f64,

    /// Only report matches with a nearby context keyword
    #[serde(default)]
    pub requires_context: bool,
}

fn default_specificity() -> f64 {
    0.6
}

/// Redaction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Only detections at or above this confidence are redacted
    pub min_confidence: f64,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
        }
    }
}

/// Audit reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Records older than this are pruned on report generation
    pub retention_days: u32,

    /// Maximum number of retained records (oldest evicted first)
    pub max_history: usize,

    /// Window used when no explicit window is requested
    pub default_window_days: u32,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            retention_days: 90,
            max_history: 100_000,
            default_window_days: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SafeScanConfig::default();
        assert_eq!(config.limits.max_input_bytes, 1_000_000);
        assert_eq!(config.limits.max_depth, 100);
        assert_eq!(config.redaction.min_confidence, 0.7);
        assert_eq!(config.reporting.default_window_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SafeScanConfig::from_toml_str(
            r#"
            [limits]
            max_depth = 20

            [detection]
            context_window = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.limits.max_depth, 20);
        assert_eq!(config.limits.max_input_bytes, 1_000_000);
        assert_eq!(config.detection.context_window, 64);
        assert_eq!(config.detection.pattern_timeout_ms, 100);
    }

    #[test]
    fn test_custom_patterns_toml() {
        let config = SafeScanConfig::from_toml_str(
            r#"
            [[detection.custom_patterns]]
            name = "employee_id"
            pii_type = "name"
            pattern = '\bEMP-\d{6}\b'
            "#,
        )
        .unwrap();
        let custom = &config.detection.custom_patterns[0];
        assert_eq!(custom.pii_type, PiiType::Name);
        assert_eq!(custom.specificity, 0.6);
        assert!(!custom.requires_context);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let err = SafeScanConfig::from_toml_str("[redaction]\nmin_confidence = 1.5\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = SafeScanConfig::from_toml_str("[limits]\nmax_depth = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[reporting]\nretention_days = 7").unwrap();
        let config = SafeScanConfig::from_file(file.path()).unwrap();
        assert_eq!(config.reporting.retention_days, 7);
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = SafeScanConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = SafeScanConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.limits.max_input_bytes, config.limits.max_input_bytes);
    }
}
