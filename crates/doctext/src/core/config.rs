//! Configuration loading and management.
//!
//! This module provides utilities for loading extraction configuration from various
//! sources (TOML, YAML, JSON) and discovering configuration files in the project hierarchy.

use crate::{DoctextError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked for by [`ExtractionConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "doctext.toml";

/// Main extraction configuration.
///
/// It can be loaded from TOML, YAML, or JSON files, or created programmatically.
///
/// # Example
///
/// ```rust
/// use doctext::core::config::{ExtractionConfig, HintPolicy};
///
/// // Create with defaults
/// let config = ExtractionConfig::default();
/// assert_eq!(config.detection.hint_policy, HintPolicy::TieBreak);
///
/// // Load from TOML file
/// // let config = ExtractionConfig::from_toml_file("doctext.toml")?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Format detection options
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Output serialization options
    #[serde(default)]
    pub transform: TransformConfig,

    /// Parse documents embedded in containers (ZIP entries, OLE objects in DOCX/PPTX)
    #[serde(default = "default_true")]
    pub extract_embedded: bool,

    /// Nesting limit for embedded documents. Deeper entries are skipped.
    #[serde(default = "default_max_embedded_depth")]
    pub max_embedded_depth: usize,

    /// Maximum concurrent extractions in batch operations (None = num_cpus * 2).
    #[serde(default)]
    pub max_concurrent_extractions: Option<usize>,
}

/// How a caller-supplied type hint interacts with byte-level detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintPolicy {
    /// Use the hint only when it is a more specific subtype of what the bytes
    /// show. Byte evidence always wins a disagreement.
    #[default]
    TieBreak,
    /// Never consult the hint.
    Ignore,
    /// Prefer the hint whenever one is present.
    Override,
}

/// Format detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Number of leading bytes inspected for signatures
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    #[serde(default)]
    pub hint_policy: HintPolicy,

    /// Read the entry listing of ZIP containers to tell OOXML/ODF apart from plain archives
    #[serde(default = "default_true")]
    pub inspect_containers: bool,
}

/// Output method of the content-to-text transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMethod {
    #[default]
    Text,
}

/// Content-to-text transform configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub method: OutputMethod,

    /// Indentation is not supported by flat-text output and must stay `false`.
    #[serde(default)]
    pub indent: bool,
}

impl TransformConfig {
    pub fn validate(&self) -> Result<()> {
        if self.indent {
            return Err(DoctextError::validation(
                "transform.indent is not supported with the text output method",
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
fn default_window_size() -> usize {
    65536
}
fn default_max_embedded_depth() -> usize {
    8
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            transform: TransformConfig::default(),
            extract_embedded: true,
            max_embedded_depth: default_max_embedded_depth(),
            max_concurrent_extractions: None,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            hint_policy: HintPolicy::default(),
            inspect_containers: true,
        }
    }
}

impl ExtractionConfig {
    /// Check value ranges and unsupported combinations.
    pub fn validate(&self) -> Result<()> {
        if self.detection.window_size == 0 {
            return Err(DoctextError::validation("detection.window_size must be positive"));
        }
        if self.max_concurrent_extractions == Some(0) {
            return Err(DoctextError::validation("max_concurrent_extractions must be positive"));
        }
        self.transform.validate()
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `DoctextError::Validation` if the file doesn't exist, is invalid TOML,
    /// or holds out-of-range values.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| DoctextError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_yaml_ng::from_str(&content)
            .map_err(|e| DoctextError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| DoctextError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, picking the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(DoctextError::validation(format!(
                "Unsupported config file format: {}. Use .toml, .yaml, .yml or .json",
                path.display()
            ))),
        }
    }

    /// Discover configuration file in parent directories.
    ///
    /// Searches for `doctext.toml` in the current directory and parent directories.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(DoctextError::Io)?;
        Self::discover_from(&current)
    }

    /// Like [`discover`](Self::discover), starting from `start` instead of the working directory.
    pub fn discover_from(start: &Path) -> Result<Option<Self>> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "discovered configuration file");
                return Ok(Some(Self::from_toml_file(candidate)?));
            }
        }

        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| DoctextError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}
