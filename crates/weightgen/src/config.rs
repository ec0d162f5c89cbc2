use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{EmptyArrayPolicy, NumericFormat};

/// Configuration IO error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid format.
    #[error("Config error => Invalid format: {0}")]
    InvalidFormat(String),

    /// File not found.
    #[error("Config error => File not found: {0}")]
    FileNotFound(String),
}

/// Regex rule renaming container groups before they become layer names.
#[derive(new, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRemap {
    /// Pattern matched against the whole group name.
    pub pattern: String,
    /// Replacement, may refer to capture groups (`$1`).
    pub replacement: String,
}

/// Everything an export run needs, as stored in a JSON file.
///
/// ```json
/// {
///   "input": "lenet.safetensors",
///   "document": "weights.json",
///   "source": "weights.c",
///   "numeric_format": { "kind": "fixed", "frac_bits": 10 }
/// }
/// ```
///
/// Every field is optional; missing fields take their default value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Weight container to read.
    pub input: Option<PathBuf>,
    /// Human-readable listing to write.
    pub listing: Option<PathBuf>,
    /// Canonical document to write, or to read when generating code only.
    pub document: Option<PathBuf>,
    /// Generated C source to write.
    pub source: Option<PathBuf>,
    /// Generated C header to write.
    pub header: Option<PathBuf>,
    /// Handling of empty parameters.
    pub empty_arrays: EmptyArrayPolicy,
    /// Element representation of the generated arrays.
    pub numeric_format: NumericFormat,
    /// Group renaming rules, first match wins.
    pub key_remap: Vec<KeyRemap>,
    /// First line comment of the generated files.
    pub top_comment: Option<String>,
}

impl ExportConfig {
    /// Saves the configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, file: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;

        std::fs::write(file, json)
    }

    /// Loads the configuration from a file.
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(file.as_ref())
            .map_err(|_| ConfigError::FileNotFound(file.as_ref().to_string_lossy().to_string()))?;

        Self::from_json(&content)
    }

    /// Loads the configuration from JSON text.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|err| ConfigError::InvalidFormat(format!("{err}")))
    }
}
