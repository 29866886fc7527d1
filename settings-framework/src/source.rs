//! Raw settings-document sources.
//!
//! A source yields an untyped value in either accepted shape; the loader
//! normalizes it. Files are parsed according to their extension.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SettingsError};

/// Serialization format of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Json,
    Toml,
}

impl SourceFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(SourceFormat::Yaml),
            Some("json") => Ok(SourceFormat::Json),
            Some("toml") => Ok(SourceFormat::Toml),
            _ => Err(SettingsError::UnsupportedFormat { extension }),
        }
    }

    /// Parse `content` into an untyped value.
    pub fn parse(self, content: &str) -> Result<Value> {
        let value = match self {
            SourceFormat::Yaml => serde_yaml_ng::from_str(content)?,
            SourceFormat::Json => serde_json::from_str(content)?,
            SourceFormat::Toml => toml::from_str(content)?,
        };
        Ok(value)
    }
}

/// Where the raw settings document comes from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// An already-parsed value.
    Value(Value),
    /// Inline text in a known format.
    Text { format: SourceFormat, content: String },
    /// A file whose extension selects the format.
    File(PathBuf),
}

impl DocumentSource {
    pub fn yaml(content: impl Into<String>) -> Self {
        DocumentSource::Text {
            format: SourceFormat::Yaml,
            content: content.into(),
        }
    }

    pub fn json(content: impl Into<String>) -> Self {
        DocumentSource::Text {
            format: SourceFormat::Json,
            content: content.into(),
        }
    }

    pub fn toml(content: impl Into<String>) -> Self {
        DocumentSource::Text {
            format: SourceFormat::Toml,
            content: content.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        DocumentSource::File(path.into())
    }

    /// The file path backing this source, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            DocumentSource::File(path) => Some(path),
            _ => None,
        }
    }

    /// Read the raw document.
    pub fn read(&self) -> Result<Value> {
        match self {
            DocumentSource::Value(value) => Ok(value.clone()),
            DocumentSource::Text { format, content } => format.parse(content),
            DocumentSource::File(path) => {
                if !path.is_file() {
                    return Err(SettingsError::SourceNotFound { path: path.clone() });
                }
                let format = SourceFormat::from_path(path)?;
                let content = std::fs::read_to_string(path)?;
                debug!(path = %path.display(), ?format, "read settings source");
                format.parse(&content)
            }
        }
    }
}

impl From<Value> for DocumentSource {
    fn from(value: Value) -> Self {
        DocumentSource::Value(value)
    }
}
