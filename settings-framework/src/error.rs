//! Error types for the settings framework

use std::path::PathBuf;
use thiserror::Error;

/// Result type for settings framework operations
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors that can occur while loading or registering a settings document.
///
/// Sections or fields that lack an identity are not errors; the registrar
/// skips them. Unknown field types render as empty output.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The document is not list-shaped after normalization
    #[error("settings document is malformed: {message}")]
    Schema { message: String },

    /// Document source has an extension we cannot parse
    #[error("unsupported settings source format: {}", extension.as_deref().unwrap_or("<none>"))]
    UnsupportedFormat { extension: Option<String> },

    /// Document source file is missing
    #[error("settings source not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Framework configuration could not be extracted
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl SettingsError {
    /// Build a schema error from any displayable message.
    pub fn schema(message: impl Into<String>) -> Self {
        SettingsError::Schema {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for SettingsError {
    fn from(error: figment::Error) -> Self {
        SettingsError::Config(Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = SettingsError::schema("sections must be a list");
        assert_eq!(
            err.to_string(),
            "settings document is malformed: sections must be a list"
        );
    }

    #[test]
    fn test_unsupported_format_display() {
        let err = SettingsError::UnsupportedFormat {
            extension: Some("ini".into()),
        };
        assert!(err.to_string().contains("ini"));

        let err = SettingsError::UnsupportedFormat { extension: None };
        assert!(err.to_string().contains("<none>"));
    }
}
