//! Framework options layered with figment.
//!
//! Precedence (later wins):
//! 1. Built-in defaults
//! 2. An optional YAML, TOML or JSON file
//! 3. `SETTINGS_FRAMEWORK_`-prefixed environment variables

use std::path::Path;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::source::SourceFormat;

/// Environment variable prefix for framework options.
pub const ENV_PREFIX: &str = "SETTINGS_FRAMEWORK_";

/// Host-facing options for one settings form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkConfig {
    /// Overrides the option group derived from the source file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_group: Option<String>,
    /// Submission endpoint the form posts to.
    pub form_action: String,
    /// Label of the submit control.
    pub submit_label: String,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            option_group: None,
            form_action: "options.php".into(),
            submit_label: "Save Changes".into(),
        }
    }
}

impl FrameworkConfig {
    /// Load defaults, then `file` if given, then the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(FrameworkConfig::default()));

        if let Some(path) = file {
            figment = match SourceFormat::from_path(path)? {
                SourceFormat::Yaml => figment.merge(Yaml::file(path)),
                SourceFormat::Toml => figment.merge(Toml::file(path)),
                SourceFormat::Json => figment.merge(Json::file(path)),
            };
        }

        let config: FrameworkConfig = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
        debug!(?config, "framework configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn defaults_without_file_or_env() {
        let config = FrameworkConfig::load(None).unwrap();
        assert_eq!(config, FrameworkConfig::default());
    }

    #[test]
    #[serial]
    fn file_overrides_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("framework.toml");
        std::fs::write(&path, "option_group = \"shop\"\nsubmit_label = \"Apply\"\n").unwrap();

        let config = FrameworkConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.option_group.as_deref(), Some("shop"));
        assert_eq!(config.submit_label, "Apply");
        assert_eq!(config.form_action, "options.php");
    }

    #[test]
    #[serial]
    fn env_overrides_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("framework.yaml");
        std::fs::write(&path, "form_action: /admin/save\n").unwrap();

        env::set_var("SETTINGS_FRAMEWORK_FORM_ACTION", "/env/save");
        let config = FrameworkConfig::load(Some(path.as_path()));
        env::remove_var("SETTINGS_FRAMEWORK_FORM_ACTION");

        assert_eq!(config.unwrap().form_action, "/env/save");
    }

    #[test]
    #[serial]
    fn unsupported_file_extension_fails() {
        let result = FrameworkConfig::load(Some(Path::new("framework.ini")));
        assert!(result.is_err());
    }
}
