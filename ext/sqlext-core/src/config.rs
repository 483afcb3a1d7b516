///
/// # Extension Configuration
///
/// Parses `sqlext.toml` files that switch individual extensions on or off.
///
/// ## Example sqlext.toml
///
/// ```toml
/// [extensions]
/// sha1 = true
/// mycount = false
/// ```
///
/// Extensions that are not listed stay enabled, so an empty file (or no
/// file at all) loads everything. Entries keep their declared order.
/// Names are checked against the known extensions by `validate`.
///

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::ExtensionError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionConfig {
    #[serde(default)]
    pub extensions: IndexMap<String, bool>,
}

pub fn parse_config(path: &Path) -> Result<ExtensionConfig, ExtensionError> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| ExtensionError::ConfigParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn parse_config_str(content: &str) -> Result<ExtensionConfig, ExtensionError> {
    toml::from_str(content).map_err(|e| ExtensionError::InvalidConfig(e.to_string()))
}

impl ExtensionConfig {
    /// Every extension enabled.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, enabled: bool) -> Self {
        self.extensions.insert(name.to_string(), enabled);
        self
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.extensions.get(name).copied().unwrap_or(true)
    }

    /// Reject entries that do not name one of `known`.
    pub fn validate(&self, known: &[&str]) -> Result<(), ExtensionError> {
        for name in self.extensions.keys() {
            if !known.contains(&name.as_str()) {
                return Err(ExtensionError::UnknownExtension(name.clone()));
            }
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ExtensionError> {
        toml::to_string(self).map_err(|e| ExtensionError::InvalidConfig(e.to_string()))
    }
}
