//! Per-environment variables stored at `envs/<environment>/<app>.json`.
//!
//! Every workflow reads the same schema:
//!
//! ```json
//! { "envs": { "API_URL": "https://api.example.dev", "RETRIES": 3 } }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A single `KEY=VALUE` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

/// Ordered environment mapping, in the order the config file lists it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars {
    vars: Vec<EnvVar>,
}

#[derive(Deserialize)]
struct EnvFile {
    envs: serde_json::Map<String, serde_json::Value>,
}

impl EnvVars {
    /// Path of the config file for `(environment, app)` under `root`.
    pub fn config_path(root: &Path, environment: &str, app: &str) -> PathBuf {
        root.join("envs")
            .join(environment)
            .join(format!("{app}.json"))
    }

    /// Load the mapping for `(environment, app)`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidIdentifier`](crate::Error::InvalidIdentifier) if either name is not a plain identifier
    /// - [`Error::ConfigNotFound`](crate::Error::ConfigNotFound) if the file does not exist
    /// - [`Error::ConfigParse`](crate::Error::ConfigParse) if the file is not JSON or has no `envs` object
    pub fn load(root: &Path, environment: &str, app: &str) -> crate::Result<Self> {
        crate::stack::validate_identifier("environment", environment)?;
        crate::stack::validate_identifier("app", app)?;

        let path = Self::config_path(root, environment, app);
        tracing::debug!(path = %path.display(), "loading env config");

        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => crate::Error::ConfigNotFound { path: path.clone() },
            _ => crate::Error::ConfigRead {
                path: path.clone(),
                source: e,
            },
        })?;

        let vars = Self::parse(&content).map_err(|e| crate::Error::ConfigParse {
            path: path.clone(),
            source: e,
        })?;

        tracing::debug!(path = %path.display(), count = vars.len(), "env config loaded");
        Ok(vars)
    }

    /// Parse a config document. Values are passed through without type
    /// checks: strings verbatim, `null` as empty, everything else as JSON text.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let file: EnvFile = serde_json::from_str(content)?;
        let vars = file
            .envs
            .into_iter()
            .map(|(key, value)| EnvVar {
                key,
                value: render_value(value),
            })
            .collect();
        Ok(Self { vars })
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnvVar> {
        self.vars.iter()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|v| v.key == key)
            .map(|v| v.value.as_str())
    }
}

impl<'a> IntoIterator for &'a EnvVars {
    type Item = &'a EnvVar;
    type IntoIter = std::slice::Iter<'a, EnvVar>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(String, String)> for EnvVars {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut vars: Vec<EnvVar> = Vec::new();
        for (key, value) in iter {
            match vars.iter_mut().find(|v| v.key == key) {
                Some(existing) => existing.value = value,
                None => vars.push(EnvVar { key, value }),
            }
        }
        Self { vars }
    }
}

fn render_value(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
