use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{argument::Argument, Error, Result};

pub const MANIFEST_FILE: &str = "template.json";

/// Parsed `template.json`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TemplateConfig {
    #[serde(default)]
    pub args: Vec<Argument>,
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_handler_name: Option<String>,
}

/// One entry to render into the target directory.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Content {
    /// File or directory, relative to the template root.
    pub source: PathBuf,
    /// Handlebars template for the path relative to the target root.
    /// Defaults to `source`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// When false, files are copied without substitution.
    #[serde(default = "default_render", skip_serializing_if = "is_true")]
    pub render: bool,
    /// Globs matched against paths relative to `source`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

fn default_render() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

impl Content {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: None,
            render: true,
            exclude: Vec::new(),
        }
    }

    pub fn destination_template(&self) -> String {
        self.destination
            .clone()
            .unwrap_or_else(|| self.source.to_string_lossy().into_owned())
    }
}

impl TemplateConfig {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::Serialize)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Parse manifest text.
    pub fn load(text: &str) -> Result<TemplateConfig> {
        let config: TemplateConfig = serde_json::from_str(text).map_err(Error::ConfigParse)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Read and parse `template.json` from a template root.
    pub fn read(template_root: &Path) -> Result<TemplateConfig> {
        let path = template_root.join(MANIFEST_FILE);
        let text = fs::read_to_string(&path).map_err(|source| Error::ManifestRead {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(?path, "read manifest");
        Self::load(&text).map_err(|err| Error::ManifestParse {
            path,
            source: Box::new(err),
        })
    }

    fn validate(config: &TemplateConfig) -> Result<()> {
        let mut seen = HashSet::new();
        for arg in &config.args {
            if arg.value.is_array() || arg.value.is_object() {
                return Err(Error::ConfigInvalid(format!(
                    "argument '{}' must have a scalar value",
                    arg.name
                )));
            }
            if !seen.insert(arg.name.as_str()) {
                return Err(Error::ConfigInvalid(format!(
                    "argument '{}' is declared more than once",
                    arg.name
                )));
            }
        }
        Ok(())
    }
}
