//! Deployment configuration file.
//!
//! One TOML file describes a deployment: the source query names, the field
//! mapping and the default run flags. Every section is optional and falls
//! back to the built-in defaults.
//!
//! ```toml
//! [defaults]
//! profiles = false
//! associations = true
//!
//! [queries.students]
//! name = "mk.ManageBac_Stu"
//! page_size = 2000
//!
//! [mapping.grades]
//! ignored_year_groups = [10543690]
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use roster_ingest::SourceQueries;
use roster_model::FieldMapping;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub defaults: RunDefaults,
    pub queries: SourceQueries,
    pub mapping: FieldMapping,
}

/// Flag values used when the command line does not set them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDefaults {
    pub profiles: bool,
    pub associations: bool,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            profiles: true,
            associations: false,
        }
    }
}

impl DeploymentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read deployment config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse deployment config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("render deployment config")
    }
}
