//! Grid configuration, read from a TOML file.
//!
//! ```toml
//! base_url = "http://localhost:8080"
//! resource = "trucks"
//! page_size = 25
//! columns = ["number", "brand", "licencePlate", "chassis", "rental"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_COLUMNS;
use crate::state::DEFAULT_LIMIT;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Remote service URL (e.g. "http://localhost:8080").
    pub base_url: String,

    /// Collection path under `base_url`.
    pub resource: String,

    /// Rows per page until the grid asks otherwise.
    pub page_size: usize,

    /// Columns shown by the grid, in order.
    pub columns: Vec<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            resource: "trucks".to_string(),
            page_size: DEFAULT_LIMIT,
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl GridConfig {
    /// Load config from disk, or return defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
