use crate::{
    error::NotegraphError,
    properties::TagMode,
    style::{GraphStyle, StylePatch},
};
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};

/// Config file section holding the [GraphConfig].
pub const GRAPH_SECTION: &str = "graph";

/// Graph panel settings, stored as the `[graph]` table of a TOML config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Titles longer than this many characters are cut and suffixed with `...`. 0 disables.
    pub title_max_length: usize,
    /// File names that make a document its folder's representative, in priority order.
    pub index_names: Vec<String>,
    /// Overrides the title of the workspace root folder node.
    pub root_title: Option<String>,
    /// Path segments starting with this character are excluded from the graph.
    pub hidden_prefix: char,
    pub tag_mode: TagMode,
    pub style: StylePatch,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            title_max_length: 24,
            index_names: vec!["README.md".to_string(), "index.md".to_string()],
            root_title: None,
            hidden_prefix: '.',
            tag_mode: TagMode::default(),
            style: StylePatch::default(),
        }
    }
}

impl GraphConfig {
    /// The style patch resolved against the defaults.
    pub fn graph_style(&self) -> GraphStyle {
        GraphStyle::merged(&self.style)
    }

    /// Parse a whole config file, reading the `[graph]` table. A file without it yields the
    /// defaults.
    pub fn from_toml_str(content: &str) -> Result<GraphConfig, NotegraphError> {
        let mut table: toml::Table = toml::from_str(content)?;
        match table.remove(GRAPH_SECTION) {
            Some(section) => Ok(section.try_into()?),
            None => Ok(GraphConfig::default()),
        }
    }
}

pub trait GraphConfigProvider: Send + Sync {
    fn get_config(&self) -> Result<GraphConfig, NotegraphError>;
    fn set_config(&self, config: &GraphConfig) -> Result<(), NotegraphError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GraphConfigProvider for TomlConfigProvider {
    fn get_config(&self) -> Result<GraphConfig, NotegraphError> {
        tracing::debug!("Attempting to read graph config from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Config file not found, using default graph config.");
            return Ok(GraphConfig::default());
        }
        let content = read_to_string(&self.path)?;
        GraphConfig::from_toml_str(&content).map_err(|e| {
            NotegraphError::Config(format!("could not read {:?}: {e}", &self.path))
        })
    }

    /// Write the `[graph]` table, keeping any other tables already in the file.
    fn set_config(&self, config: &GraphConfig) -> Result<(), NotegraphError> {
        tracing::debug!("Attempting to write graph config to: {:?}", &self.path);
        let mut table: toml::Table = if self.path.exists() {
            toml::from_str(&read_to_string(&self.path)?)?
        } else {
            toml::Table::new()
        };
        table.insert(GRAPH_SECTION.to_string(), toml::Value::try_from(config)?);
        write(&self.path, toml::to_string(&table)?)?;
        Ok(())
    }
}
