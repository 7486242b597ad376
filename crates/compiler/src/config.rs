//! Compiler configuration
//!
//! Lets hosts extend the graph compiler without modifying it: extra names
//! for node kinds, a table of scene object locations for object nodes, and
//! how strict to be about nodes that do not reach the output.
//!
//! # Example
//!
//! ```rust,ignore
//! use nodefnc::CompilerConfig;
//!
//! let config = CompilerConfig::new()
//!     .with_alias("ShaderNodeMath", "fn_FloatMathNode")
//!     .with_object("Cube", [0.0, 0.0, 2.0])
//!     .with_allow_unused_nodes(false);
//! ```
//!
//! The same settings can be read from TOML:
//!
//! ```toml
//! allow_unused_nodes = false
//!
//! [aliases]
//! ShaderNodeMath = "fn_FloatMathNode"
//!
//! [objects]
//! Cube = [0.0, 0.0, 2.0]
//! ```

use nodefn_core::Vector;
use nodefn_core::builtins::StaticObjects;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Configuration for the graph compiler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Additional node kind ids, mapped to the kind they stand for
    pub aliases: BTreeMap<String, String>,

    /// Object locations served to `fn_ObjectTransformsNode`
    pub objects: BTreeMap<String, [f32; 3]>,

    /// Accept nodes the output does not depend on (they are never run)
    pub allow_unused_nodes: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            aliases: BTreeMap::new(),
            objects: BTreeMap::new(),
            allow_unused_nodes: true,
        }
    }
}

impl CompilerConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    /// Add a node kind alias (builder pattern)
    pub fn with_alias(mut self, alias: impl Into<String>, kind: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), kind.into());
        self
    }

    /// Add a scene object location
    pub fn with_object(mut self, name: impl Into<String>, location: [f32; 3]) -> Self {
        self.objects.insert(name.into(), location);
        self
    }

    pub fn with_allow_unused_nodes(mut self, allow: bool) -> Self {
        self.allow_unused_nodes = allow;
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        CompilerConfig::from_toml_str(&text)
    }

    /// The configured objects as an object source
    pub fn static_objects(&self) -> StaticObjects {
        self.objects
            .iter()
            .fold(StaticObjects::new(), |objects, (name, location)| {
                objects.with_location(name.as_str(), Vector::from_array(*location))
            })
    }
}
