//! Compiler error types.

use nodefn_core::TypeKind;
use std::path::PathBuf;
use thiserror::Error;

/// Why a node graph could not be turned into a function
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("node name '{0}' is used more than once")]
    DuplicateNode(String),

    #[error("graph has no {} node", crate::graph::OUTPUT_NODE)]
    MissingOutputNode,

    #[error("graph has more than one '{0}' node")]
    MultipleInterfaceNodes(String),

    #[error("node '{node}' has unknown kind '{kind}'")]
    UnknownNodeKind { node: String, kind: String },

    #[error("link references unknown node '{0}'")]
    UnknownNode(String),

    #[error("node '{node}' has no socket '{socket}'")]
    UnknownSocket { node: String, socket: String },

    #[error("socket '{node}.{socket}' is declared more than once")]
    DuplicateSocket { node: String, socket: String },

    #[error("cannot link {from} ({from_type}) to {to} ({to_type})")]
    LinkTypeMismatch {
        from: String,
        to: String,
        from_type: TypeKind,
        to_type: TypeKind,
    },

    #[error("input socket '{node}.{socket}' has more than one incoming link")]
    MultipleLinks { node: String, socket: String },

    #[error("cyclic dependency between nodes: {}", .0.join(", "))]
    Cycle(Vec<String>),

    #[error("node '{node}' has invalid value '{value}' for property '{property}'")]
    InvalidProperty {
        node: String,
        property: String,
        value: String,
    },

    #[error("default for '{node}.{socket}' is not a valid {expected}")]
    InvalidDefault {
        node: String,
        socket: String,
        expected: TypeKind,
    },

    #[error("node '{0}' does not contribute to the graph output")]
    UnusedNode(String),

    #[error("compiled signature {found} does not match the expected signature")]
    SignatureMismatch { found: String },
}

/// Failure reading a graph or configuration file
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported file extension for {0} (expected .json or .toml)")]
    UnsupportedExtension(PathBuf),
}
