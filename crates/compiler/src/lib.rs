//! nodefn graph compiler library
//!
//! Turns node graphs (JSON or TOML) into callable [`nodefn_core::Function`]s.
//!
//! ```rust,ignore
//! use nodefn_core::TypeRegistry;
//! use nodefnc::{NodeGraph, generate_function};
//!
//! let types = TypeRegistry::new();
//! let graph = NodeGraph::load(Path::new("add.json"))?;
//! let function = generate_function(&graph, &types).expect("graph compiles");
//! ```
//!
//! # Extending the Compiler
//!
//! Hosts can add node kind aliases and scene objects through
//! [`CompilerConfig`], or register their own node kinds on a
//! [`NodeRegistry`] and pass it to [`GraphCompiler::with_node_registry`].

pub mod body;
pub mod compile;
pub mod config;
pub mod error;
pub mod graph;
pub mod node_kinds;
pub mod order;
pub mod plan;

pub use compile::GraphCompiler;
pub use config::{CompilerConfig, ConfigError};
pub use error::{CompileError, LoadError};
pub use graph::{INPUT_NODE, Link, Literal, Node, NodeGraph, OUTPUT_NODE, SocketDecl, SocketRef};
pub use node_kinds::{BuildContext, NodeBuilder, NodeRegistry};

use nodefn_core::{SharedFunction, Type, TypeRegistry};

/// Compile with the default configuration; failures are logged
pub fn generate_function(graph: &NodeGraph, types: &TypeRegistry) -> Option<SharedFunction> {
    GraphCompiler::new(types).compile(graph)
}

/// Compile with the default configuration, reporting why compilation failed
pub fn try_generate_function(
    graph: &NodeGraph,
    types: &TypeRegistry,
) -> Result<SharedFunction, CompileError> {
    GraphCompiler::new(types).try_compile(graph)
}

/// Compile and keep the result only if its signature has the given types
pub fn function_with_signature(
    graph: &NodeGraph,
    types: &TypeRegistry,
    inputs: &[Type],
    outputs: &[Type],
) -> Option<SharedFunction> {
    GraphCompiler::new(types).compile_with_signature(graph, inputs, outputs)
}
