//! nodefn core: typed functions for node-graph dataflow
//!
//! This crate provides the value and calling model that compiled node
//! graphs run on. It knows nothing about graphs or C callers; those live in
//! the compiler and runtime crates.
//!
//! Key design principles:
//! - Type: canonical descriptor, compared by identity
//! - Tuple: one typed slot per parameter, used for inputs and outputs
//! - SharedList: copy-on-write list, shared freely, mutated only when unique
//! - Function: immutable signature plus optional call and dependency bodies
//!
//! # Modules
//!
//! - `types`: type descriptors and the memoizing registry
//! - `value`: the values a slot can hold
//! - `list`: copy-on-write shared lists
//! - `tuple`: call tuples
//! - `signature`: parameters and signatures
//! - `function`: functions and body capabilities
//! - `dependencies`: external data dependencies
//! - `builtins`: built-in function library
//! - `error`: error type for all of the above

pub mod builtins;
pub mod dependencies;
pub mod error;
pub mod function;
pub mod list;
pub mod signature;
pub mod tuple;
pub mod types;
pub mod value;

pub use dependencies::{Dependencies, Dependency, DependencySink};
pub use error::FnError;
pub use function::{
    BodyKind, DependenciesBody, Function, FunctionBuilder, SharedFunction, TupleCallBody,
};
pub use list::SharedList;
pub use signature::{Parameter, Signature};
pub use tuple::Tuple;
pub use types::{Type, TypeInfo, TypeKind, TypeRegistry};
pub use value::{ListElement, TupleValue, Value, Vector};
