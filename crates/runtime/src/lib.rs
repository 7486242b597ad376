//! nodefn runtime: C-linkage library for compiled node functions
//!
//! Hosts written in C link the staticlib and work with opaque handles:
//!
//! ```c
//! nodefn_initialize();
//! FnFunction fn = nodefn_tree_to_function(graph_json);
//! FnTuple in = nodefn_tuple_for_input(fn);
//! FnTuple out = nodefn_tuple_for_output(fn);
//! nodefn_tuple_set_float(in, 0, 3.0f);
//! nodefn_tuple_set_float(in, 1, 4.0f);
//! nodefn_function_call(nodefn_function_get_callable(fn), in, out);
//! float sum = nodefn_tuple_get_float(out, 0);
//! ```
//!
//! # Modules
//!
//! - `capi`: handle-based entry points over functions, tuples and types
//! - `context`: process-wide type registry and compiler configuration
//! - `error`: thread-local error state
//! - `engine`: draw-engine lifecycle driver

pub mod capi;
pub mod context;
pub mod engine;
pub mod error;

pub use context::{RuntimeContext, initialize, is_initialized, shutdown};
pub use engine::{DrawEngine, EngineDriver, LifecycleError, Phase};
pub use error::{RuntimeError, clear_error, has_error, set_error, take_error};
