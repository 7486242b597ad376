//! Built-in functions
//!
//! Each constructor builds a fresh [`SharedFunction`](crate::SharedFunction)
//! whose signature uses handles from the given registry. The graph compiler
//! uses these as node implementations; hosts can also call them directly.

pub mod lists;
pub mod math;
pub mod objects;
pub mod vectors;

pub use lists::{
    ListOp, append_float, append_to_list, combine_lists, get_list_element, list_function,
    list_length,
};
pub use math::{MathOp, add_floats, float_math, int_math};
pub use objects::{ObjectSource, StaticObjects, object_transforms};
pub use vectors::{VectorOp, combine_vector, separate_vector, vector_distance, vector_math};
