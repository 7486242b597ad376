//! Error types for values, tuples and function calls.
//!
//! These are precondition failures: a correct caller never sees them, but
//! they are surfaced as `Result`s so that a host (or the C façade) can
//! report them instead of aborting.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FnError {
    /// Slot or value accessed with a type other than the declared one
    #[error("type mismatch at slot {index}: declared {declared}, accessed as {requested}")]
    TypeMismatch {
        index: usize,
        declared: String,
        requested: String,
    },

    /// Slot read before it was ever set (or after it was relocated out)
    #[error("slot {index} read before being initialized")]
    UninitializedRead { index: usize },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// In-place mutation of a list that has more than one user
    #[error("cannot mutate shared list with {users} users; use get_mutable first")]
    ImmutableViolation { users: usize },

    /// Call made with an unfinished input tuple, or a body that left its
    /// output tuple unfinished
    #[error("contract violation in '{function}': {reason}")]
    ContractViolation { function: String, reason: String },

    #[error("function '{function}' has no {body} body")]
    MissingBody {
        function: String,
        body: &'static str,
    },

    #[error("unknown type name '{0}'")]
    UnknownType(String),

    /// Failure raised by a call body itself
    #[error("{0}")]
    Body(String),
}

impl From<String> for FnError {
    fn from(s: String) -> Self {
        FnError::Body(s)
    }
}
