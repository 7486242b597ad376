//! Runtime Error Handling
//!
//! Thread-local error state for the C entry points. A failing entry point
//! records a message here and returns its sentinel (null, `false`, zero);
//! nothing unwinds across the C boundary.
//!
//! ```c
//! if (!nodefn_function_call(fn, fn_in, fn_out)) {
//!     const char *msg = nodefn_take_error();
//!     /* copy msg before the next nodefn_* call */
//! }
//! ```

use std::cell::RefCell;
use std::ffi::{CString, c_char};
use std::fmt::Display;
use std::ptr;
use thiserror::Error;
use tracing::debug;

/// Failures of the C entry points before or around a core operation
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("runtime not initialized (call nodefn_initialize first)")]
    NotInitialized,

    #[error("null pointer passed for {0}")]
    NullPointer(&'static str),

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("function has no call body")]
    NotCallable,

    #[error("input and output tuple are the same handle")]
    AliasedTuples,

    #[error("panic in call body: {0}")]
    Panic(String),
}

thread_local! {
    /// Last error message of this thread
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };

    /// C copy of the message handed out by get/take
    static ERROR_CSTRING: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Record an error for the current thread, replacing any pending one
pub fn set_error(msg: impl Into<String>) {
    let msg = msg.into();
    debug!(error = %msg, "nodefn error");
    // Drop the cached C string first so no stale pointer survives
    ERROR_CSTRING.with(|cs| *cs.borrow_mut() = None);
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(msg));
}

/// Record `err` prefixed by the failing operation
pub fn set_error_in(operation: &str, err: impl Display) {
    set_error(format!("{}: {}", operation, err));
}

/// Take (and clear) the pending error
pub fn take_error() -> Option<String> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

pub fn has_error() -> bool {
    LAST_ERROR.with(|e| e.borrow().is_some())
}

pub fn clear_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
    ERROR_CSTRING.with(|cs| *cs.borrow_mut() = None);
}

/// Format a panic payload into an error message
pub fn format_panic_payload(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Cache `msg` as a C string and return a pointer into the cache
fn cache_cstring(msg: &str) -> *const c_char {
    // Interior NULs would truncate the message
    let cstring = CString::new(msg.replace('\0', "?")).unwrap_or_default();
    ERROR_CSTRING.with(|cs| {
        let ptr = cstring.as_ptr();
        *cs.borrow_mut() = Some(cstring);
        ptr
    })
}

// C entry points

/// Check if an error is pending on this thread
#[unsafe(no_mangle)]
pub extern "C" fn nodefn_has_error() -> bool {
    has_error()
}

/// Get the pending error message without clearing it
///
/// Returns null if no error is pending.
///
/// # WARNING: Pointer Lifetime
/// The returned pointer is only valid until the next call to `nodefn_get_error`,
/// `nodefn_take_error`, `nodefn_clear_error` or any failing `nodefn_*` call on
/// this thread. Callers must copy the string if they need to retain it.
#[unsafe(no_mangle)]
pub extern "C" fn nodefn_get_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(msg) => cache_cstring(msg),
        None => ptr::null(),
    })
}

/// Take (and clear) the pending error message
///
/// Returns null if no error is pending. Same pointer lifetime as
/// [`nodefn_get_error`].
#[unsafe(no_mangle)]
pub extern "C" fn nodefn_take_error() -> *const c_char {
    match take_error() {
        Some(msg) => cache_cstring(&msg),
        None => ptr::null(),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn nodefn_clear_error() {
    clear_error();
}
