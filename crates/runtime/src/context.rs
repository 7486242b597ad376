//! Process-wide runtime context
//!
//! C hosts see one type registry and one compiler configuration per
//! process, set up by `nodefn_initialize` and torn down by
//! `nodefn_shutdown`. Rust callers can use the registry and compiler
//! directly and never touch this module.

use crate::RuntimeError;
use crate::error::set_error_in;
use nodefn_core::TypeRegistry;
use nodefnc::{CompilerConfig, GraphCompiler};
use std::ffi::{CStr, c_char};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

pub struct RuntimeContext {
    pub types: TypeRegistry,
    pub config: CompilerConfig,
}

impl RuntimeContext {
    fn new() -> Self {
        RuntimeContext {
            types: TypeRegistry::new(),
            config: CompilerConfig::default(),
        }
    }

    pub fn compiler(&self) -> GraphCompiler<'_> {
        GraphCompiler::with_config(&self.types, self.config.clone())
    }
}

static CONTEXT: Mutex<Option<RuntimeContext>> = Mutex::new(None);

fn lock() -> MutexGuard<'static, Option<RuntimeContext>> {
    // A panic while holding the lock leaves the context itself consistent
    CONTEXT.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run `f` with the context, failing if the runtime is not initialized
pub fn with_context<R>(f: impl FnOnce(&mut RuntimeContext) -> R) -> Result<R, RuntimeError> {
    let mut guard = lock();
    let context = guard.as_mut().ok_or(RuntimeError::NotInitialized)?;
    Ok(f(context))
}

pub fn is_initialized() -> bool {
    lock().is_some()
}

/// Set up the runtime context; calling it again keeps the existing one
pub fn initialize() {
    let mut guard = lock();
    if guard.is_none() {
        debug!("initializing nodefn runtime");
        *guard = Some(RuntimeContext::new());
    }
}

/// Tear down the runtime context
///
/// Owned handles obtained earlier stay valid; borrowed type handles do not.
pub fn shutdown() {
    if let Some(mut context) = lock().take() {
        context.types.shutdown();
        debug!("nodefn runtime shut down");
    }
}

// C entry points

#[unsafe(no_mangle)]
pub extern "C" fn nodefn_initialize() {
    initialize();
}

#[unsafe(no_mangle)]
pub extern "C" fn nodefn_shutdown() {
    shutdown();
}

/// Replace the compiler configuration with TOML text
///
/// Returns false (and sets the error) on invalid TOML or if the runtime is
/// not initialized. Affects graphs compiled afterwards.
///
/// # Safety
/// `config_toml` must be null or a valid null-terminated C string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_set_config(config_toml: *const c_char) -> bool {
    const OP: &str = "set_config";
    if config_toml.is_null() {
        set_error_in(OP, RuntimeError::NullPointer("config_toml"));
        return false;
    }
    let text = match unsafe { CStr::from_ptr(config_toml) }.to_str() {
        Ok(text) => text,
        Err(_) => {
            set_error_in(OP, RuntimeError::InvalidUtf8("config_toml"));
            return false;
        }
    };
    let config = match CompilerConfig::from_toml_str(text) {
        Ok(config) => config,
        Err(e) => {
            set_error_in(OP, e);
            return false;
        }
    };
    if let Err(e) = with_context(|context| context.config = config) {
        set_error_in(OP, e);
        return false;
    }
    true
}
