//! C-linkage API
//!
//! Opaque handles over the core types:
//!
//! | Handle            | Rust side        | Ownership                                  |
//! |-------------------|------------------|--------------------------------------------|
//! | `FnFunction`      | `Arc<Function>`  | owned; release with `nodefn_function_free` |
//! | `FnCallable`      | `&Function`      | borrowed from its `FnFunction`             |
//! | `FnTuple`         | `Box<Tuple>`     | owned; release with `nodefn_tuple_free`    |
//! | `FnType`          | `Type`           | owned from `get_*`, borrowed from `borrow_*` |
//!
//! Every entry point reports failure through its sentinel return value
//! (null, `false`, zero) and the thread-local error state in
//! [`crate::error`]. Panics in call bodies are caught at the boundary.

use crate::context::with_context;
use crate::error::{RuntimeError, format_panic_payload, set_error_in};
use nodefn_core::{
    Dependency, DependencySink, Function, SharedFunction, Tuple, TupleValue, Type, TypeInfo,
    TypeKind, Vector,
};
use nodefnc::NodeGraph;
use std::ffi::{CStr, CString, c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::Arc;

pub type FnFunction = *const Function;
pub type FnCallable = *const Function;
pub type FnTuple = *mut Tuple;
pub type FnType = *const TypeInfo;

/// Dependency kinds passed to [`FnDependencySink`]
pub const NODEFN_DEPENDENCY_TRANSFORM: u32 = 0;
pub const NODEFN_DEPENDENCY_GEOMETRY: u32 = 1;

/// Host callback receiving one dependency: `(user_data, kind, object, description)`
pub type FnDependencySink =
    extern "C" fn(user_data: *mut c_void, kind: u32, object: *const c_char, description: *const c_char);

// Handle helpers

unsafe fn function_ref<'a>(function: FnFunction) -> Result<&'a Function, RuntimeError> {
    if function.is_null() {
        return Err(RuntimeError::NullPointer("function"));
    }
    Ok(unsafe { &*function })
}

unsafe fn tuple_ref<'a>(tuple: FnTuple) -> Result<&'a mut Tuple, RuntimeError> {
    if tuple.is_null() {
        return Err(RuntimeError::NullPointer("tuple"));
    }
    Ok(unsafe { &mut *tuple })
}

/// Owned handle for a type pointer the caller holds (borrowed or owned)
unsafe fn type_handle(ty: FnType) -> Result<Type, RuntimeError> {
    if ty.is_null() {
        return Err(RuntimeError::NullPointer("type"));
    }
    Ok(unsafe { Type::clone_from_raw(ty) })
}

/// Types from a null-terminated array of type pointers
unsafe fn type_list(types: *const FnType) -> Result<Vec<Type>, RuntimeError> {
    if types.is_null() {
        return Err(RuntimeError::NullPointer("type array"));
    }
    let mut list = Vec::new();
    let mut cursor = types;
    loop {
        let ty = unsafe { *cursor };
        if ty.is_null() {
            return Ok(list);
        }
        list.push(unsafe { Type::clone_from_raw(ty) });
        cursor = unsafe { cursor.add(1) };
    }
}

unsafe fn graph_from_json(graph_json: *const c_char) -> Result<NodeGraph, String> {
    if graph_json.is_null() {
        return Err(RuntimeError::NullPointer("graph").to_string());
    }
    let text = unsafe { CStr::from_ptr(graph_json) }
        .to_str()
        .map_err(|_| RuntimeError::InvalidUtf8("graph").to_string())?;
    NodeGraph::from_json(text).map_err(|e| e.to_string())
}

fn into_handle(function: SharedFunction) -> FnFunction {
    Arc::into_raw(function)
}

// Runtime-wide type handles

fn type_get(op: &str, kind: TypeKind) -> FnType {
    match with_context(|context| context.types.get(kind)) {
        Ok(ty) => ty.into_raw(),
        Err(e) => {
            set_error_in(op, e);
            ptr::null()
        }
    }
}

fn type_borrow(op: &str, kind: TypeKind) -> FnType {
    match with_context(|context| context.types.borrow(kind).as_ptr()) {
        Ok(ptr) => ptr,
        Err(e) => {
            set_error_in(op, e);
            ptr::null()
        }
    }
}

/// Owned Float type handle; release with `nodefn_type_free`
#[unsafe(no_mangle)]
pub extern "C" fn nodefn_type_get_float() -> FnType {
    type_get("type_get_float", TypeKind::Float)
}

#[unsafe(no_mangle)]
pub extern "C" fn nodefn_type_get_int32() -> FnType {
    type_get("type_get_int32", TypeKind::Int32)
}

#[unsafe(no_mangle)]
pub extern "C" fn nodefn_type_get_fvec3() -> FnType {
    type_get("type_get_fvec3", TypeKind::FVec3)
}

/// Borrowed Float type handle, valid until `nodefn_shutdown`; do not free
#[unsafe(no_mangle)]
pub extern "C" fn nodefn_type_borrow_float() -> FnType {
    type_borrow("type_borrow_float", TypeKind::Float)
}

#[unsafe(no_mangle)]
pub extern "C" fn nodefn_type_borrow_int32() -> FnType {
    type_borrow("type_borrow_int32", TypeKind::Int32)
}

#[unsafe(no_mangle)]
pub extern "C" fn nodefn_type_borrow_fvec3() -> FnType {
    type_borrow("type_borrow_fvec3", TypeKind::FVec3)
}

/// Owned handle for any type name, e.g. "Float List"
///
/// # Safety
/// `name` must be null or a valid null-terminated C string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_type_get_named(name: *const c_char) -> FnType {
    const OP: &str = "type_get_named";
    if name.is_null() {
        set_error_in(OP, RuntimeError::NullPointer("name"));
        return ptr::null();
    }
    let Ok(name) = unsafe { CStr::from_ptr(name) }.to_str() else {
        set_error_in(OP, RuntimeError::InvalidUtf8("name"));
        return ptr::null();
    };
    match with_context(|context| context.types.get_or_create(name)) {
        Ok(Ok(ty)) => ty.into_raw(),
        Ok(Err(e)) => {
            set_error_in(OP, e);
            ptr::null()
        }
        Err(e) => {
            set_error_in(OP, e);
            ptr::null()
        }
    }
}

/// Static name of a type; never freed
///
/// # Safety
/// `ty` must be null or a live type handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_type_name(ty: FnType) -> *const c_char {
    if ty.is_null() {
        set_error_in("type_name", RuntimeError::NullPointer("type"));
        return ptr::null();
    }
    let name: &'static CStr = match unsafe { (*ty).kind() } {
        TypeKind::Float => c"Float",
        TypeKind::Int32 => c"Int32",
        TypeKind::FVec3 => c"FVec3",
        TypeKind::FloatList => c"Float List",
        TypeKind::Int32List => c"Int32 List",
        TypeKind::FVec3List => c"FVec3 List",
    };
    name.as_ptr()
}

/// Release an owned type handle
///
/// # Safety
/// `ty` must be null or an owned handle from `nodefn_type_get_*`, freed once
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_type_free(ty: FnType) {
    if !ty.is_null() {
        drop(unsafe { Type::from_raw(ty) });
    }
}

// Functions

/// Compile a JSON node graph; null on failure
///
/// # Safety
/// `graph_json` must be null or a valid null-terminated C string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_tree_to_function(graph_json: *const c_char) -> FnFunction {
    const OP: &str = "tree_to_function";
    let graph = match unsafe { graph_from_json(graph_json) } {
        Ok(graph) => graph,
        Err(e) => {
            set_error_in(OP, e);
            return ptr::null();
        }
    };
    match with_context(|context| context.compiler().try_compile(&graph)) {
        Ok(Ok(function)) => into_handle(function),
        Ok(Err(e)) => {
            set_error_in(OP, e);
            ptr::null()
        }
        Err(e) => {
            set_error_in(OP, e);
            ptr::null()
        }
    }
}

/// Compile a JSON node graph and keep it only if its signature has the
/// given types; null on failure or mismatch
///
/// # Safety
/// - `graph_json` must be null or a valid null-terminated C string
/// - `inputs` and `outputs` must be null-terminated arrays of live type handles
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_function_get_with_signature(
    graph_json: *const c_char,
    inputs: *const FnType,
    outputs: *const FnType,
) -> FnFunction {
    const OP: &str = "function_get_with_signature";
    let graph = match unsafe { graph_from_json(graph_json) } {
        Ok(graph) => graph,
        Err(e) => {
            set_error_in(OP, e);
            return ptr::null();
        }
    };
    let types = unsafe { type_list(inputs).and_then(|i| Ok((i, type_list(outputs)?))) };
    let (inputs, outputs) = match types {
        Ok(types) => types,
        Err(e) => {
            set_error_in(OP, e);
            return ptr::null();
        }
    };
    let compiled = with_context(|context| {
        context
            .compiler()
            .try_compile_with_signature(&graph, &inputs, &outputs)
    });
    match compiled {
        Ok(Ok(function)) => into_handle(function),
        Ok(Err(e)) => {
            set_error_in(OP, e);
            ptr::null()
        }
        Err(e) => {
            set_error_in(OP, e);
            ptr::null()
        }
    }
}

/// Release a function handle
///
/// # Safety
/// `function` must be null or a handle from this API, freed once
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_function_free(function: FnFunction) {
    if !function.is_null() {
        drop(unsafe { Arc::from_raw(function) });
    }
}

/// # Safety
/// `function` must be null or a live function handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_function_input_count(function: FnFunction) -> u32 {
    match unsafe { function_ref(function) } {
        Ok(function) => function.signature().inputs().len() as u32,
        Err(e) => {
            set_error_in("function_input_count", e);
            0
        }
    }
}

/// # Safety
/// `function` must be null or a live function handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_function_output_count(function: FnFunction) -> u32 {
    match unsafe { function_ref(function) } {
        Ok(function) => function.signature().outputs().len() as u32,
        Err(e) => {
            set_error_in("function_output_count", e);
            0
        }
    }
}

/// Whether input `index` has type `ty`; false for out-of-range indices
///
/// # Safety
/// `function` and `ty` must be null or live handles
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_function_has_input_type(
    function: FnFunction,
    index: u32,
    ty: FnType,
) -> bool {
    match unsafe { function_ref(function).and_then(|f| Ok((f, type_handle(ty)?))) } {
        Ok((function, ty)) => function.signature().input_has_type(index as usize, &ty),
        Err(e) => {
            set_error_in("function_has_input_type", e);
            false
        }
    }
}

/// # Safety
/// `function` and `ty` must be null or live handles
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_function_has_output_type(
    function: FnFunction,
    index: u32,
    ty: FnType,
) -> bool {
    match unsafe { function_ref(function).and_then(|f| Ok((f, type_handle(ty)?))) } {
        Ok((function, ty)) => function.signature().output_has_type(index as usize, &ty),
        Err(e) => {
            set_error_in("function_has_output_type", e);
            false
        }
    }
}

/// Whether the signature has exactly these input and output types
///
/// # Safety
/// - `function` must be null or a live function handle
/// - `inputs` and `outputs` must be null-terminated arrays of live type handles
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_function_has_signature(
    function: FnFunction,
    inputs: *const FnType,
    outputs: *const FnType,
) -> bool {
    let checked = unsafe {
        function_ref(function).and_then(|f| {
            let inputs = type_list(inputs)?;
            let outputs = type_list(outputs)?;
            Ok(f.signature().has_types(&inputs, &outputs))
        })
    };
    checked.unwrap_or_else(|e| {
        set_error_in("function_has_signature", e);
        false
    })
}

/// Print the function's name and signature to stdout
///
/// # Safety
/// `function` must be null or a live function handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_function_print(function: FnFunction) {
    match unsafe { function_ref(function) } {
        Ok(function) => println!("{}", function),
        Err(e) => set_error_in("function_print", e),
    }
}

/// Function description as a newly allocated C string
///
/// Release with `nodefn_string_free`.
///
/// # Safety
/// `function` must be null or a live function handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_function_describe(function: FnFunction) -> *mut c_char {
    match unsafe { function_ref(function) } {
        Ok(function) => CString::new(function.to_string().replace('\0', "?"))
            .map(CString::into_raw)
            .unwrap_or(ptr::null_mut()),
        Err(e) => {
            set_error_in("function_describe", e);
            ptr::null_mut()
        }
    }
}

/// # Safety
/// `s` must be null or a string from `nodefn_function_describe`, freed once
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Callable view of a function; null if it has no call body
///
/// The callable is borrowed: it lives as long as the function handle.
///
/// # Safety
/// `function` must be null or a live function handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_function_get_callable(function: FnFunction) -> FnCallable {
    match unsafe { function_ref(function) } {
        Ok(f) if f.call_body().is_some() => function,
        Ok(_) => {
            set_error_in("function_get_callable", RuntimeError::NotCallable);
            ptr::null()
        }
        Err(e) => {
            set_error_in("function_get_callable", e);
            ptr::null()
        }
    }
}

/// Run a callable on an input and an output tuple
///
/// Returns false on contract violations, body errors and panics; the
/// output tuple is untouched when inputs are incomplete.
///
/// # Safety
/// - `callable` must be null or from `nodefn_function_get_callable`
/// - `fn_in` and `fn_out` must be null or live tuple handles; passing the
///   same handle twice is rejected
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_function_call(
    callable: FnCallable,
    fn_in: FnTuple,
    fn_out: FnTuple,
) -> bool {
    const OP: &str = "function_call";
    if !fn_in.is_null() && ptr::eq(fn_in, fn_out) {
        set_error_in(OP, RuntimeError::AliasedTuples);
        return false;
    }
    let handles = unsafe {
        function_ref(callable).and_then(|f| Ok((f, tuple_ref(fn_in)?, tuple_ref(fn_out)?)))
    };
    let (function, fn_in, fn_out) = match handles {
        Ok(handles) => handles,
        Err(e) => {
            set_error_in(OP, e);
            return false;
        }
    };
    match panic::catch_unwind(AssertUnwindSafe(|| function.call(fn_in, fn_out))) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            set_error_in(OP, e);
            false
        }
        Err(payload) => {
            set_error_in(OP, RuntimeError::Panic(format_panic_payload(payload.as_ref())));
            false
        }
    }
}

/// Push the function's dependencies to a host callback
///
/// Returns whether the function declares dependencies at all.
///
/// # Safety
/// - `function` must be null or a live function handle
/// - `sink` must be safe to call with `user_data` for the duration of this call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_function_update_dependencies(
    function: FnFunction,
    sink: FnDependencySink,
    user_data: *mut c_void,
) -> bool {
    let function = match unsafe { function_ref(function) } {
        Ok(function) => function,
        Err(e) => {
            set_error_in("function_update_dependencies", e);
            return false;
        }
    };
    let mut deps = nodefn_core::Dependencies::new();
    if !function.dependencies(&mut deps) {
        return false;
    }
    deps.update_depsgraph(&mut CallbackSink { sink, user_data });
    true
}

struct CallbackSink {
    sink: FnDependencySink,
    user_data: *mut c_void,
}

impl DependencySink for CallbackSink {
    fn add_relation(&mut self, dependency: &Dependency, description: &str) {
        let kind = match dependency {
            Dependency::ObjectTransform(_) => NODEFN_DEPENDENCY_TRANSFORM,
            Dependency::ObjectGeometry(_) => NODEFN_DEPENDENCY_GEOMETRY,
        };
        let object = CString::new(dependency.object().replace('\0', "?")).unwrap_or_default();
        let description = CString::new(description.replace('\0', "?")).unwrap_or_default();
        (self.sink)(self.user_data, kind, object.as_ptr(), description.as_ptr());
    }
}

// Tuples

/// Empty tuple laid out for the function's inputs
///
/// # Safety
/// `function` must be null or a live function handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_tuple_for_input(function: FnFunction) -> FnTuple {
    match unsafe { function_ref(function) } {
        Ok(function) => Box::into_raw(Box::new(function.input_tuple())),
        Err(e) => {
            set_error_in("tuple_for_input", e);
            ptr::null_mut()
        }
    }
}

/// # Safety
/// `function` must be null or a live function handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_tuple_for_output(function: FnFunction) -> FnTuple {
    match unsafe { function_ref(function) } {
        Ok(function) => Box::into_raw(Box::new(function.output_tuple())),
        Err(e) => {
            set_error_in("tuple_for_output", e);
            ptr::null_mut()
        }
    }
}

/// # Safety
/// `tuple` must be null or a handle from `nodefn_tuple_for_*`, freed once
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_tuple_free(tuple: FnTuple) {
    if !tuple.is_null() {
        drop(unsafe { Box::from_raw(tuple) });
    }
}

unsafe fn tuple_set<T: TupleValue>(op: &str, tuple: FnTuple, index: u32, value: T) -> bool {
    let result = unsafe { tuple_ref(tuple) }
        .map_err(|e| e.to_string())
        .and_then(|t| t.set(index as usize, value).map_err(|e| e.to_string()));
    result.map_err(|e| set_error_in(op, e)).is_ok()
}

unsafe fn tuple_get<T: TupleValue + Clone>(op: &str, tuple: FnTuple, index: u32) -> Option<T> {
    let result = unsafe { tuple_ref(tuple) }
        .map_err(|e| e.to_string())
        .and_then(|t| t.get::<T>(index as usize).map_err(|e| e.to_string()));
    result.map_err(|e| set_error_in(op, e)).ok()
}

/// # Safety
/// `tuple` must be null or a live tuple handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_tuple_set_float(tuple: FnTuple, index: u32, value: f32) -> bool {
    unsafe { tuple_set("tuple_set_float", tuple, index, value) }
}

/// Float at `index`; 0.0 with the error set on failure
///
/// # Safety
/// `tuple` must be null or a live tuple handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_tuple_get_float(tuple: FnTuple, index: u32) -> f32 {
    unsafe { tuple_get("tuple_get_float", tuple, index) }.unwrap_or(0.0)
}

/// # Safety
/// `tuple` must be null or a live tuple handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_tuple_set_int32(tuple: FnTuple, index: u32, value: i32) -> bool {
    unsafe { tuple_set("tuple_set_int32", tuple, index, value) }
}

/// # Safety
/// `tuple` must be null or a live tuple handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_tuple_get_int32(tuple: FnTuple, index: u32) -> i32 {
    unsafe { tuple_get("tuple_get_int32", tuple, index) }.unwrap_or(0)
}

/// # Safety
/// - `tuple` must be null or a live tuple handle
/// - `value` must be null or point at three floats
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_tuple_set_float3(tuple: FnTuple, index: u32, value: *const f32) -> bool {
    if value.is_null() {
        set_error_in("tuple_set_float3", RuntimeError::NullPointer("value"));
        return false;
    }
    let components = unsafe { std::slice::from_raw_parts(value, 3) };
    let vector = Vector::new(components[0], components[1], components[2]);
    unsafe { tuple_set("tuple_set_float3", tuple, index, vector) }
}

/// Write the vector at `index` to `dst`; false with the error set on failure
///
/// # Safety
/// - `tuple` must be null or a live tuple handle
/// - `dst` must be null or point at room for three floats
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nodefn_tuple_get_float3(tuple: FnTuple, index: u32, dst: *mut f32) -> bool {
    if dst.is_null() {
        set_error_in("tuple_get_float3", RuntimeError::NullPointer("dst"));
        return false;
    }
    match unsafe { tuple_get::<Vector>("tuple_get_float3", tuple, index) } {
        Some(vector) => {
            let out = unsafe { std::slice::from_raw_parts_mut(dst, 3) };
            out.copy_from_slice(&vector.to_array());
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{initialize, shutdown};
    use crate::error::{clear_error, has_error, take_error};
    use serial_test::serial;

    const SUBTRACT: &CStr = c"{
        \"name\": \"subtract\",
        \"nodes\": [
            { \"name\": \"In\", \"kind\": \"fn_FunctionInputNode\",
              \"sockets\": [{ \"name\": \"a\", \"type\": \"Int32\" }, { \"name\": \"b\", \"type\": \"Int32\" }] },
            { \"name\": \"Sub\", \"kind\": \"fn_IntMathNode\", \"properties\": { \"operation\": \"subtract\" } },
            { \"name\": \"Out\", \"kind\": \"fn_FunctionOutputNode\",
              \"sockets\": [{ \"name\": \"result\", \"type\": \"Int32\" }] }
        ],
        \"links\": [
            { \"from\": { \"node\": \"In\", \"socket\": \"a\" }, \"to\": { \"node\": \"Sub\", \"socket\": \"a\" } },
            { \"from\": { \"node\": \"In\", \"socket\": \"b\" }, \"to\": { \"node\": \"Sub\", \"socket\": \"b\" } },
            { \"from\": { \"node\": \"Sub\", \"socket\": \"result\" }, \"to\": { \"node\": \"Out\", \"socket\": \"result\" } }
        ]
    }";

    #[test]
    #[serial]
    fn test_int_call_through_handles() {
        initialize();
        clear_error();
        unsafe {
            let function = nodefn_tree_to_function(SUBTRACT.as_ptr());
            assert!(!function.is_null());
            assert_eq!(nodefn_function_input_count(function), 2);
            assert_eq!(nodefn_function_output_count(function), 1);

            let int32 = nodefn_type_borrow_int32();
            assert!(nodefn_function_has_input_type(function, 1, int32));
            assert!(!nodefn_function_has_input_type(function, 2, int32));

            let callable = nodefn_function_get_callable(function);
            let fn_in = nodefn_tuple_for_input(function);
            let fn_out = nodefn_tuple_for_output(function);
            assert!(nodefn_tuple_set_int32(fn_in, 0, 10));
            assert!(nodefn_tuple_set_int32(fn_in, 1, 3));
            assert!(nodefn_function_call(callable, fn_in, fn_out));
            assert_eq!(nodefn_tuple_get_int32(fn_out, 0), 7);

            nodefn_tuple_free(fn_in);
            nodefn_tuple_free(fn_out);
            nodefn_function_free(function);
        }
        assert!(!has_error());
        shutdown();
    }

    #[test]
    #[serial]
    fn test_type_mismatch_sets_error() {
        initialize();
        clear_error();
        unsafe {
            let function = nodefn_tree_to_function(SUBTRACT.as_ptr());
            let fn_in = nodefn_tuple_for_input(function);
            assert!(!nodefn_tuple_set_float(fn_in, 0, 1.5));
            let msg = take_error().unwrap();
            assert!(msg.starts_with("tuple_set_float:"), "{}", msg);

            assert_eq!(nodefn_tuple_get_int32(fn_in, 0), 0);
            assert!(take_error().is_some());

            nodefn_tuple_free(fn_in);
            nodefn_function_free(function);
        }
        shutdown();
    }

    #[test]
    #[serial]
    fn test_incomplete_input_leaves_output_untouched() {
        initialize();
        clear_error();
        unsafe {
            let function = nodefn_tree_to_function(SUBTRACT.as_ptr());
            let fn_in = nodefn_tuple_for_input(function);
            let fn_out = nodefn_tuple_for_output(function);
            assert!(nodefn_tuple_set_int32(fn_in, 0, 1));
            assert!(!nodefn_function_call(function, fn_in, fn_out));
            assert!((*fn_out).uninitialized_slots() == vec![0]);
            assert!(take_error().unwrap().contains("not initialized"));

            nodefn_tuple_free(fn_in);
            nodefn_tuple_free(fn_out);
            nodefn_function_free(function);
        }
        shutdown();
    }

    #[test]
    #[serial]
    fn test_same_tuple_for_input_and_output() {
        initialize();
        clear_error();
        unsafe {
            let function = nodefn_tree_to_function(SUBTRACT.as_ptr());
            let fn_in = nodefn_tuple_for_input(function);
            assert!(nodefn_tuple_set_int32(fn_in, 0, 10));
            assert!(nodefn_tuple_set_int32(fn_in, 1, 3));

            assert!(!nodefn_function_call(function, fn_in, fn_in));
            assert_eq!(
                take_error().unwrap(),
                "function_call: input and output tuple are the same handle"
            );
            assert_eq!(nodefn_tuple_get_int32(fn_in, 0), 10);
            assert_eq!(nodefn_tuple_get_int32(fn_in, 1), 3);

            let fn_out = nodefn_tuple_for_output(function);
            assert!(nodefn_function_call(function, fn_in, fn_out));
            assert_eq!(nodefn_tuple_get_int32(fn_out, 0), 7);

            nodefn_tuple_free(fn_in);
            nodefn_tuple_free(fn_out);
            nodefn_function_free(function);
        }
        assert!(!has_error());
        shutdown();
    }

    #[test]
    #[serial]
    fn test_uninitialized_runtime() {
        shutdown();
        clear_error();
        assert!(nodefn_type_get_float().is_null());
        assert!(take_error().unwrap().contains("not initialized"));
        assert!(unsafe { nodefn_tree_to_function(SUBTRACT.as_ptr()) }.is_null());
        assert!(has_error());
        clear_error();
    }

    #[test]
    #[serial]
    fn test_null_handles() {
        clear_error();
        unsafe {
            assert_eq!(nodefn_function_input_count(ptr::null()), 0);
            assert!(take_error().unwrap().contains("null pointer"));
            assert!(!nodefn_function_call(ptr::null(), ptr::null_mut(), ptr::null_mut()));
            assert!(has_error());
            nodefn_function_free(ptr::null());
            nodefn_tuple_free(ptr::null_mut());
            nodefn_type_free(ptr::null());
        }
        clear_error();
    }

    #[test]
    #[serial]
    fn test_panic_in_body_is_caught() {
        let types = nodefn_core::TypeRegistry::new();
        let function = Function::builder(
            "Panics",
            nodefn_core::Signature::new(vec![], vec![nodefn_core::Parameter::new("x", types.float())]),
        )
        .call_body(|_: &mut Tuple, _: &mut Tuple| -> Result<(), nodefn_core::FnError> {
            panic!("body exploded")
        })
        .build();
        clear_error();
        let handle = into_handle(function);
        unsafe {
            let fn_in = nodefn_tuple_for_input(handle);
            let fn_out = nodefn_tuple_for_output(handle);
            assert!(!nodefn_function_call(handle, fn_in, fn_out));
            assert_eq!(
                take_error().unwrap(),
                "function_call: panic in call body: body exploded"
            );
            nodefn_tuple_free(fn_in);
            nodefn_tuple_free(fn_out);
            nodefn_function_free(handle);
        }
    }
}
