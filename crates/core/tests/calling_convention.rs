//! Calling-convention tests across types, tuples, lists and functions
//!
//! Each test follows one value through the public API the way a compiled
//! graph or a host would use it.

use nodefn_core::builtins::{MathOp, append_to_list, float_math, list_length};
use nodefn_core::{
    FnError, Function, Parameter, SharedList, Signature, Tuple, TypeKind, TypeRegistry, Value,
};

#[test]
fn test_registry_memoizes_types() {
    let types = TypeRegistry::new();
    assert_eq!(types.created_count(), 0);

    let a = types.get_or_create("Float List").unwrap();
    let b = types.get(TypeKind::FloatList);
    assert_eq!(a, b);
    assert_eq!(a.as_ptr(), b.as_ptr());
    assert_eq!(types.created_count(), 1);

    // A second registry hands out distinct descriptors
    let other = TypeRegistry::new();
    assert_ne!(other.float(), types.float());
}

#[test]
fn test_tuple_slot_lifecycle() {
    let types = TypeRegistry::new();
    let mut tuple = Tuple::new(&[types.float().clone(), types.get(TypeKind::FloatList)]);
    assert!(!tuple.all_initialized());
    assert_eq!(tuple.uninitialized_slots(), vec![0, 1]);

    tuple.set(0, 2.5f32).unwrap();
    assert_eq!(tuple.uninitialized_slots(), vec![1]);
    tuple.set(1, SharedList::from_vec(vec![1.0f32])).unwrap();
    assert!(tuple.all_initialized());

    let list: SharedList<f32> = tuple.relocate_out(1).unwrap();
    assert_eq!(list.as_slice(), &[1.0]);
    assert!(!tuple.is_initialized(1));
    assert_eq!(
        tuple.get::<SharedList<f32>>(1),
        Err(FnError::UninitializedRead { index: 1 })
    );
    assert_eq!(tuple.get::<f32>(0).unwrap(), 2.5);
}

#[test]
fn test_wrong_type_access() {
    let types = TypeRegistry::new();
    let mut tuple = Tuple::new(&[types.float().clone()]);
    tuple.set(0, 1.0f32).unwrap();

    assert!(matches!(
        tuple.get::<i32>(0),
        Err(FnError::TypeMismatch { index: 0, .. })
    ));
    assert!(matches!(
        tuple.set(0, 3i32),
        Err(FnError::TypeMismatch { index: 0, .. })
    ));
    assert!(matches!(
        tuple.set_value(0, Value::Int32(3)),
        Err(FnError::TypeMismatch { .. })
    ));
    // The stored value survives the failed writes
    assert_eq!(tuple.get::<f32>(0).unwrap(), 1.0);
}

#[test]
fn test_copy_on_write() {
    let list = SharedList::from_vec(vec![1, 2, 3]);
    let shared = list.clone();
    assert_eq!(list.users(), 2);

    let mut copy = shared.get_mutable();
    assert!(!copy.ptr_eq(&list));
    copy.append(4).unwrap();
    assert_eq!(list.as_slice(), &[1, 2, 3]);
    assert_eq!(copy.as_slice(), &[1, 2, 3, 4]);

    let mut alias = list.clone();
    assert_eq!(alias.append(5), Err(FnError::ImmutableViolation { users: 2 }));
    drop(list);
    let unique = alias.get_mutable();
    assert_eq!(unique.users(), 1);
}

#[test]
fn test_unique_list_is_reused_by_append() {
    let types = TypeRegistry::new();
    let append = append_to_list::<f32>(&types);
    let mut data = Vec::with_capacity(4);
    data.extend([1.0f32, 2.0]);
    let list = SharedList::from_vec(data);
    let buffer = list.as_slice().as_ptr();

    let mut fn_in = append.input_tuple();
    let mut fn_out = append.output_tuple();
    fn_in.set(0, list).unwrap();
    fn_in.set(1, 3.0f32).unwrap();
    append.call(&mut fn_in, &mut fn_out).unwrap();

    let result: SharedList<f32> = fn_out.relocate_out(0).unwrap();
    assert_eq!(result.as_slice(), &[1.0, 2.0, 3.0]);
    assert_eq!(result.users(), 1);
    assert_eq!(result.as_slice().as_ptr(), buffer);
    assert!(!fn_in.is_initialized(0));
}

#[test]
fn test_unfinished_input_is_rejected() {
    let types = TypeRegistry::new();
    let add = float_math(&types, MathOp::Add);
    let mut fn_in = add.input_tuple();
    let mut fn_out = add.output_tuple();
    fn_in.set(0, 3.0f32).unwrap();

    let err = add.call(&mut fn_in, &mut fn_out).unwrap_err();
    assert!(matches!(err, FnError::ContractViolation { .. }));
    assert_eq!(fn_out.uninitialized_slots(), vec![0]);

    fn_in.set(1, 4.0f32).unwrap();
    add.call(&mut fn_in, &mut fn_out).unwrap();
    assert_eq!(fn_out.get::<f32>(0).unwrap(), 7.0);
}

#[test]
fn test_body_must_fill_outputs() {
    let types = TypeRegistry::new();
    let lazy = Function::builder(
        "Lazy",
        Signature::new(vec![], vec![Parameter::new("x", types.int32())]),
    )
    .call_body(|_: &mut Tuple, _: &mut Tuple| Ok::<(), FnError>(()))
    .build();

    let mut fn_in = lazy.input_tuple();
    let mut fn_out = lazy.output_tuple();
    let err = lazy.call(&mut fn_in, &mut fn_out).unwrap_err();
    assert_eq!(
        err.to_string(),
        "contract violation in 'Lazy': output slots [0] not initialized after call"
    );
}

#[test]
fn test_wrong_tuple_layout_is_rejected() {
    let types = TypeRegistry::new();
    let add = float_math(&types, MathOp::Add);
    let length = list_length::<i32>(&types);

    let mut fn_in = length.input_tuple();
    fn_in.set(0, SharedList::from_vec(vec![1i32])).unwrap();
    let mut fn_out = add.output_tuple();
    assert!(matches!(
        add.call(&mut fn_in, &mut fn_out),
        Err(FnError::ContractViolation { .. })
    ));
    assert!(fn_in.is_initialized(0));
}
