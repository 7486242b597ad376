//! List functions, generic over the element type
//!
//! Functions that produce a modified list relocate the input list out of
//! the input tuple and go through `get_mutable`, so a list that nobody else
//! holds is extended in place while a shared one is copied first.

use crate::function::{Function, SharedFunction};
use crate::list::SharedList;
use crate::signature::{Parameter, Signature};
use crate::tuple::Tuple;
use crate::types::{TypeKind, TypeRegistry};
use crate::value::{ListElement, Vector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    Append,
    Length,
    GetElement,
    Combine,
}

/// `(List list, T value) -> (List list)`
pub fn append_to_list<T: ListElement>(registry: &TypeRegistry) -> SharedFunction {
    let list_ty = registry.borrow(T::LIST_KIND);
    let signature = Signature::new(
        vec![
            Parameter::new("list", list_ty),
            Parameter::new("value", registry.borrow(T::KIND)),
        ],
        vec![Parameter::new("list", list_ty)],
    );
    Function::builder(format!("Append {}", T::KIND), signature)
        .call_body(|fn_in: &mut Tuple, fn_out: &mut Tuple| {
            let list = fn_in.relocate_out::<SharedList<T>>(0)?;
            let value = fn_in.get::<T>(1)?;
            let mut list = list.get_mutable();
            list.append(value)?;
            fn_out.set(0, list)
        })
        .build()
}

pub fn append_float(registry: &TypeRegistry) -> SharedFunction {
    append_to_list::<f32>(registry)
}

/// `(List list) -> (Int32 length)`
pub fn list_length<T: ListElement>(registry: &TypeRegistry) -> SharedFunction {
    let signature = Signature::new(
        vec![Parameter::new("list", registry.borrow(T::LIST_KIND))],
        vec![Parameter::new("length", registry.int32())],
    );
    Function::builder(format!("{} Length", T::LIST_KIND), signature)
        .call_body(|fn_in: &mut Tuple, fn_out: &mut Tuple| {
            let len = fn_in.get_ref::<SharedList<T>>(0)?.len();
            fn_out.set(0, i32::try_from(len).unwrap_or(i32::MAX))
        })
        .build()
}

/// `(List list, Int32 index, T fallback) -> (T element)`
///
/// Out-of-range indices (including negative ones) produce `fallback`.
pub fn get_list_element<T: ListElement>(registry: &TypeRegistry) -> SharedFunction {
    let element_ty = registry.borrow(T::KIND);
    let signature = Signature::new(
        vec![
            Parameter::new("list", registry.borrow(T::LIST_KIND)),
            Parameter::new("index", registry.int32()),
            Parameter::new("fallback", element_ty),
        ],
        vec![Parameter::new("element", element_ty)],
    );
    Function::builder(format!("Get {} Element", T::LIST_KIND), signature)
        .call_body(|fn_in: &mut Tuple, fn_out: &mut Tuple| {
            let index = fn_in.get::<i32>(1)?;
            let list = fn_in.get_ref::<SharedList<T>>(0)?;
            let element = usize::try_from(index)
                .ok()
                .and_then(|i| list.get(i).cloned());
            let element = match element {
                Some(element) => element,
                None => fn_in.relocate_out::<T>(2)?,
            };
            fn_out.set(0, element)
        })
        .build()
}

/// `(List a, List b) -> (List list)`
pub fn combine_lists<T: ListElement>(registry: &TypeRegistry) -> SharedFunction {
    let list_ty = registry.borrow(T::LIST_KIND);
    let signature = Signature::new(
        vec![Parameter::new("a", list_ty), Parameter::new("b", list_ty)],
        vec![Parameter::new("list", list_ty)],
    );
    Function::builder(format!("Combine {}s", T::LIST_KIND), signature)
        .call_body(|fn_in: &mut Tuple, fn_out: &mut Tuple| {
            let mut combined = fn_in.relocate_out::<SharedList<T>>(0)?.get_mutable();
            let tail = fn_in.get_ref::<SharedList<T>>(1)?;
            combined.extend_from(tail)?;
            fn_out.set(0, combined)
        })
        .build()
}

/// Element-type dispatch for callers that only know the kind at runtime
pub fn list_function(registry: &TypeRegistry, op: ListOp, element: TypeKind) -> Option<SharedFunction> {
    fn typed<T: ListElement>(registry: &TypeRegistry, op: ListOp) -> SharedFunction {
        match op {
            ListOp::Append => append_to_list::<T>(registry),
            ListOp::Length => list_length::<T>(registry),
            ListOp::GetElement => get_list_element::<T>(registry),
            ListOp::Combine => combine_lists::<T>(registry),
        }
    }

    match element {
        TypeKind::Float => Some(typed::<f32>(registry, op)),
        TypeKind::Int32 => Some(typed::<i32>(registry, op)),
        TypeKind::FVec3 => Some(typed::<Vector>(registry, op)),
        _ => None,
    }
}
