//! Tuples: typed register files for one call's inputs or outputs
//!
//! Each slot is bound to a [`Type`] when the tuple is created and is either
//! empty or holds one value of that type. Reading an empty slot fails with
//! [`FnError::UninitializedRead`]; accessing a slot as the wrong Rust type
//! fails with [`FnError::TypeMismatch`].
//!
//! Ownership rules for reference-counted values (lists):
//! - `set` takes the caller's handle
//! - `copy_in` shares the caller's value, leaving the caller's handle alone
//! - `get` returns another shared handle
//! - `relocate_out` hands the slot's handle to the caller and empties the slot

use crate::error::FnError;
use crate::types::{Type, TypeKind};
use crate::value::{TupleValue, Value};
use std::fmt;

pub struct Tuple {
    types: Vec<Type>,
    slots: Vec<Option<Value>>,
}

impl Tuple {
    pub fn new(types: &[Type]) -> Self {
        Tuple {
            types: types.to_vec(),
            slots: vec![None; types.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn type_at(&self, index: usize) -> Result<&Type, FnError> {
        self.types.get(index).ok_or(FnError::IndexOutOfRange {
            index,
            len: self.types.len(),
        })
    }

    pub fn is_initialized(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    pub fn all_initialized(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Indices of empty slots, for diagnostics
    pub fn uninitialized_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn set<T: TupleValue>(&mut self, index: usize, value: T) -> Result<(), FnError> {
        self.check_kind(index, T::KIND)?;
        self.slots[index] = Some(value.into_value());
        Ok(())
    }

    pub fn copy_in<T: TupleValue + Clone>(&mut self, index: usize, value: &T) -> Result<(), FnError> {
        self.set(index, value.clone())
    }

    pub fn get<T: TupleValue + Clone>(&self, index: usize) -> Result<T, FnError> {
        self.get_ref::<T>(index).cloned()
    }

    pub fn get_ref<T: TupleValue>(&self, index: usize) -> Result<&T, FnError> {
        self.check_kind(index, T::KIND)?;
        let value = self.slots[index]
            .as_ref()
            .ok_or(FnError::UninitializedRead { index })?;
        T::from_value_ref(value).ok_or_else(|| self.mismatch(index, T::KIND))
    }

    pub fn relocate_out<T: TupleValue>(&mut self, index: usize) -> Result<T, FnError> {
        self.check_kind(index, T::KIND)?;
        let value = self.slots[index]
            .take()
            .ok_or(FnError::UninitializedRead { index })?;
        T::from_value(value).ok_or_else(|| self.mismatch(index, T::KIND))
    }

    /// Store a dynamically typed value
    pub fn set_value(&mut self, index: usize, value: Value) -> Result<(), FnError> {
        self.check_kind(index, value.kind())?;
        self.slots[index] = Some(value);
        Ok(())
    }

    pub fn copy_value(&self, index: usize) -> Result<Value, FnError> {
        self.type_at(index)?;
        self.slots[index]
            .clone()
            .ok_or(FnError::UninitializedRead { index })
    }

    pub fn relocate_value(&mut self, index: usize) -> Result<Value, FnError> {
        self.type_at(index)?;
        self.slots[index]
            .take()
            .ok_or(FnError::UninitializedRead { index })
    }

    /// Empty every slot, releasing held values
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
    }

    fn check_kind(&self, index: usize, requested: TypeKind) -> Result<(), FnError> {
        let declared = self.type_at(index)?;
        if declared.kind() != requested {
            return Err(self.mismatch(index, requested));
        }
        Ok(())
    }

    fn mismatch(&self, index: usize, requested: TypeKind) -> FnError {
        FnError::TypeMismatch {
            index,
            declared: self.types[index].name().to_string(),
            requested: requested.name().to_string(),
        }
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (ty, slot)) in self.types.iter().zip(&self.slots).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match slot {
                Some(value) => write!(f, "{}: {}", ty, value)?,
                None => write!(f, "{}: <uninitialized>", ty)?,
            }
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tuple{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::SharedList;
    use crate::types::TypeRegistry;
    use crate::value::Vector;

    fn float_float(registry: &TypeRegistry) -> Tuple {
        Tuple::new(&[registry.get(TypeKind::Float), registry.get(TypeKind::Float)])
    }

    #[test]
    fn test_all_initialized_progression() {
        let registry = TypeRegistry::new();
        let mut tuple = float_float(&registry);
        assert!(!tuple.all_initialized());
        tuple.set(0, 3.0f32).unwrap();
        assert!(!tuple.all_initialized());
        assert_eq!(tuple.uninitialized_slots(), vec![1]);
        tuple.set(1, 4.0f32).unwrap();
        assert!(tuple.all_initialized());
    }

    #[test]
    fn test_get_before_set() {
        let registry = TypeRegistry::new();
        let tuple = float_float(&registry);
        assert_eq!(
            tuple.get::<f32>(1),
            Err(FnError::UninitializedRead { index: 1 })
        );
    }

    #[test]
    fn test_type_mismatch_on_get() {
        let registry = TypeRegistry::new();
        let mut tuple = float_float(&registry);
        tuple.set(0, 1.0f32).unwrap();
        assert_eq!(
            tuple.get::<i32>(0),
            Err(FnError::TypeMismatch {
                index: 0,
                declared: "Float".to_string(),
                requested: "Int32".to_string(),
            })
        );
    }

    #[test]
    fn test_type_mismatch_on_set() {
        let registry = TypeRegistry::new();
        let mut tuple = Tuple::new(&[registry.get(TypeKind::FVec3)]);
        assert!(matches!(
            tuple.set(0, 2i32),
            Err(FnError::TypeMismatch { index: 0, .. })
        ));
        assert!(!tuple.is_initialized(0));
        tuple.set(0, Vector::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(tuple.get::<Vector>(0).unwrap(), Vector::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_index_out_of_range() {
        let registry = TypeRegistry::new();
        let mut tuple = float_float(&registry);
        assert_eq!(
            tuple.set(2, 1.0f32),
            Err(FnError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_relocate_out_empties_slot() {
        let registry = TypeRegistry::new();
        let mut tuple = float_float(&registry);
        tuple.set(0, 5.0f32).unwrap();
        assert_eq!(tuple.relocate_out::<f32>(0).unwrap(), 5.0);
        assert!(!tuple.is_initialized(0));
        assert_eq!(
            tuple.get::<f32>(0),
            Err(FnError::UninitializedRead { index: 0 })
        );
    }

    #[test]
    fn test_list_reference_counts() {
        let registry = TypeRegistry::new();
        let mut tuple = Tuple::new(&[registry.get(TypeKind::FloatList)]);
        let list = SharedList::<f32>::new();
        assert_eq!(list.users(), 1);

        tuple.copy_in(0, &list).unwrap();
        assert_eq!(list.users(), 2);

        let fetched: SharedList<f32> = tuple.get(0).unwrap();
        assert_eq!(list.users(), 3);
        drop(fetched);

        let relocated: SharedList<f32> = tuple.relocate_out(0).unwrap();
        assert_eq!(list.users(), 2);
        assert!(relocated.ptr_eq(&list));
        drop(relocated);
        assert_eq!(list.users(), 1);
    }

    #[test]
    fn test_set_releases_previous_value() {
        let registry = TypeRegistry::new();
        let mut tuple = Tuple::new(&[registry.get(TypeKind::Int32List)]);
        let first = SharedList::from_vec(vec![1]);
        tuple.copy_in(0, &first).unwrap();
        assert_eq!(first.users(), 2);
        tuple.set(0, SharedList::from_vec(vec![2])).unwrap();
        assert_eq!(first.users(), 1);
    }

    #[test]
    fn test_drop_releases_values() {
        let registry = TypeRegistry::new();
        let list = SharedList::from_vec(vec![Vector::ZERO]);
        {
            let mut tuple = Tuple::new(&[registry.get(TypeKind::FVec3List)]);
            tuple.copy_in(0, &list).unwrap();
            assert_eq!(list.users(), 2);
        }
        assert_eq!(list.users(), 1);
    }

    #[test]
    fn test_tuple_holds_type_references() {
        let registry = TypeRegistry::new();
        let tuple = float_float(&registry);
        assert_eq!(registry.float().users(), 3);
        drop(tuple);
        assert_eq!(registry.float().users(), 1);
    }

    #[test]
    fn test_dynamic_values() {
        let registry = TypeRegistry::new();
        let mut tuple = Tuple::new(&[registry.get(TypeKind::Int32)]);
        assert!(tuple.set_value(0, Value::Float(1.0)).is_err());
        tuple.set_value(0, Value::Int32(9)).unwrap();
        assert_eq!(tuple.copy_value(0).unwrap(), Value::Int32(9));
        assert_eq!(tuple.relocate_value(0).unwrap(), Value::Int32(9));
        assert!(tuple.relocate_value(0).is_err());
    }

    #[test]
    fn test_display() {
        let registry = TypeRegistry::new();
        let mut tuple = float_float(&registry);
        tuple.set(0, 1.5f32).unwrap();
        assert_eq!(tuple.to_string(), "(Float: 1.5, Float: <uninitialized>)");
    }
}
