//! Type descriptors and the registry that memoizes them
//!
//! A [`Type`] is a reference-counted descriptor. Two handles describe the
//! same type only when they point at the same allocation: equality is
//! identity, never a structural comparison. Structural questions ("is this
//! a list of floats?") go through [`Type::kind`] and the `is_*` predicates.
//!
//! The [`TypeRegistry`] hands out canonical handles, creating each
//! descriptor lazily on first request. There is no process-wide registry in
//! this crate; hosts construct one and keep it alive for as long as they
//! need the types it produced.

use crate::error::FnError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// The closed set of value kinds a slot can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeKind {
    Float,
    Int32,
    FVec3,
    #[serde(rename = "Float List")]
    FloatList,
    #[serde(rename = "Int32 List")]
    Int32List,
    #[serde(rename = "FVec3 List")]
    FVec3List,
}

impl TypeKind {
    pub const COUNT: usize = 6;

    pub const ALL: [TypeKind; TypeKind::COUNT] = [
        TypeKind::Float,
        TypeKind::Int32,
        TypeKind::FVec3,
        TypeKind::FloatList,
        TypeKind::Int32List,
        TypeKind::FVec3List,
    ];

    /// Canonical type name, as used in graph files and diagnostics
    pub fn name(self) -> &'static str {
        match self {
            TypeKind::Float => "Float",
            TypeKind::Int32 => "Int32",
            TypeKind::FVec3 => "FVec3",
            TypeKind::FloatList => "Float List",
            TypeKind::Int32List => "Int32 List",
            TypeKind::FVec3List => "FVec3 List",
        }
    }

    pub fn from_name(name: &str) -> Option<TypeKind> {
        TypeKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn is_list(self) -> bool {
        self.element().is_some()
    }

    /// Element kind of a list kind
    pub fn element(self) -> Option<TypeKind> {
        match self {
            TypeKind::FloatList => Some(TypeKind::Float),
            TypeKind::Int32List => Some(TypeKind::Int32),
            TypeKind::FVec3List => Some(TypeKind::FVec3),
            _ => None,
        }
    }

    /// List kind whose elements are of this kind
    pub fn list_of(self) -> Option<TypeKind> {
        match self {
            TypeKind::Float => Some(TypeKind::FloatList),
            TypeKind::Int32 => Some(TypeKind::Int32List),
            TypeKind::FVec3 => Some(TypeKind::FVec3List),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The shared part of a type handle
#[derive(Debug)]
pub struct TypeInfo {
    kind: TypeKind,
}

impl TypeInfo {
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Reference-counted type handle; cloning increments the count
#[derive(Clone)]
pub struct Type(Arc<TypeInfo>);

impl Type {
    fn create(kind: TypeKind) -> Self {
        Type(Arc::new(TypeInfo { kind }))
    }

    pub fn kind(&self) -> TypeKind {
        self.0.kind
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub fn is_list(&self) -> bool {
        self.kind().is_list()
    }

    /// Structural check: is this a list whose elements have `element`'s kind
    pub fn is_list_of(&self, element: &Type) -> bool {
        self.kind().element() == Some(element.kind())
    }

    /// Number of live handles to this descriptor (registry included)
    pub fn users(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    pub fn as_ptr(&self) -> *const TypeInfo {
        Arc::as_ptr(&self.0)
    }

    /// Give up this handle as a raw pointer, keeping its count
    pub fn into_raw(self) -> *const TypeInfo {
        Arc::into_raw(self.0)
    }

    /// Reclaim a handle produced by [`Type::into_raw`]
    ///
    /// # Safety
    /// `ptr` must come from `into_raw` and not have been reclaimed already.
    pub unsafe fn from_raw(ptr: *const TypeInfo) -> Self {
        Type(unsafe { Arc::from_raw(ptr) })
    }

    /// New owned handle from a borrowed raw pointer (increments the count)
    ///
    /// # Safety
    /// `ptr` must point at a live descriptor created by a registry.
    pub unsafe fn clone_from_raw(ptr: *const TypeInfo) -> Self {
        unsafe {
            Arc::increment_strong_count(ptr);
            Type::from_raw(ptr)
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Type {}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({} @ {:p})", self.name(), self.as_ptr())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Memoizing factory for canonical type handles
#[derive(Debug, Default)]
pub struct TypeRegistry {
    slots: [OnceLock<Type>; TypeKind::COUNT],
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// Owned handle for a type name, creating the descriptor on first use
    pub fn get_or_create(&self, name: &str) -> Result<Type, FnError> {
        self.borrow_named(name).cloned()
    }

    /// Borrowed handle for a type name; the caller does not own a count
    pub fn borrow_named(&self, name: &str) -> Result<&Type, FnError> {
        let kind = TypeKind::from_name(name).ok_or_else(|| FnError::UnknownType(name.to_string()))?;
        Ok(self.borrow(kind))
    }

    /// Owned handle for a kind
    pub fn get(&self, kind: TypeKind) -> Type {
        self.borrow(kind).clone()
    }

    /// Borrowed handle for a kind
    pub fn borrow(&self, kind: TypeKind) -> &Type {
        self.slots[kind.index()].get_or_init(|| {
            debug!(type_name = kind.name(), "creating type descriptor");
            Type::create(kind)
        })
    }

    pub fn float(&self) -> &Type {
        self.borrow(TypeKind::Float)
    }

    pub fn int32(&self) -> &Type {
        self.borrow(TypeKind::Int32)
    }

    pub fn fvec3(&self) -> &Type {
        self.borrow(TypeKind::FVec3)
    }

    /// Handle for the list type of an element kind
    pub fn list_of(&self, element: TypeKind) -> Option<&Type> {
        element.list_of().map(|kind| self.borrow(kind))
    }

    /// Number of descriptors memoized so far
    pub fn created_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }

    /// Drop the registry's own references
    ///
    /// Handles held elsewhere stay valid but are no longer canonical: the
    /// next request for the same name creates a new descriptor.
    pub fn shutdown(&mut self) {
        let mut released = 0;
        for slot in self.slots.iter_mut() {
            if slot.take().is_some() {
                released += 1;
            }
        }
        debug!(released, "type registry shut down");
    }
}
