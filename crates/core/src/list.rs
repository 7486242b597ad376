//! Copy-on-write shared lists
//!
//! A [`SharedList`] is an `Arc`-backed sequence. Cloning a handle shares the
//! allocation; mutation is only allowed while the handle is the sole user.
//! [`SharedList::get_mutable`] is the way to obtain a writable handle: it
//! keeps the allocation when unshared and copies it otherwise.
//!
//! Mutating methods check uniqueness at runtime and fail with
//! [`FnError::ImmutableViolation`] instead of silently copying, so that a
//! missing `get_mutable` shows up as an error rather than a hidden clone.

use crate::error::FnError;
use std::fmt;
use std::sync::Arc;

pub struct SharedList<T> {
    data: Arc<Vec<T>>,
}

impl<T> SharedList<T> {
    pub fn new() -> Self {
        SharedList {
            data: Arc::new(Vec::new()),
        }
    }

    pub fn from_vec(values: Vec<T>) -> Self {
        SharedList {
            data: Arc::new(values),
        }
    }

    /// Number of handles sharing this allocation
    pub fn users(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    /// True when in-place mutation is allowed
    pub fn is_mutable(&self) -> bool {
        self.users() == 1
    }

    /// Same allocation (not merely equal contents)
    pub fn ptr_eq(&self, other: &SharedList<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate the current elements; the iterator can be cloned to restart
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn append(&mut self, value: T) -> Result<(), FnError> {
        self.exclusive()?.push(value);
        Ok(())
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<(), FnError> {
        let data = self.exclusive()?;
        let len = data.len();
        let slot = data
            .get_mut(index)
            .ok_or(FnError::IndexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    fn exclusive(&mut self) -> Result<&mut Vec<T>, FnError> {
        let users = Arc::strong_count(&self.data);
        Arc::get_mut(&mut self.data).ok_or(FnError::ImmutableViolation { users })
    }
}

impl<T: Clone> SharedList<T> {
    /// New, uniquely owned list with the same elements
    pub fn copy(&self) -> SharedList<T> {
        SharedList::from_vec(self.data.as_ref().clone())
    }

    /// Writable handle: this allocation if unshared, a private copy otherwise
    pub fn get_mutable(self) -> SharedList<T> {
        if self.is_mutable() { self } else { self.copy() }
    }

    /// Append to a list that may be shared, copying first when needed
    pub fn appended(self, value: T) -> SharedList<T> {
        let mut list = self.get_mutable();
        Arc::make_mut(&mut list.data).push(value);
        list
    }

    pub fn extend_from(&mut self, other: &SharedList<T>) -> Result<(), FnError> {
        self.exclusive()?.extend_from_slice(other.as_slice());
        Ok(())
    }
}

impl<T> Clone for SharedList<T> {
    fn clone(&self) -> Self {
        SharedList {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T> Default for SharedList<T> {
    fn default() -> Self {
        SharedList::new()
    }
}

impl<T: PartialEq> PartialEq for SharedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}

impl<T> FromIterator<T> for SharedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        SharedList::from_vec(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a SharedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
