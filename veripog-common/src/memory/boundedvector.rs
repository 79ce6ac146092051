//! `BoundedVector` is a non-growable
//! [`std::vec::Vec`](https://doc.rust-lang.org/std/vec/struct.Vec.html).

use crate::memory::{HeapSpace, Vector};
use std::{
    ops::{Index, IndexMut},
    slice,
};

/// A contiguous but non-growable array type, using [`Vector`](../vector/struct.Vector.html)
///
/// This exposes a subset of the `Vector` API (and thus essentially behaves
/// like a `std::vec::Vec`). Notably, it does not provide functions that grow the
/// capacity of the vector.
///
/// A `BoundedVector` can be used as a stack with a known maximum size.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundedVector<T> {
    /// The wrapped `Vector`
    vector: Vector<T>,
}

impl<T> BoundedVector<T> {
    /// See [`Vec::with_capacity()`](https://doc.rust-lang.org/std/vec/struct.Vec.html#method.with_capacity).
    pub fn with_capacity(capacity: usize) -> BoundedVector<T> {
        BoundedVector {
            vector: Vector::with_capacity(capacity),
        }
    }
    /// Pushes a value, increasing the vector's length by one.
    ///
    /// Note that unlike
    /// [`Vec::push()`](https://doc.rust-lang.org/std/vec/struct.Vec.html#method.push)
    /// this does not grow the vector if it is full.
    ///
    /// # Panics
    /// Panics if there is no space for the new element.
    pub fn push(&mut self, value: T) {
        self.vector.push_no_grow(value)
    }
    /// See [`Vec::len()`](https://doc.rust-lang.org/std/vec/struct.Vec.html#method.len).
    pub fn len(&self) -> usize {
        self.vector.len()
    }
    /// See [`Vec::is_empty()`](https://doc.rust-lang.org/std/vec/struct.Vec.html#method.is_empty).
    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }
    /// See [`Vec::capacity()`](https://doc.rust-lang.org/std/vec/struct.Vec.html#method.capacity).
    pub fn capacity(&self) -> usize {
        self.vector.capacity()
    }
    /// See [`Vec::pop()`](https://doc.rust-lang.org/std/vec/struct.Vec.html#method.pop).
    pub fn pop(&mut self) -> Option<T> {
        self.vector.pop()
    }
    /// See [`Vec::clear()`](https://doc.rust-lang.org/std/vec/struct.Vec.html#method.clear).
    pub fn clear(&mut self) {
        self.vector.clear()
    }
    /// See [`slice::swap()`](https://doc.rust-lang.org/std/primitive.slice.html#method.swap).
    pub fn swap(&mut self, a: usize, b: usize) {
        self.vector.swap(a, b)
    }
    /// See [`Vec::iter()`](https://doc.rust-lang.org/std/vec/struct.Vec.html#method.iter).
    pub fn iter(&self) -> slice::Iter<T> {
        self.vector.iter()
    }
}

impl<T> Index<usize> for BoundedVector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &T {
        &self.vector[index]
    }
}

impl<T> IndexMut<usize> for BoundedVector<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.vector[index]
    }
}

impl<'a, T> IntoIterator for &'a BoundedVector<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.vector.iter()
    }
}

impl<T: HeapSpace> HeapSpace for BoundedVector<T> {
    fn heap_space(&self) -> usize {
        self.vector.heap_space()
    }
}
