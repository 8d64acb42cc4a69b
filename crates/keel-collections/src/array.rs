//! Growable arrays bound to an allocator.
//!
//! [`Array`] keeps `{data, count, capacity}` plus the allocator that owns
//! `data`. Appending past capacity doubles it (starting from one); explicit
//! [`reserve`](Array::reserve), [`resize`](Array::resize) and
//! [`trim`](Array::trim) reallocate to exactly the requested size.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use keel_core::{system, AllocError, Allocator};

use crate::raw;
use crate::span::{Span, SpanMut};

/// An owning, growable buffer of `Copy` values.
///
/// Invariants: `count <= capacity`, and `data` is `Some` exactly when
/// `capacity > 0`. The first `count` slots are initialised.
pub struct Array<'a, T: Copy> {
    data: Option<NonNull<T>>,
    count: usize,
    capacity: usize,
    allocator: &'a dyn Allocator,
    _owns: PhantomData<T>,
}

impl<T: Copy> Array<'static, T> {
    /// An empty array on the system heap.
    pub fn new() -> Self {
        Self::new_in(system())
    }
}

impl<T: Copy> Default for Array<'static, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Copy> Array<'a, T> {
    /// An empty array bound to `allocator`. Nothing is allocated until the
    /// first append.
    pub fn new_in(allocator: &'a dyn Allocator) -> Self {
        Self {
            data: None,
            count: 0,
            capacity: 0,
            allocator,
            _owns: PhantomData,
        }
    }

    /// Independent copy holding exactly `len()` elements, bound to the same
    /// allocator.
    pub fn try_clone(&self) -> Result<Self, AllocError> {
        let mut copy = Self::new_in(self.allocator);
        if self.count > 0 {
            let data = raw::alloc_buffer::<T>(self.allocator, self.count)?;
            // SAFETY: fresh buffer of `count` slots; the source holds `count`
            // initialised values.
            unsafe { data.as_ptr().copy_from_nonoverlapping(self.as_ptr(), self.count) };
            copy.data = Some(data);
            copy.count = self.count;
            copy.capacity = self.count;
        }
        Ok(copy)
    }

    // ── Accessors ───────────────────────────────────────────────

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of elements the current buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The allocator that owns the buffer.
    pub fn allocator(&self) -> &'a dyn Allocator {
        self.allocator
    }

    /// Read-only view of the elements.
    pub fn as_span(&self) -> Span<'_, T> {
        Span::new(self)
    }

    /// Exclusive view of the elements.
    pub fn as_span_mut(&mut self) -> SpanMut<'_, T> {
        SpanMut::new(self)
    }

    // ── Growth ──────────────────────────────────────────────────

    /// Append `value`, doubling the capacity if the array is full.
    ///
    /// On failure the array is unchanged.
    pub fn push(&mut self, value: T) -> Result<(), AllocError> {
        if self.count == self.capacity {
            let grown = self
                .capacity
                .checked_mul(2)
                .ok_or(AllocError::SizeOverflow {
                    count: self.capacity,
                    elem_size: 2 * std::mem::size_of::<T>(),
                })?
                .max(1);
            self.set_capacity(grown)?;
        }
        // SAFETY: `count < capacity`, so slot `count` lies inside the buffer.
        unsafe { self.slot(self.count).write(value) };
        self.count += 1;
        Ok(())
    }

    /// Append each value in turn, as repeated [`push`](Self::push) calls.
    ///
    /// Stops at the first allocation failure; values appended before it
    /// stay in the array.
    pub fn append_values<I>(&mut self, values: I) -> Result<(), AllocError>
    where
        I: IntoIterator<Item = T>,
    {
        values.into_iter().try_for_each(|value| self.push(value))
    }

    /// Append a copy of every element of `source`.
    ///
    /// Reserves exactly `len() + source.len()` first.
    pub fn append_slice<'s>(&mut self, source: impl Into<Span<'s, T>>) -> Result<(), AllocError>
    where
        T: 's,
    {
        let source = source.into();
        let needed = self
            .count
            .checked_add(source.len())
            .ok_or(AllocError::SizeOverflow {
                count: usize::MAX,
                elem_size: std::mem::size_of::<T>(),
            })?;
        self.reserve(needed)?;
        if source.is_empty() {
            return Ok(());
        }
        // SAFETY: capacity >= count + source.len(); `source` borrows memory
        // outside this array because `self` is exclusively borrowed.
        unsafe {
            self.slot(self.count)
                .copy_from_nonoverlapping(source.as_ptr(), source.len())
        };
        self.count = needed;
        Ok(())
    }

    /// Ensure the capacity is at least `capacity`, reallocating to exactly
    /// that size if it is not.
    pub fn reserve(&mut self, capacity: usize) -> Result<(), AllocError> {
        if capacity > self.capacity {
            self.set_capacity(capacity)?;
        }
        Ok(())
    }

    /// Set the length to `len`.
    ///
    /// When `len` equals the capacity no reallocation happens. Zero frees
    /// the buffer. Any other length reallocates to exactly `len` slots.
    /// Elements past the old length are filled with `T::default()`.
    pub fn resize(&mut self, len: usize) -> Result<(), AllocError>
    where
        T: Default,
    {
        if len != self.capacity {
            self.set_capacity(len)?;
        }
        for i in self.count..len {
            // SAFETY: `i < len == capacity`.
            unsafe { self.slot(i).write(T::default()) };
        }
        self.count = len;
        Ok(())
    }

    /// Shrink the capacity to the length.
    pub fn trim(&mut self) -> Result<(), AllocError> {
        if self.count != self.capacity {
            self.set_capacity(self.count)?;
        }
        Ok(())
    }

    /// Keep the first `len` elements, retaining the capacity.
    pub fn truncate(&mut self, len: usize) {
        self.count = self.count.min(len);
    }

    /// Remove every element, retaining the capacity.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    // ── Internals ───────────────────────────────────────────────

    /// Pointer to slot `index`. Only valid while `index <= capacity`.
    fn slot(&mut self, index: usize) -> *mut T {
        match self.data {
            // SAFETY: callers stay within the buffer (or one past it).
            Some(data) => unsafe { data.as_ptr().add(index) },
            None => NonNull::dangling().as_ptr(),
        }
    }

    /// Reallocate to exactly `capacity` slots, freeing on zero.
    ///
    /// On failure nothing changes.
    fn set_capacity(&mut self, capacity: usize) -> Result<(), AllocError> {
        if capacity == 0 {
            // SAFETY: `data` came from `allocator` and is dropped here.
            unsafe { raw::free_buffer(self.allocator, self.data.take()) };
        } else {
            // SAFETY: `data` came from `allocator` through `raw` for this `T`.
            let data = unsafe { raw::realloc_buffer(self.allocator, self.data, capacity) }?;
            self.data = Some(data);
        }
        self.capacity = capacity;
        self.count = self.count.min(capacity);
        Ok(())
    }
}

impl<T: Copy> Deref for Array<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        match self.data {
            // SAFETY: the first `count` slots are initialised and owned.
            Some(data) => unsafe { slice::from_raw_parts(data.as_ptr(), self.count) },
            None => &[],
        }
    }
}

impl<T: Copy> DerefMut for Array<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        match self.data {
            // SAFETY: as in `deref`; `&mut self` guarantees exclusivity.
            Some(data) => unsafe { slice::from_raw_parts_mut(data.as_ptr(), self.count) },
            None => &mut [],
        }
    }
}

impl<T: Copy> Drop for Array<'_, T> {
    fn drop(&mut self) {
        // SAFETY: `data` came from `allocator` and is not used after this.
        unsafe { raw::free_buffer(self.allocator, self.data.take()) }
    }
}

impl<T: Copy + PartialEq> PartialEq for Array<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for Array<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("items", &&**self)
            .field("capacity", &self.capacity)
            .finish()
    }
}
