//! Fixed-size buffers obtained from an allocator.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use keel_core::{system, AllocError, Allocator};

use crate::raw;
use crate::span::{Span, SpanMut};

/// A `count`-element buffer owned together with the allocator it came from.
///
/// Created filled with `T::default()` or as a copy of an existing span, and
/// released back to its allocator on drop.
pub struct OwnedSpan<'a, T: Copy> {
    data: NonNull<T>,
    count: usize,
    allocator: &'a dyn Allocator,
    _owns: PhantomData<T>,
}

impl<T: Copy + Default> OwnedSpan<'static, T> {
    /// `count` default values on the system heap.
    pub fn make(count: usize) -> Result<Self, AllocError> {
        Self::make_in(count, system())
    }
}

impl<'a, T: Copy> OwnedSpan<'a, T> {
    /// `count` default values from `allocator`.
    pub fn make_in(count: usize, allocator: &'a dyn Allocator) -> Result<Self, AllocError>
    where
        T: Default,
    {
        let data = raw::alloc_buffer::<T>(allocator, count)?;
        for i in 0..count {
            // SAFETY: `data` holds `count` slots.
            unsafe { data.as_ptr().add(i).write(T::default()) };
        }
        Ok(Self {
            data,
            count,
            allocator,
            _owns: PhantomData,
        })
    }

    /// Independent copy of `source` on `allocator`.
    pub fn copy_in<'s>(
        source: impl Into<Span<'s, T>>,
        allocator: &'a dyn Allocator,
    ) -> Result<Self, AllocError>
    where
        T: 's,
    {
        let source = source.into();
        let count = source.len();
        let data = raw::alloc_buffer::<T>(allocator, count)?;
        // SAFETY: `data` is a fresh buffer of `count` slots and cannot overlap
        // the borrowed source.
        unsafe { data.as_ptr().copy_from_nonoverlapping(source.as_ptr(), count) };
        Ok(Self {
            data,
            count,
            allocator,
            _owns: PhantomData,
        })
    }

    /// Independent copy of this buffer on the same allocator.
    pub fn make_copy(&self) -> Result<Self, AllocError> {
        Self::copy_in(self.as_span(), self.allocator)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the buffer has no elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The allocator the buffer came from.
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
}

impl<T: Copy> Deref for OwnedSpan<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: `data` holds `count` initialised values owned by `self`.
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.count) }
    }
}

impl<T: Copy> DerefMut for OwnedSpan<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: as in `deref`, and `&mut self` guarantees exclusivity.
        unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.count) }
    }
}

impl<T: Copy> Drop for OwnedSpan<'_, T> {
    fn drop(&mut self) {
        // SAFETY: `data` came from `allocator` and is not used after this.
        unsafe { raw::free_buffer(self.allocator, Some(self.data)) }
    }
}

impl<T: Copy + PartialEq> PartialEq for OwnedSpan<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for OwnedSpan<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
