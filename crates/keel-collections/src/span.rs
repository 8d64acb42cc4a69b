//! Non-owning views over contiguous memory.
//!
//! [`Span`] is a `Copy` read-only view: a `{data, count}` pair that can be
//! sliced, compared, searched and used as a hash-table key. [`SpanMut`] is
//! the exclusive counterpart that additionally allows element writes and
//! in-place removal, which shrinks the view's count.
//!
//! Out-of-range indices and invalid slice ranges are programmer errors and
//! panic at the caller's location.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Index, IndexMut, Range};
use std::slice;

/// A `Copy` read-only view over `count` contiguous values.
pub struct Span<'a, T> {
    items: &'a [T],
}

impl<'a, T> Span<'a, T> {
    /// View over `items`.
    pub const fn new(items: &'a [T]) -> Self {
        Self { items }
    }

    /// The empty span.
    pub const fn empty() -> Self {
        Self { items: &[] }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the span has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the span is usable, meaning non-empty.
    ///
    /// A slice's data pointer is never null, so emptiness is the only way a
    /// span can be unusable.
    pub fn is_usable(&self) -> bool {
        !self.items.is_empty()
    }

    /// The viewed elements.
    pub fn as_slice(&self) -> &'a [T] {
        self.items
    }

    /// Pointer to the first element.
    pub fn as_ptr(&self) -> *const T {
        self.items.as_ptr()
    }

    /// `begin..end` element pointers.
    pub fn as_ptr_range(&self) -> Range<*const T> {
        self.items.as_ptr_range()
    }

    /// Element at `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.items.get(index)
    }

    /// Iterator over the elements.
    pub fn iter(&self) -> slice::Iter<'a, T> {
        self.items.iter()
    }

    /// Sub-span from `start` to the end.
    ///
    /// # Panics
    ///
    /// Panics unless `start < len()`.
    #[track_caller]
    pub fn slice_from(self, start: usize) -> Self {
        check_start(start, self.len());
        Self {
            items: &self.items[start..],
        }
    }

    /// Sub-span `start..end`.
    ///
    /// # Panics
    ///
    /// Panics unless `start < end <= len()`.
    #[track_caller]
    pub fn slice(self, start: usize, end: usize) -> Self {
        check_range(start, end, self.len());
        Self {
            items: &self.items[start..end],
        }
    }

    /// Drop the first `n` elements from the view.
    ///
    /// # Panics
    ///
    /// Panics if `n > len()`.
    #[track_caller]
    pub fn advance(&mut self, n: usize) {
        check_advance(n, self.len());
        self.items = &self.items[n..];
    }

    /// First element equal to `value`, scanning forward.
    pub fn find(&self, value: &T) -> Option<&'a T>
    where
        T: PartialEq,
    {
        self.items.iter().find(|item| *item == value)
    }

    /// Last element equal to `value`, scanning backward.
    pub fn rfind(&self, value: &T) -> Option<&'a T>
    where
        T: PartialEq,
    {
        self.items.iter().rev().find(|item| *item == value)
    }

    /// Index of the first element equal to `value`.
    pub fn position(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.items.iter().position(|item| item == value)
    }

    /// Index of the last element equal to `value`.
    pub fn rposition(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.items.iter().rposition(|item| item == value)
    }
}

impl<T> Clone for Span<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Span<'_, T> {}

impl<T> Default for Span<'_, T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Index<usize> for Span<'_, T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        check_index(index, self.len());
        &self.items[index]
    }
}

impl<'b, T: PartialEq> PartialEq<Span<'b, T>> for Span<'_, T> {
    fn eq(&self, other: &Span<'b, T>) -> bool {
        self.items == other.items
    }
}

impl<T: Eq> Eq for Span<'_, T> {}

impl<T: PartialEq> PartialEq<[T]> for Span<'_, T> {
    fn eq(&self, other: &[T]) -> bool {
        self.items == other
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for Span<'_, T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.items == other.as_slice()
    }
}

/// Hashes the referenced elements only, not the `{data, count}` header.
///
/// For byte spans this feeds exactly the element bytes to the hasher, with
/// no length prefix.
impl<T: Hash> Hash for Span<'_, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        T::hash_slice(self.items, state);
    }
}

impl<T> AsRef<[T]> for Span<'_, T> {
    fn as_ref(&self) -> &[T] {
        self.items
    }
}

impl<T: fmt::Debug> fmt::Debug for Span<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items).finish()
    }
}

impl<'a, T> From<&'a [T]> for Span<'a, T> {
    fn from(items: &'a [T]) -> Self {
        Self::new(items)
    }
}

impl<'a, T, const N: usize> From<&'a [T; N]> for Span<'a, T> {
    fn from(items: &'a [T; N]) -> Self {
        Self::new(items)
    }
}

impl<'a> From<&'a str> for Span<'a, u8> {
    fn from(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl<'a, T> IntoIterator for Span<'a, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// An exclusive view over `count` contiguous values.
///
/// The caller keeps ownership of the underlying buffer. Removal operations
/// rearrange the buffer and shrink this view; elements past the new end are
/// left in the buffer.
pub struct SpanMut<'a, T> {
    items: &'a mut [T],
}

impl<'a, T> SpanMut<'a, T> {
    /// Exclusive view over `items`.
    pub fn new(items: &'a mut [T]) -> Self {
        Self { items }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the view is usable, meaning non-empty. See [`Span::is_usable`].
    pub fn is_usable(&self) -> bool {
        !self.items.is_empty()
    }

    /// Read-only span over the same elements.
    pub fn as_span(&self) -> Span<'_, T> {
        Span::new(&*self.items)
    }

    /// Convert into a read-only span for the full lifetime.
    pub fn into_span(self) -> Span<'a, T> {
        Span::new(self.items)
    }

    /// The viewed elements.
    pub fn as_slice(&self) -> &[T] {
        &*self.items
    }

    /// The viewed elements, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut *self.items
    }

    /// Iterator over the elements.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Mutable iterator over the elements.
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Reborrow as a shorter-lived exclusive view.
    pub fn reborrow(&mut self) -> SpanMut<'_, T> {
        SpanMut::new(&mut *self.items)
    }

    /// Sub-view from `start` to the end.
    ///
    /// # Panics
    ///
    /// Panics unless `start < len()`.
    #[track_caller]
    pub fn slice_from(self, start: usize) -> Self {
        check_start(start, self.len());
        let items = self.items;
        Self {
            items: &mut items[start..],
        }
    }

    /// Sub-view `start..end`.
    ///
    /// # Panics
    ///
    /// Panics unless `start < end <= len()`.
    #[track_caller]
    pub fn slice(self, start: usize, end: usize) -> Self {
        check_range(start, end, self.len());
        let items = self.items;
        Self {
            items: &mut items[start..end],
        }
    }

    /// Drop the first `n` elements from the view.
    ///
    /// # Panics
    ///
    /// Panics if `n > len()`.
    #[track_caller]
    pub fn advance(&mut self, n: usize) {
        check_advance(n, self.len());
        let items = std::mem::take(&mut self.items);
        self.items = &mut items[n..];
    }

    /// Remove element `index` in O(1) by moving the last element into its
    /// place. Order is not preserved.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[track_caller]
    pub fn remove(&mut self, index: usize) {
        check_index(index, self.len());
        let last = self.len() - 1;
        self.items.swap(index, last);
        self.shrink_by_one();
    }

    /// Remove element `index` in O(n - index), shifting the tail left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[track_caller]
    pub fn remove_ordered(&mut self, index: usize) {
        check_index(index, self.len());
        self.items[index..].rotate_left(1);
        self.shrink_by_one();
    }

    fn shrink_by_one(&mut self) {
        let items = std::mem::take(&mut self.items);
        let last = items.len() - 1;
        self.items = &mut items[..last];
    }

    /// First element equal to `value`, scanning forward.
    pub fn find(&self, value: &T) -> Option<&T>
    where
        T: PartialEq,
    {
        self.items.iter().find(|item| *item == value)
    }

    /// Last element equal to `value`, scanning backward.
    pub fn rfind(&self, value: &T) -> Option<&T>
    where
        T: PartialEq,
    {
        self.items.iter().rev().find(|item| *item == value)
    }

    /// First element equal to `value`, mutably.
    pub fn find_mut(&mut self, value: &T) -> Option<&mut T>
    where
        T: PartialEq,
    {
        self.items.iter_mut().find(|item| **item == *value)
    }
}

impl<T> Index<usize> for SpanMut<'_, T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        check_index(index, self.len());
        &self.items[index]
    }
}

impl<T> IndexMut<usize> for SpanMut<'_, T> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        check_index(index, self.len());
        &mut self.items[index]
    }
}

impl<'b, T: PartialEq> PartialEq<SpanMut<'b, T>> for SpanMut<'_, T> {
    fn eq(&self, other: &SpanMut<'b, T>) -> bool {
        *self.items == *other.items
    }
}

impl<'b, T: PartialEq> PartialEq<Span<'b, T>> for SpanMut<'_, T> {
    fn eq(&self, other: &Span<'b, T>) -> bool {
        *self.items == *other.items
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for SpanMut<'_, T> {
    fn eq(&self, other: &[T; N]) -> bool {
        *self.items == *other.as_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for SpanMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<'a, T> From<&'a mut [T]> for SpanMut<'a, T> {
    fn from(items: &'a mut [T]) -> Self {
        Self::new(items)
    }
}

impl<'a, T, const N: usize> From<&'a mut [T; N]> for SpanMut<'a, T> {
    fn from(items: &'a mut [T; N]) -> Self {
        Self::new(items)
    }
}

// ── Fatal range checks ──────────────────────────────────────────

#[track_caller]
fn check_index(index: usize, len: usize) {
    if index >= len {
        panic!("span index {index} out of range for span of length {len}");
    }
}

#[track_caller]
fn check_start(start: usize, len: usize) {
    if start >= len {
        panic!("span slice start {start} out of range for span of length {len}");
    }
}

#[track_caller]
fn check_range(start: usize, end: usize, len: usize) {
    if start >= end || end > len {
        panic!("invalid span slice {start}..{end} for span of length {len}");
    }
}

#[track_caller]
fn check_advance(n: usize, len: usize) {
    if n > len {
        panic!("cannot advance span of length {len} by {n}");
    }
}
