//! Open-addressed hash table with per-entry signatures.
//!
//! # Layout
//!
//! Entries live in one flat buffer of `capacity` records, where `capacity`
//! is zero or a power of two no smaller than [`Table::MIN_CAPACITY`]:
//!
//! ```text
//! Entry<K, V> = { key, value, signature: u64 }
//!
//! signature == 0        EMPTY      never occupied
//! signature == !0       TOMBSTONE  occupied once, then removed
//! otherwise             OCCUPIED   1 | 0 | low 62 bits of (hash >> 2)
//! ```
//!
//! # Probing
//!
//! The home slot is the signature's 62 hash bits masked by `capacity - 1`.
//! Collisions walk triangular offsets (`+1, +2, +3, ...`), which visit every
//! slot of a power-of-two table exactly once per `capacity` steps. Keys are
//! only compared when the stored signature matches, and a resize reinserts
//! entries by their stored signature without calling the hash function.
//!
//! The table keeps `100 * (count + 1) < LOAD_FACTOR * capacity` after every
//! insert, so a free slot always exists. Tombstones are only reclaimed by
//! reuse or by the next resize.

#![allow(unsafe_code)]

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ops::Index;
use std::ptr::NonNull;
use std::slice;

use keel_core::{nextpow2, system, AllocError, Allocator};

use crate::hash::{fnv1a_hash, HashFn};
use crate::raw;

/// Signature of a slot that has never been occupied.
pub const EMPTY: u64 = 0;

/// Signature of a slot whose entry was removed.
pub const TOMBSTONE: u64 = !0;

/// The hash bits a signature carries.
const HASH_MASK: u64 = 0x3FFF_FFFF_FFFF_FFFF;

/// Signature stored for an occupied entry whose key hashed to `hash`.
///
/// The top bit is always set, so the result is never [`EMPTY`]; the second
/// bit is always clear, so it is never [`TOMBSTONE`].
#[inline]
pub const fn signature_of(hash: u64) -> u64 {
    (hash >> 2) | (1 << 63)
}

#[repr(C)]
struct Entry<K, V> {
    key: MaybeUninit<K>,
    value: MaybeUninit<V>,
    signature: u64,
}

impl<K, V> Entry<K, V> {
    #[inline]
    fn is_occupied(&self) -> bool {
        self.signature != EMPTY && self.signature != TOMBSTONE
    }
}

/// Slot indices visited for one signature.
struct ProbeSeq {
    index: usize,
    step: usize,
    mask: usize,
}

impl ProbeSeq {
    /// `capacity` must be a non-zero power of two.
    fn new(signature: u64, capacity: usize) -> Self {
        let mask = capacity - 1;
        Self {
            index: (signature & HASH_MASK) as usize & mask,
            step: 0,
            mask,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        let current = self.index;
        self.step += 1;
        self.index = (self.index + self.step) & self.mask;
        Some(current)
    }
}

/// Result of probing for a key.
enum Slot {
    /// The key lives at this index.
    Occupied(usize),
    /// The key is absent; this is where it would be inserted.
    Vacant(usize),
}

/// Open-addressed hash map from `K` to `V`, bound to an allocator.
///
/// Keys and values are `Copy`; they are moved by byte copies and never
/// dropped. Iteration follows physical slot order, which is unrelated to
/// insertion order and changes across resizes.
pub struct Table<'a, K, V> {
    count: usize,
    entries: Option<NonNull<Entry<K, V>>>,
    capacity: usize,
    allocator: &'a dyn Allocator,
    hash_fn: HashFn<K>,
    _owns: PhantomData<Entry<K, V>>,
}

impl<K: Eq + Copy + Hash, V: Copy> Table<'static, K, V> {
    /// An empty table on the system heap, hashing keys with FNV-1a.
    ///
    /// Keys are fed through their `Hash` impl. For `&str` or `&[u8]` keys
    /// that should hash exactly their bytes, use
    /// [`with_hasher`](Self::with_hasher) with [`fnv1a_bytes`](crate::fnv1a_bytes).
    pub fn new() -> Self {
        Self::with_hasher_in(fnv1a_hash::<K>, system())
    }
}

impl<K: Eq + Copy + Hash, V: Copy> Default for Table<'static, K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Copy, V: Copy> Table<'static, K, V> {
    /// An empty table on the system heap using `hash_fn`.
    pub fn with_hasher(hash_fn: HashFn<K>) -> Self {
        Self::with_hasher_in(hash_fn, system())
    }
}

impl<'a, K: Eq + Copy, V: Copy> Table<'a, K, V> {
    /// Target maximum load, in percent.
    pub const LOAD_FACTOR: usize = 70;

    /// Capacity of the first allocation.
    pub const MIN_CAPACITY: usize = 8;

    /// An empty table bound to `allocator`, hashing keys with FNV-1a.
    pub fn new_in(allocator: &'a dyn Allocator) -> Self
    where
        K: Hash,
    {
        Self::with_hasher_in(fnv1a_hash::<K>, allocator)
    }

    /// An empty table bound to `allocator` using `hash_fn`.
    ///
    /// Nothing is allocated until the first insert.
    pub fn with_hasher_in(hash_fn: HashFn<K>, allocator: &'a dyn Allocator) -> Self {
        Self {
            count: 0,
            entries: None,
            capacity: 0,
            allocator,
            hash_fn,
            _owns: PhantomData,
        }
    }

    // ── Accessors ───────────────────────────────────────────────

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the table has no live entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The allocator that owns the entries.
    pub fn allocator(&self) -> &'a dyn Allocator {
        self.allocator
    }

    /// The key hash function.
    pub fn hash_fn(&self) -> HashFn<K> {
        self.hash_fn
    }

    // ── Lookup ──────────────────────────────────────────────────

    /// Value stored for `key`.
    pub fn find(&self, key: &K) -> Option<&V> {
        let index = self.lookup(key)?;
        // SAFETY: occupied entries hold an initialised value.
        Some(unsafe { self.slots()[index].value.assume_init_ref() })
    }

    /// Value stored for `key`, mutably.
    pub fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = self.lookup(key)?;
        // SAFETY: occupied entries hold an initialised value.
        Some(unsafe { self.slots_mut()[index].value.assume_init_mut() })
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.lookup(key).is_some()
    }

    // ── Mutation ────────────────────────────────────────────────

    /// Insert or overwrite the value for `key`, returning the stored value.
    ///
    /// May resize the table first, which moves every entry.
    pub fn update(&mut self, key: K, value: V) -> Result<&mut V, AllocError> {
        let (index, _) = self.claim(key)?;
        Ok(self.slots_mut()[index].value.write(value))
    }

    /// The value for `key`, inserting `V::default()` if it is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> Result<&mut V, AllocError>
    where
        V: Default,
    {
        let (index, inserted) = self.claim(key)?;
        let entry = &mut self.slots_mut()[index];
        if inserted {
            entry.value.write(V::default());
        }
        // SAFETY: the value was either present or written just above.
        Ok(unsafe { entry.value.assume_init_mut() })
    }

    /// Remove `key`, leaving a tombstone. Returns whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.lookup(key) {
            Some(index) => {
                self.slots_mut()[index].signature = TOMBSTONE;
                self.count -= 1;
                true
            }
            None => false,
        }
    }

    /// Resize to at least `capacity` slots, rounded up to a power of two.
    ///
    /// Entries are reinserted by their stored signatures; keys are not
    /// rehashed. Tombstones are dropped. On failure the table is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or smaller than the current capacity.
    #[track_caller]
    pub fn expand(&mut self, capacity: usize) -> Result<(), AllocError> {
        assert!(capacity != 0, "table capacity must be non-zero");
        assert!(
            capacity >= self.capacity,
            "table cannot shrink from {} to {capacity}",
            self.capacity
        );
        let capacity = nextpow2(capacity as u64) as usize;
        let fresh = raw::alloc_zeroed_buffer::<Entry<K, V>>(self.allocator, capacity)?;
        // SAFETY: `fresh` holds `capacity` zeroed entries, which are valid
        // EMPTY records.
        let target = unsafe { slice::from_raw_parts_mut(fresh.as_ptr(), capacity) };

        for entry in self.slots().iter().filter(|entry| entry.is_occupied()) {
            let index = ProbeSeq::new(entry.signature, capacity)
                .take(capacity)
                .find(|&index| target[index].signature == EMPTY)
                .expect("expanded table has room for every entry");
            // SAFETY: `Entry` holds `Copy` data; `target[index]` is distinct
            // memory from `entry`.
            unsafe { std::ptr::copy_nonoverlapping(entry, &mut target[index], 1) };
        }

        // SAFETY: the old buffer came from `allocator` and is replaced below.
        unsafe { raw::free_buffer(self.allocator, self.entries) };
        self.entries = Some(fresh);
        self.capacity = capacity;
        Ok(())
    }

    /// Remove every entry, keeping the capacity.
    pub fn clear(&mut self) {
        if let Some(entries) = self.entries {
            // SAFETY: the buffer holds `capacity` entries; all-zero is EMPTY.
            unsafe { entries.as_ptr().write_bytes(0, self.capacity) };
        }
        self.count = 0;
    }

    // ── Iteration ───────────────────────────────────────────────

    /// Iterator over `(key, value)` pairs in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            entries: self.slots().iter(),
            remaining: self.count,
        }
    }

    /// Iterator over `(key, value)` pairs with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.count;
        IterMut {
            entries: self.slots_mut().iter_mut(),
            remaining,
        }
    }

    /// Iterator over keys in slot order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Iterator over values in slot order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    // ── Internals ───────────────────────────────────────────────

    fn slots(&self) -> &[Entry<K, V>] {
        match self.entries {
            // SAFETY: `entries` holds `capacity` entries whose signatures are
            // always initialised.
            Some(entries) => unsafe { slice::from_raw_parts(entries.as_ptr(), self.capacity) },
            None => &[],
        }
    }

    fn slots_mut(&mut self) -> &mut [Entry<K, V>] {
        match self.entries {
            // SAFETY: as in `slots`; `&mut self` guarantees exclusivity.
            Some(entries) => unsafe { slice::from_raw_parts_mut(entries.as_ptr(), self.capacity) },
            None => &mut [],
        }
    }

    /// Index of the occupied entry for `key`.
    fn lookup(&self, key: &K) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        match self.probe(signature_of((self.hash_fn)(key)), key)? {
            Slot::Occupied(index) => Some(index),
            Slot::Vacant(_) => None,
        }
    }

    /// Walk the probe sequence for `key`.
    ///
    /// A miss reports the first tombstone passed, or else the EMPTY slot
    /// that ended the walk. `None` only when every slot was visited without
    /// finding either, which the load factor rules out.
    fn probe(&self, signature: u64, key: &K) -> Option<Slot> {
        if self.capacity == 0 {
            return None;
        }
        let slots = self.slots();
        let mut first_removed = None;
        for index in ProbeSeq::new(signature, self.capacity).take(self.capacity) {
            let entry = &slots[index];
            match entry.signature {
                EMPTY => return Some(Slot::Vacant(first_removed.unwrap_or(index))),
                TOMBSTONE => {
                    first_removed.get_or_insert(index);
                }
                // SAFETY: occupied entries hold an initialised key.
                stored if stored == signature && unsafe { entry.key.assume_init_ref() } == key => {
                    return Some(Slot::Occupied(index));
                }
                _ => {}
            }
        }
        first_removed.map(Slot::Vacant)
    }

    /// Find or create the entry for `key`, growing first if the insert
    /// would cross the load factor. Returns the slot index and whether the
    /// entry is new; a new entry's value is uninitialised.
    fn claim(&mut self, key: K) -> Result<(usize, bool), AllocError> {
        let load = self.count.saturating_add(1).saturating_mul(100);
        if load >= Self::LOAD_FACTOR.saturating_mul(self.capacity) {
            let grown = self.capacity.saturating_mul(2).max(Self::MIN_CAPACITY);
            self.expand(grown)?;
        }
        let signature = signature_of((self.hash_fn)(&key));
        let slot = self
            .probe(signature, &key)
            .expect("load factor keeps a free slot");
        match slot {
            Slot::Occupied(index) => Ok((index, false)),
            Slot::Vacant(index) => {
                let entry = &mut self.slots_mut()[index];
                entry.key.write(key);
                entry.signature = signature;
                self.count += 1;
                Ok((index, true))
            }
        }
    }
}

impl<K, V> Drop for Table<'_, K, V> {
    fn drop(&mut self) {
        // SAFETY: `entries` came from `allocator` and is not used after this.
        unsafe { raw::free_buffer(self.allocator, self.entries.take()) }
    }
}

impl<K: Eq + Copy, V: Copy> Index<&K> for Table<'_, K, V> {
    type Output = V;

    #[track_caller]
    fn index(&self, key: &K) -> &V {
        match self.find(key) {
            Some(value) => value,
            None => panic!("key not found in table"),
        }
    }
}

impl<K: Eq + Copy + fmt::Debug, V: Copy + fmt::Debug> fmt::Debug for Table<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'t, K: Eq + Copy, V: Copy> IntoIterator for &'t Table<'_, K, V> {
    type Item = (&'t K, &'t V);
    type IntoIter = Iter<'t, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ── Iterators ───────────────────────────────────────────────────

/// Iterator over the live entries of a [`Table`].
pub struct Iter<'t, K, V> {
    entries: slice::Iter<'t, Entry<K, V>>,
    remaining: usize,
}

impl<'t, K, V> Iterator for Iter<'t, K, V> {
    type Item = (&'t K, &'t V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.find(|entry| entry.is_occupied())?;
        self.remaining -= 1;
        // SAFETY: occupied entries hold an initialised key and value.
        Some(unsafe { (entry.key.assume_init_ref(), entry.value.assume_init_ref()) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over the live entries of a [`Table`] with mutable values.
pub struct IterMut<'t, K, V> {
    entries: slice::IterMut<'t, Entry<K, V>>,
    remaining: usize,
}

impl<'t, K, V> Iterator for IterMut<'t, K, V> {
    type Item = (&'t K, &'t mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.find(|entry| entry.is_occupied())?;
        self.remaining -= 1;
        // SAFETY: occupied entries hold an initialised key and value.
        Some(unsafe { (entry.key.assume_init_ref(), entry.value.assume_init_mut()) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
