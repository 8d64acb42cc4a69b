//! FNV-1a hashing.
//!
//! [`Table`](crate::Table) hashes keys with FNV-1a by default. The hasher
//! is exposed through `std::hash::Hasher`, so any `Hash` key works: integer
//! keys feed their native-endian bytes, and byte [`Span`](crate::Span) keys
//! feed exactly their element bytes.
//!
//! `&str` and `&[u8]` keys go through std's `Hash`, which adds a terminator
//! or a length prefix. Tables keyed by them hash exactly the key bytes with
//! [`fnv1a_bytes`] passed to [`Table::with_hasher`](crate::Table::with_hasher).

use std::hash::{BuildHasherDefault, Hash, Hasher};

/// 64-bit FNV offset basis.
pub const FNV_OFFSET_BASIS: u64 = 0xCBF2_9CE4_8422_2325;

/// 64-bit FNV prime.
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

/// Signature of a key hash function a [`Table`](crate::Table) can use.
pub type HashFn<K> = fn(&K) -> u64;

/// FNV-1a over a byte string.
pub fn hash_fnv1a(bytes: &[u8]) -> u64 {
    fold(FNV_OFFSET_BASIS, bytes)
}

#[inline]
fn fold(mut state: u64, bytes: &[u8]) -> u64 {
    for &byte in bytes {
        state ^= u64::from(byte);
        state = state.wrapping_mul(FNV_PRIME);
    }
    state
}

/// Streaming FNV-1a state.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    /// A hasher at the offset basis.
    pub const fn new() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }
}

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        self.state = fold(self.state, bytes);
    }
}

/// `BuildHasher` for plugging FNV-1a into std collections.
pub type Fnv1aBuildHasher = BuildHasherDefault<Fnv1aHasher>;

/// FNV-1a of a key's `Hash` byte stream.
///
/// This is the default [`HashFn`] of [`Table`](crate::Table).
pub fn fnv1a_hash<K: Hash + ?Sized>(key: &K) -> u64 {
    let mut hasher = Fnv1aHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// FNV-1a of a key's raw bytes, with nothing added.
///
/// For `&str`, `&[u8]` and byte [`Span`](crate::Span) keys this equals
/// [`hash_fnv1a`] of the referenced bytes.
pub fn fnv1a_bytes<K: AsRef<[u8]> + ?Sized>(key: &K) -> u64 {
    hash_fnv1a(key.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;
    use std::hash::BuildHasher;

    #[test]
    fn known_vectors() {
        assert_eq!(hash_fnv1a(b""), FNV_OFFSET_BASIS);
        assert_eq!(hash_fnv1a(b"a"), 0xAF63_DC4C_8601_EC8C);
        assert_eq!(hash_fnv1a(b"foobar"), 0x8594_4171_F739_67E8);
    }

    #[test]
    fn streaming_matches_one_shot() {
        let mut hasher = Fnv1aHasher::default();
        hasher.write(b"foo");
        hasher.write(b"bar");
        assert_eq!(hasher.finish(), hash_fnv1a(b"foobar"));
    }

    #[test]
    fn integer_keys_hash_native_bytes() {
        let key = 0x0102_0304_u32;
        assert_eq!(fnv1a_hash(&key), hash_fnv1a(&key.to_ne_bytes()));
    }

    #[test]
    fn byte_spans_hash_their_contents() {
        let span = Span::from("zero");
        assert_eq!(fnv1a_hash(&span), hash_fnv1a(b"zero"));
    }

    #[test]
    fn byte_keys_hash_exactly_their_bytes() {
        let expected = hash_fnv1a(b"zero");
        assert_eq!(fnv1a_bytes(&"zero"), expected);
        assert_eq!(fnv1a_bytes(&&b"zero"[..]), expected);
        assert_eq!(fnv1a_bytes(&Span::from("zero")), expected);
        assert_eq!(fnv1a_bytes(&String::from("zero")), expected);
    }

    #[test]
    fn std_hash_frames_str_and_slice_keys() {
        // `str` appends a terminator and `[u8]` a length prefix.
        assert_ne!(fnv1a_hash(&"zero"), hash_fnv1a(b"zero"));
        assert_ne!(fnv1a_hash(&&b"zero"[..]), hash_fnv1a(b"zero"));
    }

    #[test]
    fn build_hasher_agrees() {
        let build = Fnv1aBuildHasher::default();
        assert_eq!(build.hash_one(7_u64), fnv1a_hash(&7_u64));
    }
}
