//! Byte ordering and sorted-sequence helpers
//!
//! Canonical key sets (multisig pubkeys, outpoint indexes, filter elements)
//! are kept as sorted, deduplicated vectors. Everything here orders byte
//! strings the way `memcmp` plus a length tiebreak does, which is what
//! slice `Ord` already implements.

use crate::error::{CodecError, Result};
use std::cmp::Ordering;
use std::fmt;

/// Lexicographic byte comparison, shorter sorts first on a common prefix
#[inline]
pub fn compare_bytes(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Compare `needle` against `haystack[start..start + needle.len()]`
///
/// Returns `Less` if the haystack does not have `needle.len()` bytes left
/// from `start`.
pub fn compare_at(haystack: &[u8], needle: &[u8], start: usize) -> Ordering {
    match haystack.get(start..) {
        Some(rest) if rest.len() >= needle.len() => rest[..needle.len()].cmp(needle),
        _ => Ordering::Less,
    }
}

#[inline]
pub fn is_zero(data: &[u8]) -> bool {
    data.iter().all(|&b| b == 0)
}

#[inline]
pub fn bytes_equal(a: &[u8], b: &[u8]) -> bool {
    a == b
}

/// Position of the first item equal to `needle`
pub fn index_of<T: AsRef<[u8]>>(items: &[T], needle: &[u8]) -> Option<usize> {
    items.iter().position(|item| item.as_ref() == needle)
}

/// Sorted copy of a key list
pub fn sort_keys<T: AsRef<[u8]> + Clone>(keys: &[T]) -> Vec<T> {
    let mut sorted = keys.to_vec();
    sorted.sort_by(|a, b| compare_bytes(a.as_ref(), b.as_ref()));
    sorted
}

/// Reverse the byte order of a hex string
///
/// Hashes are stored little-endian but displayed big-endian.
///
/// ```
/// use blvm_codec::ordering::rev_hex;
///
/// assert_eq!(rev_hex("0a0b0c").unwrap(), "0c0b0a");
/// ```
pub fn rev_hex(text: &str) -> Result<String> {
    if text.len() % 2 != 0 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CodecError::malformed("Invalid hex string"));
    }

    let mut out = String::with_capacity(text.len());
    for pair in text.as_bytes().chunks(2).rev() {
        out.push(char::from(pair[0]));
        out.push(char::from(pair[1]));
    }
    Ok(out)
}

/// Ten-digit zero-padded decimal
#[inline]
pub fn pad32(num: u32) -> String {
    format!("{num:010}")
}

/// Eight-digit zero-padded lowercase hex
#[inline]
pub fn hex32(num: u32) -> String {
    format!("{num:08x}")
}

/// Find `key` in a slice sorted under `compare`
///
/// `compare(item, key)` orders an element against the key.
pub fn binary_search<T, K, F>(items: &[T], key: &K, compare: F) -> Option<usize>
where
    K: ?Sized,
    F: FnMut(&T, &K) -> Ordering,
{
    match search(items, key, compare) {
        (index, true) => Some(index),
        (_, false) => None,
    }
}

/// Index of `key` if present, else the index of the first greater element
pub fn search_insert_position<T, K, F>(items: &[T], key: &K, compare: F) -> usize
where
    K: ?Sized,
    F: FnMut(&T, &K) -> Ordering,
{
    search(items, key, compare).0
}

fn search<T, K, F>(items: &[T], key: &K, mut compare: F) -> (usize, bool)
where
    K: ?Sized,
    F: FnMut(&T, &K) -> Ordering,
{
    let mut start = 0;
    let mut end = items.len();

    while start < end {
        let pos = start + (end - start) / 2;
        match compare(&items[pos], key) {
            Ordering::Equal => return (pos, true),
            Ordering::Less => start = pos + 1,
            Ordering::Greater => end = pos,
        }
    }

    (start, false)
}

/// Insert `item` keeping `items` sorted
///
/// Returns `Ok(index)` where the item landed. With `unique`, an equal
/// element already in place leaves `items` untouched and yields
/// `Err(index)` of that element.
pub fn binary_insert<T, F>(
    items: &mut Vec<T>,
    item: T,
    mut compare: F,
    unique: bool,
) -> std::result::Result<usize, usize>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let (index, found) = search(items, &item, &mut compare);

    if unique && found {
        return Err(index);
    }

    items.insert(index, item);
    Ok(index)
}

/// Remove an element equal to `key`, returning whether one was found
pub fn binary_remove<T, K, F>(items: &mut Vec<T>, key: &K, compare: F) -> bool
where
    K: ?Sized,
    F: FnMut(&T, &K) -> Ordering,
{
    match binary_search(items, key, compare) {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}

/// Sorted set of distinct byte strings
pub fn uniq_sorted<T, I>(items: I) -> Vec<T>
where
    T: AsRef<[u8]>,
    I: IntoIterator<Item = T>,
{
    let mut out = Vec::new();
    for item in items {
        let _ = binary_insert(
            &mut out,
            item,
            |a: &T, b: &T| compare_bytes(a.as_ref(), b.as_ref()),
            true,
        );
    }
    out
}

/// Vector kept sorted under a comparator, optionally rejecting duplicates
pub struct SortedVec<T, C = fn(&T, &T) -> Ordering> {
    items: Vec<T>,
    compare: C,
    unique: bool,
}

impl<T: Ord> SortedVec<T> {
    /// Natural ordering of `T`
    pub fn new(unique: bool) -> Self {
        Self::with_comparator(Ord::cmp, unique)
    }
}

impl<T: fmt::Debug, C> fmt::Debug for SortedVec<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedVec")
            .field("items", &self.items)
            .field("unique", &self.unique)
            .finish()
    }
}

impl<T, C> SortedVec<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    pub fn with_comparator(compare: C, unique: bool) -> Self {
        Self {
            items: Vec::new(),
            compare,
            unique,
        }
    }

    /// See [`binary_insert`]
    pub fn insert(&mut self, item: T) -> std::result::Result<usize, usize> {
        let result = binary_insert(&mut self.items, item, &self.compare, self.unique);
        if let Err(index) = result {
            tracing::trace!(index, "duplicate insert ignored");
        }
        result
    }

    pub fn remove(&mut self, item: &T) -> bool {
        binary_remove(&mut self.items, item, &self.compare)
    }

    pub fn find(&self, item: &T) -> Option<usize> {
        binary_search(&self.items, item, &self.compare)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.find(item).is_some()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T, C> Extend<T> for SortedVec<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            let _ = self.insert(item);
        }
    }
}
