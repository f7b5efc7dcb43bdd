#![doc = include_str!("../README.md")]

#![cfg_attr(not(test), no_std)]

#![warn(
    anonymous_parameters,
    missing_copy_implementations,
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_idioms,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_qualifications,
    variant_size_differences
)]

extern crate alloc;

use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FromIterator;

use alloc::vec::Vec;

use hashbrown::{DefaultHashBuilder, HashMap};

mod compact;
mod error;
mod iter;
mod slot;

#[cfg(test)]
mod proptests;

pub use compact::CompactionPolicy;
pub use error::{Error, Result};
pub use iter::{IntoIter, Iter, Keys, Values};

use slot::Slot;

/// A hash map laid out for fast whole-map iteration.
///
/// Entries live in a single slot vector in insertion order; a hash index maps
/// each key to its slot position. Removal only marks the slot dead, and the
/// index keeps pointing at the tombstone until a compaction pass (see
/// [`CompactionPolicy`]) sweeps dead slots out and re-addresses the survivors.
///
/// Not synchronized. Share it across threads behind a lock.
pub struct DenseMap<K, V, S = DefaultHashBuilder> {
    index: HashMap<K, usize, S>, // key -> position in slots, tombstones included
    slots: Vec<Slot<K, V>>,
    dead: usize,
    policy: CompactionPolicy,
}

impl<K, V> DenseMap<K, V, DefaultHashBuilder> {
    /// Creates an empty `DenseMap`.
    ///
    /// The map is initially created with a capacity of 0, so it will not
    /// allocate until it is first inserted into.
    #[inline]
    pub fn new() -> Self {
        Self::with_policy(CompactionPolicy::DEFAULT)
    }

    /// Creates an empty `DenseMap` with the specified capacity.
    ///
    /// The map will be able to hold at least `capacity` entries without
    /// reallocating. If `capacity` is 0, the map will not allocate.
    #[inline]
    pub fn with_capacity(n: usize) -> Self {
        Self {
            index: HashMap::with_capacity(n),
            slots: Vec::with_capacity(n),
            dead: 0,
            policy: CompactionPolicy::DEFAULT,
        }
    }

    /// Creates an empty `DenseMap` that compacts according to `policy`.
    #[inline]
    pub fn with_policy(policy: CompactionPolicy) -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
            dead: 0,
            policy,
        }
    }
}

impl<K, V, S> DenseMap<K, V, S> {
    /// Creates an empty `DenseMap` using the provided hasher `h`.
    #[inline]
    pub fn with_hasher(h: S) -> Self {
        Self::with_capacity_and_hasher(0, h)
    }

    /// Creates an empty `DenseMap` with the specified initial capacity `n` and hasher `h`.
    #[inline]
    pub fn with_capacity_and_hasher(n: usize, h: S) -> Self {
        Self {
            index: HashMap::with_capacity_and_hasher(n, h),
            slots: Vec::with_capacity(n),
            dead: 0,
            policy: CompactionPolicy::DEFAULT,
        }
    }

    /// Returns the number of live entries in the map.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.slots.len() - self.dead
    }

    /// Returns `true` if the map contains no live entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots in storage, tombstones included.
    #[inline(always)]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of tombstoned slots waiting for compaction.
    #[inline(always)]
    pub const fn dead_slots(&self) -> usize {
        self.dead
    }

    #[inline(always)]
    pub const fn policy(&self) -> CompactionPolicy {
        self.policy
    }

    /// Replaces the compaction policy. Takes effect on the next removal.
    #[inline]
    pub fn set_policy(&mut self, policy: CompactionPolicy) {
        self.policy = policy
    }

    /// Returns a reference to the map's hasher.
    #[inline]
    pub fn hasher(&self) -> &S {
        self.index.hasher()
    }

    /// Removes every entry and tombstone, keeping the allocated memory.
    #[inline]
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.dead = 0;
    }

    /// Calls `f` on each live entry in slot order until it returns `true`.
    ///
    /// Returning `true` from `f` stops the walk right away. The set of slots
    /// visited is fixed when the call starts. The map is borrowed for the
    /// whole walk, so it cannot be modified from inside `f`; doing so through
    /// interior mutability or raw pointers is undefined behavior, since a
    /// compaction would move slots out from under the scan.
    ///
    /// # Examples
    ///
    /// ```
    /// use dense_map::DenseMap;
    ///
    /// let map: DenseMap<u32, u32> = (0..10).map(|i| (i, i * i)).collect();
    ///
    /// let mut first_big = None;
    /// map.for_each_until(|k, v| {
    ///     if *v > 20 {
    ///         first_big = Some(*k);
    ///         return true
    ///     }
    ///     false
    /// });
    /// assert_eq!(first_big, Some(5));
    /// ```
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn for_each_until<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for slot in &self.slots {
            if let Some((key, value)) = slot.pair() {
                if f(key, value) {
                    break
                }
            }
        }
    }

    /// Returns an iterator over live entries in slot order.
    ///
    /// The iterator implements `ExactSizeIterator` and `FusedIterator`.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.len(),
        }
    }

    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    #[inline]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V, S> DenseMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Inserts a key-value pair into the map.
    ///
    /// A new key is appended as a fresh live slot. For a key that is already
    /// indexed, the stored value is overwritten in place and the slot's
    /// liveness is left alone: a live key returns its previous value, while a
    /// removed key that has not been compacted away yet takes the new value
    /// but stays removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dense_map::DenseMap;
    ///
    /// let mut map = DenseMap::new();
    /// assert_eq!(map.insert(5, "a"), None);
    /// assert_eq!(map.insert(5, "b"), Some("a"));
    /// assert_eq!(map.get(&5), Some(&"b"));
    /// ```
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&pos) = self.index.get(&key) {
            return self.slots[pos].overwrite(value)
        }

        // append to the end
        let pos = self.slots.len();
        self.index.insert(key.clone(), pos);
        self.slots.push(Slot::new(key, value));
        None
    }

    /// Removes a key from the map, returning its value if it was live.
    ///
    /// The slot becomes a tombstone and keeps its index entry. If the
    /// tombstones now cross the [`CompactionPolicy`] thresholds, the map is
    /// compacted before this returns.
    ///
    /// # Examples
    ///
    /// ```
    /// use dense_map::DenseMap;
    ///
    /// let mut map = DenseMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// assert_eq!(map.get(&1), None);
    /// ```
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let pos = *self.index.get(key)?;

        let value = self.slots[pos].kill()?;
        self.dead += 1;

        self.maybe_compact();
        Some(value)
    }

    /// Returns a reference to the value corresponding to the key, if it is live.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).and_then(|&pos| self.slots[pos].value())
    }

    /// Returns a mutable reference to the value corresponding to the key, if it is live.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let pos = *self.index.get(key)?;
        self.slots[pos].value_mut()
    }

    /// Returns `true` if the map contains a live value for the specified key.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Reserves capacity for at least `additional` more entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use dense_map::DenseMap;
    ///
    /// let mut map = DenseMap::<i32, i32>::new();
    /// map.reserve(100);
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.index.reserve(additional);
        self.slots.reserve(additional);
    }

    /// Fallible version of [`reserve`](Self::reserve).
    #[inline]
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.index.try_reserve(additional)?;
        self.slots.try_reserve(additional)?;
        Ok(())
    }
}

impl<K, V, S> FromIterator<(K, V)> for DenseMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: Default + BuildHasher,
{
    #[cfg_attr(feature = "inline-more", inline)]
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut map = DenseMap::with_capacity_and_hasher(iter.size_hint().0, S::default());
        iter.for_each(|(k, v)| _ = map.insert(k, v));
        map
    }
}

impl<K, V, S> Extend<(K, V)> for DenseMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    #[cfg_attr(feature = "inline-more", inline)]
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        let reserve = if self.is_empty() {
            iter.size_hint().0
        } else {
            (iter.size_hint().0 + 1) / 2
        };
        self.reserve(reserve);
        iter.for_each(move |(k, v)| _ = self.insert(k, v));
    }
}

impl<K, V, S> IntoIterator for DenseMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        let remaining = self.len();
        IntoIter {
            slots: self.slots.into_iter(),
            remaining,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a DenseMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> Default for DenseMap<K, V, S>
where
    S: Default,
{
    #[inline]
    fn default() -> Self {
        Self::with_capacity_and_hasher(0, S::default())
    }
}

impl<K, V, S> Clone for DenseMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    #[inline]
    fn clone(&self) -> Self {
        Self {
            index: self.index.clone(),
            slots: self.slots.clone(),
            dead: self.dead,
            policy: self.policy,
        }
    }
}

/// Two maps are equal when they hold the same live entries, in any order.
impl<K, V, S> PartialEq for DenseMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
    S: BuildHasher,
{
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for DenseMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Debug for DenseMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
