use core::hash::{BuildHasher, Hash};

use tracing::debug;

use crate::DenseMap;

/// When a removal should trigger a compaction pass.
///
/// Both conditions must hold: more than `min_dead_slots` tombstones, and
/// tombstones making up more than `max_dead_ratio` of all slots. The absolute
/// floor keeps tiny maps from compacting on every other removal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompactionPolicy {
    pub min_dead_slots: usize,
    pub max_dead_ratio: f32,
}

impl CompactionPolicy {
    /// More than 10 dead slots, more than 80% of storage dead.
    pub const DEFAULT: Self = Self::new(10, 0.8);

    #[inline]
    pub const fn new(min_dead_slots: usize, max_dead_ratio: f32) -> Self {
        Self { min_dead_slots, max_dead_ratio }
    }

    /// A policy that never fires; storage only shrinks on an explicit
    /// [`DenseMap::compact`].
    #[inline]
    pub const fn never() -> Self {
        Self::new(usize::MAX, f32::INFINITY)
    }

    #[inline]
    pub fn should_compact(&self, dead_slots: usize, slot_count: usize) -> bool {
        dead_slots > self.min_dead_slots
            && dead_slots as f32 / slot_count as f32 > self.max_dead_ratio
    }
}

impl Default for CompactionPolicy {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl<K, V, S> DenseMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Drops every tombstone and packs the live slots into a dense prefix.
    ///
    /// Runs a write cursor up from the front and a read cursor down from the
    /// back. Each live slot the read cursor finds is swapped into the first
    /// hole at or above the write cursor, and the hole's stale key leaves the
    /// index. Tombstones the read cursor passes over just lose their index
    /// entry. Slots already sitting in the live prefix are never touched, so
    /// only the tail moves; survivors do not keep their relative order.
    ///
    /// Called automatically from [`remove`](Self::remove) when the
    /// [`CompactionPolicy`] fires. O(number of slots).
    ///
    /// # Examples
    ///
    /// ```
    /// use dense_map::{CompactionPolicy, DenseMap};
    ///
    /// let mut map = DenseMap::with_policy(CompactionPolicy::never());
    /// for i in 0..6 {
    ///     map.insert(i, i * 10);
    /// }
    /// map.remove(&1);
    /// map.remove(&3);
    /// assert_eq!(map.slot_count(), 6);
    ///
    /// map.compact();
    /// assert_eq!(map.slot_count(), 4);
    /// assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![0, 5, 2, 4]);
    /// ```
    pub fn compact(&mut self) {
        if self.dead == 0 {
            return
        }

        let before = self.slots.len();
        let live = before - self.dead;

        let mut write = 0;
        let mut end = before;
        while end > write {
            let read = end - 1;
            if self.slots[read].is_live() {
                while write < read && self.slots[write].is_live() {
                    write += 1
                }
                if write != read {
                    // the slot at `write` is a tombstone, its key goes away
                    self.index.remove(&self.slots[write].key);
                    self.slots.swap(write, read);
                    if let Some(pos) = self.index.get_mut(&self.slots[write].key) {
                        *pos = write
                    }
                }
            } else {
                self.index.remove(&self.slots[read].key);
            }
            end = read;
        }

        // `write` sits on a tombstone only when nothing survived
        let keep = if self.slots.get(write).is_some_and(|slot| slot.is_live()) {
            write + 1
        } else {
            write
        };
        self.slots.truncate(keep);
        self.dead = 0;

        debug_assert_eq!(self.slots.len(), live);
        debug_assert_eq!(self.index.len(), live);
        debug!(before, after = keep, reclaimed = before - keep, "compacted slot storage");
    }

    /// Runs [`compact`](Self::compact) if the policy says the tombstones have
    /// piled up far enough.
    #[cfg_attr(feature = "inline-more", inline)]
    pub(crate) fn maybe_compact(&mut self) {
        if self.policy.should_compact(self.dead, self.slots.len()) {
            tracing::trace!(
                dead = self.dead,
                slots = self.slots.len(),
                "dead slot threshold crossed"
            );
            self.compact()
        }
    }
}
