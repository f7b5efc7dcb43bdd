/// One cell of slot storage.
///
/// A slot owns its key and payload. Once killed it becomes a tombstone: the
/// key stays (the index still points here) but the slot is skipped by every
/// read until compaction physically drops it.
#[derive(Debug, Clone)]
pub(crate) struct Slot<K, V> {
    pub(crate) key: K,
    value: Option<V>,
    live: bool,
}

impl<K, V> Slot<K, V> {
    #[inline(always)]
    pub(crate) const fn new(key: K, value: V) -> Self {
        let value = Some(value);
        Self { key, value, live: true }
    }

    #[inline(always)]
    pub(crate) const fn is_live(&self) -> bool {
        self.live
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<&V> {
        if self.live {
            self.value.as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> Option<&mut V> {
        if self.live {
            self.value.as_mut()
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn pair(&self) -> Option<(&K, &V)> {
        self.value().map(|value| (&self.key, value))
    }

    #[inline]
    pub(crate) fn into_pair(self) -> Option<(K, V)> {
        if self.live {
            self.value.map(|value| (self.key, value))
        } else {
            None
        }
    }

    /// Replaces the payload, leaving liveness alone.
    ///
    /// Returns the previous payload only if the slot was live. A tombstone
    /// takes the new payload but stays dead.
    #[inline]
    pub(crate) fn overwrite(&mut self, value: V) -> Option<V> {
        let previous = self.value.replace(value);
        if self.live {
            previous
        } else {
            None
        }
    }

    /// Turns a live slot into a tombstone and hands back its payload.
    #[inline]
    pub(crate) fn kill(&mut self) -> Option<V> {
        if !self.live {
            return None
        }
        self.live = false;
        self.value.take()
    }
}
