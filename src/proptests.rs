use crate::{CompactionPolicy, DenseMap};

use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

fn validate_map<V>(m: &DenseMap<u16, V>) {
    assert_eq!(
        m.index.len(),
        m.slots.len(),
        "every slot, tombstone or not, must be indexed"
    );
    for (key, &pos) in m.index.iter() {
        assert!(pos < m.slots.len(), "index points past slot storage");
        assert_eq!(&m.slots[pos].key, key, "index entry names the wrong slot");
    }

    let dead = m.slots.iter().filter(|slot| !slot.is_live()).count();
    assert_eq!(dead, m.dead_slots(), "dead counter out of sync");
    assert_eq!(m.len(), m.slots.len() - dead);
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u64),
    Remove(u16),
    Get(u16),
    Compact,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    // a small key space so removals and overwrites actually collide
    let key = 0u16..256;
    let op = prop_oneof![
        45 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        35 => key.clone().prop_map(Op::Remove),
        19 => key.clone().prop_map(Op::Get),
        1 => Just(Op::Compact),
    ];
    prop::collection::vec(op, 0..=2000)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    /// Applies the same ops to a `DenseMap` and a `HashMap`.
    ///
    /// Keys that were ever removed are not re-inserted: re-inserting onto a
    /// tombstone does not revive the key, which a plain `HashMap` can't model.
    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t: DenseMap<u16, u64> = DenseMap::new();
        let mut m: HashMap<u16, u64> = HashMap::new();
        let mut removed: HashSet<u16> = HashSet::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    if removed.contains(&key) {
                        continue;
                    }
                    prop_assert_eq!(t.insert(key, value), m.insert(key, value));
                }
                Op::Remove(key) => {
                    removed.insert(key);
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                }
                Op::Compact => {
                    t.compact();
                    prop_assert_eq!(t.dead_slots(), 0);
                    prop_assert_eq!(t.slot_count(), t.len());
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_map(&t);
        let got: BTreeMap<u16, u64> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: BTreeMap<u16, u64> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    /// Length always matches the number of keys `get` can see, including
    /// keys re-inserted onto tombstones.
    #[test]
    fn prop_len_matches_visible_keys(ops in ops_strategy()) {
        let mut t: DenseMap<u16, u64> = DenseMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    t.insert(key, value);
                }
                Op::Remove(key) => {
                    let len = t.len();
                    let was_live = t.contains_key(&key);
                    let removed = t.remove(&key);
                    prop_assert_eq!(removed.is_some(), was_live);
                    prop_assert_eq!(t.len(), if was_live { len - 1 } else { len });
                }
                Op::Get(_) => {}
                Op::Compact => t.compact(),
            }
        }

        validate_map(&t);
        let visible = (0u16..256).filter(|k| t.get(k).is_some()).count();
        prop_assert_eq!(t.len(), visible);
        prop_assert_eq!(t.iter().count(), visible);
    }

    /// A compaction pass never changes what the map holds.
    #[test]
    fn prop_compaction_is_invisible(
        keys in prop::collection::hash_set(any::<u16>(), 0..500),
        remove_mask in prop::collection::vec(any::<bool>(), 500),
    ) {
        let mut t = DenseMap::with_policy(CompactionPolicy::never());
        for (i, &key) in keys.iter().enumerate() {
            t.insert(key, i as u64);
        }
        for (&key, &gone) in keys.iter().zip(&remove_mask) {
            if gone {
                t.remove(&key);
            }
        }

        let before: BTreeMap<u16, u64> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let len = t.len();

        t.compact();
        validate_map(&t);

        prop_assert_eq!(t.len(), len);
        prop_assert_eq!(t.slot_count(), len);
        let after: BTreeMap<u16, u64> = t.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&after, &before);
        for (k, v) in &before {
            prop_assert_eq!(t.get(k), Some(v));
        }
    }
}

#[test]
fn early_stop_visits_exactly_one() {
    for n in [1u16, 2, 50] {
        let mut t = DenseMap::new();
        for k in 0..n {
            t.insert(k, ());
        }
        let mut visits = 0;
        t.for_each_until(|_, _| {
            visits += 1;
            true
        });
        assert_eq!(visits, 1);
        validate_map(&t);
    }
}

#[test]
fn automatic_compaction_keeps_index_consistent() {
    let mut t = DenseMap::new();
    for k in 0..1000u16 {
        t.insert(k, u64::from(k));
    }
    // remove from the front so survivors have to move into the holes
    for k in 0..950u16 {
        t.remove(&k);
        validate_map(&t);
    }
    assert!(t.slot_count() < 1000);
    for k in 950..1000u16 {
        assert_eq!(t.get(&k), Some(&u64::from(k)));
    }
}
