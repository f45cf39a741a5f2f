//! Property tests for the persistent array and the rollback union-find.

#![allow(clippy::expect_used)]

use std::collections::HashMap;

use proptest::prelude::*;

use bisim_core::{DisjointSet, PersistentArray};

/// A scripted sequence of writes: `(index, value)` pairs over a fixed-size
/// array.
fn arb_writes(len: usize) -> impl Strategy<Value = Vec<(usize, i64)>> {
    prop::collection::vec((0..len, any::<i64>()), 0..40)
}

/// Pairs to union over a small key space, so collisions and no-op unions are
/// frequent.
fn arb_unions() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..12, 0u8..12), 0..30)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every version of the array agrees with a plain `Vec` replay of the
    /// writes that produced it, no matter how reads interleave.
    #[test]
    fn array_versions_agree_with_vec_replay(writes in arb_writes(8)) {
        let len = 8;
        let base = PersistentArray::new(len, |_| 0i64).expect("non-zero length");

        let mut versions = vec![base];
        let mut models: Vec<Vec<i64>> = vec![vec![0; len]];
        for &(index, value) in &writes {
            let latest = versions.last().expect("non-empty");
            let next = latest.set(index, value).expect("index in bounds");
            let mut model = models.last().expect("non-empty").clone();
            model[index] = value;
            versions.push(next);
            models.push(model);
        }

        // Reading old versions after new ones exist forces rerooting both
        // directions along the lineage.
        for (version, model) in versions.iter().zip(&models).rev() {
            for i in 0..len {
                prop_assert_eq!(version.get(i).expect("in bounds"), model[i]);
            }
        }
        for (version, model) in versions.iter().zip(&models) {
            for i in 0..len {
                prop_assert_eq!(version.get(i).expect("in bounds"), model[i]);
            }
        }
    }

    /// `set` never mutates the receiver version.
    #[test]
    fn set_leaves_the_receiver_unchanged(
        writes in arb_writes(6),
        index in 0usize..6,
        value in any::<i64>(),
    ) {
        let base = PersistentArray::new(6, |i| i as i64).expect("non-zero length");
        let mut version = base;
        for &(i, v) in &writes {
            version = version.set(i, v).expect("in bounds");
        }

        let before: Vec<i64> = (0..6).map(|i| version.get(i).expect("in bounds")).collect();
        let _updated = version.set(index, value).expect("in bounds");
        let after: Vec<i64> = (0..6).map(|i| version.get(i).expect("in bounds")).collect();
        prop_assert_eq!(before, after);
    }

    /// `resize` preserves every existing slot and fills new ones from `init`.
    #[test]
    fn resize_preserves_existing_slots(
        writes in arb_writes(4),
        extra in 1usize..8,
    ) {
        let base = PersistentArray::new(4, |_| 0i64).expect("non-zero length");
        let mut version = base;
        for &(i, v) in &writes {
            version = version.set(i, v).expect("in bounds");
        }

        let grown = version.resize(4 + extra, |_| -1).expect("growing");
        for i in 0..4 {
            prop_assert_eq!(
                grown.get(i).expect("in bounds"),
                version.get(i).expect("in bounds")
            );
        }
        for i in 4..4 + extra {
            prop_assert_eq!(grown.get(i).expect("in bounds"), -1);
        }
    }

    /// `deunion(n)` after `n` unions restores the relation exactly, observed
    /// through `equivalent` on every key pair.
    #[test]
    fn deunion_is_the_inverse_of_union(
        before in arb_unions(),
        during in arb_unions(),
    ) {
        let mut set: DisjointSet<u8> = DisjointSet::new();
        for (a, b) in &before {
            set.union(a, b);
        }

        let snapshot: HashMap<(u8, u8), bool> = pairs()
            .map(|(a, b)| ((a, b), set.equivalent(&a, &b)))
            .collect();

        for (a, b) in &during {
            set.union(a, b);
        }
        set.deunion(during.len()).expect("count matches");

        for (a, b) in pairs() {
            prop_assert_eq!(
                set.equivalent(&a, &b),
                snapshot[&(a, b)],
                "pair ({}, {}) changed across a rollback", a, b
            );
        }
    }

    /// The relation after a union script matches a naive model that joins
    /// key groups by exhaustive closure.
    #[test]
    fn union_find_agrees_with_a_naive_model(unions in arb_unions()) {
        let mut set: DisjointSet<u8> = DisjointSet::new();
        let mut model: Vec<u8> = (0..12).collect();
        for &(a, b) in &unions {
            set.union(&a, &b);
            let (ra, rb) = (model[a as usize], model[b as usize]);
            if ra != rb {
                for slot in &mut model {
                    if *slot == rb {
                        *slot = ra;
                    }
                }
            }
        }
        for (a, b) in pairs() {
            prop_assert_eq!(
                set.equivalent(&a, &b),
                model[a as usize] == model[b as usize]
            );
        }
    }

    /// `deunion_all` always returns to the all-singletons relation.
    #[test]
    fn deunion_all_restores_singletons(unions in arb_unions()) {
        let mut set: DisjointSet<u8> = DisjointSet::new();
        for (a, b) in &unions {
            set.union(a, b);
        }
        set.deunion_all();
        prop_assert_eq!(set.recorded_unions(), 0);
        for (a, b) in pairs() {
            prop_assert_eq!(set.equivalent(&a, &b), a == b);
        }
    }
}

fn pairs() -> impl Iterator<Item = (u8, u8)> {
    (0u8..12).flat_map(|a| (0u8..12).map(move |b| (a, b)))
}
