#![cfg(test)]

// Model-based property tests for ProbeMap, kept inside the crate so they
// can inspect tombstone and capacity counters.

use crate::config::MapConfig;
use crate::probe_map::ProbeMap;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations shrink toward earlier keys and shorter runs.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Get),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Iterate),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Drive `sut` and a std HashMap model through the same operations.
//
// Invariants checked after every step:
// - insert returns the model's previous value; get/contains agree with it.
// - remove returns the model's value and later lookups miss.
// - iteration yields each live key exactly once.
// - len parity; capacity is zero or a power of two; occupancy stays at or
//   under the configured threshold; tombstones never exceed free buckets.
fn run_model<S: BuildHasher>(
    mut sut: ProbeMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let threshold = sut.config().load_threshold();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = Key(pool[i].clone());
                prop_assert_eq!(sut.insert(k.clone(), v), model.insert(k, v));
            }
            Op::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k.as_str()), model.remove(&Key(k.clone())));
                prop_assert!(!sut.contains_key(k.as_str()));
            }
            Op::Get(i) => {
                let k = Key(pool[i].clone());
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            Op::Contains(s) => {
                prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&Key(s)));
            }
            Op::Mutate(i, d) => {
                let k = Key(pool[i].clone());
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.saturating_add(d);
                }
                if let Some(v) = model.get_mut(&k) {
                    *v = v.saturating_add(d);
                }
            }
            Op::Iterate => {
                let mut seen = BTreeSet::new();
                for (k, v) in sut.iter() {
                    prop_assert!(seen.insert(k.clone()), "duplicate key in iteration");
                    prop_assert_eq!(Some(v), model.get(k));
                }
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(seen, m_keys);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        let cap = sut.capacity();
        prop_assert!(cap == 0 || cap.is_power_of_two());
        if cap > 0 {
            prop_assert!(sut.len() * 100 <= cap * threshold);
            prop_assert!(sut.len() + sut.tombstones() <= cap);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_model(ProbeMap::new(), &pool, ops)?;
    }

    // Small initial table so resizes happen often.
    #[test]
    fn prop_state_machine_small_table((pool, ops) in arb_scenario()) {
        let cfg = MapConfig::new().with_initial_capacity(2).with_load_threshold(60);
        run_model(ProbeMap::with_config(cfg), &pool, ops)?;
    }

    // Worst-case collisions: every probe walks one long chain through
    // occupied buckets and tombstones.
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_model(ProbeMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}
