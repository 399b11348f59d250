//! ProbeMap: open-addressed hash map with linear probing and tombstones.
//!
//! Layout
//! - One bucket array whose length is zero (nothing allocated yet) or a
//!   power of two, so `hash & (capacity - 1)` picks the home bucket.
//! - Each bucket is empty, occupied, or a tombstone. Tombstones keep probe
//!   chains intact after a removal and are dropped by the next resize.
//!
//! Sizing
//! - The first insert allocates `MapConfig::initial_capacity` buckets.
//! - Before every insert, while `(len + 1) * 100` exceeds
//!   `capacity * threshold`, capacity doubles. Occupancy therefore never
//!   passes `floor(capacity * threshold / 100)`.
//!
//! Hashing
//! - The default hasher is 64-bit FNV-1a over the bytes the key's `Hash`
//!   impl feeds it. Equality is the key's `Eq`, so keys are free to have
//!   padding or indirection.
//! - Occupied buckets store their hash. Resizing never calls `K: Hash`.
//!
//! User code (`Hash`, `Eq`) only runs inside a probing section guarded by
//! a debug-only reentrancy check.

use crate::config::MapConfig;
use crate::failure::violation;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash, Hasher};
use core::mem;

const FNV_OFFSET_BASIS: u64 = 14_695_981_039_346_656_037;
const FNV_PRIME: u64 = 1_099_511_628_211;

/// 64-bit FNV-1a.
#[derive(Clone, Copy, Debug)]
pub struct Fnv1a(u64);

impl Default for Fnv1a {
    fn default() -> Self {
        Self(FNV_OFFSET_BASIS)
    }
}

impl Hasher for Fnv1a {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(FNV_PRIME);
        }
        self.0 = h;
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FnvBuildHasher;

impl BuildHasher for FnvBuildHasher {
    type Hasher = Fnv1a;
    fn build_hasher(&self) -> Fnv1a {
        Fnv1a::default()
    }
}

enum Bucket<K, V> {
    Empty,
    Tombstone,
    Occupied { hash: u64, key: K, value: V },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Purpose {
    Search,
    Insert,
}

enum Slot {
    /// Occupied bucket whose key matches.
    Found(usize),
    /// Where a new entry goes: the first tombstone seen, else the empty
    /// bucket that ended the walk.
    Vacant(usize),
    Missing,
}

pub struct ProbeMap<K, V, S = FnvBuildHasher> {
    buckets: Box<[Bucket<K, V>]>,
    len: usize,
    tombstones: usize,
    config: MapConfig,
    hasher: S,
    reentrancy: DebugReentrancy,
}

impl<K, V> ProbeMap<K, V>
where
    K: Hash + Eq,
{
    pub fn new() -> Self {
        Self::with_config_and_hasher(MapConfig::default(), FnvBuildHasher)
    }

    pub fn with_config(config: MapConfig) -> Self {
        Self::with_config_and_hasher(config, FnvBuildHasher)
    }
}

impl<K, V> Default for ProbeMap<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ProbeMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(MapConfig::default(), hasher)
    }

    /// Nothing is allocated until the first insert.
    pub fn with_config_and_hasher(config: MapConfig, hasher: S) -> Self {
        Self {
            buckets: Vec::new().into_boxed_slice(),
            len: 0,
            tombstones: 0,
            config,
            hasher,
            reentrancy: DebugReentrancy::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bucket count: zero or a power of two.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Buckets currently holding a tombstone.
    #[inline]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    pub fn config(&self) -> MapConfig {
        self.config
    }

    /// Insert or overwrite. Returns the previous value for `key`, if any.
    #[track_caller]
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.make_room();
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_one(&key);
        let i = match probe(&self.buckets, hash, &key, Purpose::Insert) {
            Slot::Found(i) | Slot::Vacant(i) => i,
            Slot::Missing => violation("probe map has no free bucket"),
        };
        let old = mem::replace(&mut self.buckets[i], Bucket::Occupied { hash, key, value });
        match old {
            Bucket::Occupied { value, .. } => Some(value),
            Bucket::Tombstone => {
                self.tombstones -= 1;
                self.len += 1;
                None
            }
            Bucket::Empty => {
                self.len += 1;
                None
            }
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.find(q)?;
        match &self.buckets[i] {
            Bucket::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.find(q)?;
        match &mut self.buckets[i] {
            Bucket::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.find(q)?;
        match &self.buckets[i] {
            Bucket::Occupied { key, value, .. } => Some((key, value)),
            _ => None,
        }
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Remove `q`, leaving a tombstone in its bucket.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.find(q)?;
        match mem::replace(&mut self.buckets[i], Bucket::Tombstone) {
            Bucket::Occupied { value, .. } => {
                self.len -= 1;
                self.tombstones += 1;
                Some(value)
            }
            other => {
                self.buckets[i] = other;
                None
            }
        }
    }

    /// Drop every entry; the bucket array stays allocated.
    pub fn clear(&mut self) {
        for b in self.buckets.iter_mut() {
            *b = Bucket::Empty;
        }
        self.len = 0;
        self.tombstones = 0;
    }

    /// Drop every entry and release the bucket array.
    pub fn free(&mut self) {
        self.buckets = Vec::new().into_boxed_slice();
        self.len = 0;
        self.tombstones = 0;
    }

    /// Entries in bucket order. The iterator borrows the map, so the map
    /// cannot change underneath it.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: &self.buckets,
            cursor: 0,
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.buckets.iter_mut(),
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    fn find<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.buckets.is_empty() {
            return None;
        }
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_one(q);
        match probe(&self.buckets, hash, q, Purpose::Search) {
            Slot::Found(i) => Some(i),
            Slot::Vacant(_) | Slot::Missing => None,
        }
    }

    // Allocate lazily, then double until one more entry fits under the
    // load threshold. No user code runs here.
    #[track_caller]
    fn make_room(&mut self) {
        if self.buckets.is_empty() {
            let cap = self.config.initial_capacity();
            self.buckets = empty_buckets(cap);
            tracing::debug!(capacity = cap, "probe map allocated");
        }
        let threshold = self.config.load_threshold();
        while (self.len + 1) * 100 > self.buckets.len() * threshold {
            let new_cap = match self.buckets.len().checked_mul(2) {
                Some(c) => c,
                None => violation("probe map capacity overflow"),
            };
            self.resize(new_cap);
        }
    }

    #[track_caller]
    fn resize(&mut self, new_cap: usize) {
        let old = mem::replace(&mut self.buckets, empty_buckets(new_cap));
        let dropped = mem::take(&mut self.tombstones);
        let mask = new_cap - 1;
        self.len = 0;
        for b in old.into_vec() {
            if let Bucket::Occupied { hash, key, value } = b {
                // Keys are unique and the new array has no tombstones: the
                // first empty bucket on the chain is the slot.
                let mut i = (hash as usize) & mask;
                while !matches!(self.buckets[i], Bucket::Empty) {
                    i = (i + 1) & mask;
                }
                self.buckets[i] = Bucket::Occupied { hash, key, value };
                self.len += 1;
            }
        }
        tracing::debug!(
            capacity = new_cap,
            len = self.len,
            dropped_tombstones = dropped,
            "probe map resized"
        );
    }
}

/// Walk the chain for `q` starting at its home bucket.
fn probe<K, V, Q>(buckets: &[Bucket<K, V>], hash: u64, q: &Q, purpose: Purpose) -> Slot
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    let cap = buckets.len();
    if cap == 0 {
        return Slot::Missing;
    }
    let mask = cap - 1;
    let mut i = (hash as usize) & mask;
    let mut first_tombstone = None;
    for _ in 0..cap {
        match &buckets[i] {
            Bucket::Empty => {
                return match purpose {
                    Purpose::Search => Slot::Missing,
                    Purpose::Insert => Slot::Vacant(first_tombstone.unwrap_or(i)),
                };
            }
            Bucket::Tombstone => {
                if purpose == Purpose::Insert && first_tombstone.is_none() {
                    first_tombstone = Some(i);
                }
            }
            Bucket::Occupied { hash: h, key, .. } => {
                if *h == hash && key.borrow() == q {
                    return Slot::Found(i);
                }
            }
        }
        i = (i + 1) & mask;
    }
    // Every bucket visited without meeting an empty one.
    match first_tombstone {
        Some(t) => Slot::Vacant(t),
        None => Slot::Missing,
    }
}

#[track_caller]
fn empty_buckets<K, V>(cap: usize) -> Box<[Bucket<K, V>]> {
    debug_assert!(cap.is_power_of_two());
    let mut v = Vec::new();
    if v.try_reserve_exact(cap).is_err() {
        violation(format!("allocation failure for {cap} buckets"));
    }
    v.resize_with(cap, || Bucket::Empty);
    v.into_boxed_slice()
}

/// Iterator over `(&K, &V)` in bucket order.
pub struct Iter<'a, K, V> {
    buckets: &'a [Bucket<K, V>],
    cursor: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(b) = self.buckets.get(self.cursor) {
            self.cursor += 1;
            if let Bucket::Occupied { key, value, .. } = b {
                self.remaining -= 1;
                return Some((key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in bucket order.
pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, Bucket<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        for b in self.it.by_ref() {
            if let Bucket::Occupied { key, value, .. } = b {
                self.remaining -= 1;
                return Some((&*key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V, S> IntoIterator for &'a ProbeMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for ProbeMap<K, V>
where
    K: Hash + Eq,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::new();
        m.extend(iter);
        m
    }
}

impl<K, V, S> Extend<(K, V)> for ProbeMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> fmt::Debug for ProbeMap<K, V, S>
where
    K: Hash + Eq + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
