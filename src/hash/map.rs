// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A persistent unordered map.
//!
//! An immutable hash map using [hash array mapped tries][1]. Adding a
//! key builds a new map which shares every node off the changed path
//! with the map it came from, so old versions stay valid and unchanged
//! and snapshots are just a [`Clone`].
//!
//! Lookups and insertions take O(log<sub>64</sub> n) steps, bounded by
//! the width of the 32 bit hash rather than the size of the map.
//!
//! Map entries will have a predictable order based on the hasher
//! being used. Unless otherwise specified, this will be the standard
//! [`RandomState`][std::collections::hash_map::RandomState] hasher.
//!
//! [1]: https://en.wikipedia.org/wiki/Hash_array_mapped_trie
//! [std::collections::hash_map::RandomState]: https://doc.rust-lang.org/std/collections/hash_map/struct.RandomState.html

use std::borrow::Borrow;
use std::collections;
use std::collections::hash_map::RandomState;
use std::fmt::{Debug, Error, Formatter};
use std::hash::{BuildHasher, Hash};
use std::iter::{FromIterator, FusedIterator};
use std::ops::Index;

use archery::{SharedPointer, SharedPointerKind};

use crate::nodes::hamt::{hash_key, Iter as NodeIter, Node};
use crate::shared_ptr::DefaultSharedPtr;

/// Construct a hash map from a sequence of key/value pairs.
///
/// # Examples
///
/// ```
/// # #[macro_use] extern crate hamtrie;
/// # use hamtrie::HashMap;
/// # fn main() {
/// assert_eq!(
///   hashmap!{
///     1 => 11,
///     2 => 22,
///     3 => 33
///   },
///   HashMap::from(vec![(1, 11), (2, 22), (3, 33)])
/// );
/// # }
/// ```
#[macro_export]
macro_rules! hashmap {
    () => { $crate::hashmap::HashMap::new() };

    ( $( $key:expr => $value:expr ),* ) => {{
        let mut map = $crate::hashmap::HashMap::new();
        $({
            map.insert($key, $value);
        })*;
        map
    }};

    ( $( $key:expr => $value:expr ,)* ) => {{
        let mut map = $crate::hashmap::HashMap::new();
        $({
            map.insert($key, $value);
        })*;
        map
    }};
}

/// Type alias for [`GenericHashMap`] that uses [`std::hash::RandomState`] as the default hasher and [`DefaultSharedPtr`] as the pointer type.
///
/// [GenericHashMap]: ./struct.GenericHashMap.html
/// [`std::hash::RandomState`]: https://doc.rust-lang.org/stable/std/collections/hash_map/struct.RandomState.html
/// [DefaultSharedPtr]: ../shared_ptr/type.DefaultSharedPtr.html
pub type HashMap<K, V> = GenericHashMap<K, V, RandomState, DefaultSharedPtr>;

/// A persistent unordered map.
///
/// The map is a handle on the root of a hash array mapped trie. Each trie
/// node keeps two bitmaps over its slots, one for entries stored inline
/// and one for child subtrees, so a slot costs nothing unless it's used
/// and most keys never need a node of their own.
///
/// [`add`][GenericHashMap::add] never changes the map it's called on: it
/// returns a new map, and both can be used (and shared between threads)
/// from then on. [`insert`][GenericHashMap::insert] is the same operation
/// rebinding `self` to the result.
///
/// Keys whose hashes are identical are kept together in a collision
/// bucket and told apart by [`Eq`], so a weak hasher costs speed, never
/// correctness.
pub struct GenericHashMap<K, V, S, P: SharedPointerKind> {
    size: usize,
    root: Option<SharedPointer<Node<K, V, P>, P>>,
    hasher: S,
}

impl<K, V, P> GenericHashMap<K, V, RandomState, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    P: SharedPointerKind,
{
    /// Construct a hash map with a single mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hamtrie::HashMap;
    /// let map = HashMap::unit(123, "onetwothree");
    /// assert_eq!(
    ///   map.get(&123),
    ///   Some(&"onetwothree")
    /// );
    /// ```
    #[inline]
    #[must_use]
    pub fn unit(k: K, v: V) -> GenericHashMap<K, V, RandomState, P> {
        GenericHashMap::new().add(k, v)
    }
}

impl<K, V, S, P: SharedPointerKind> GenericHashMap<K, V, S, P> {
    /// Construct an empty hash map.
    #[inline]
    #[must_use]
    pub fn new() -> Self
    where
        S: Default,
    {
        Self::default()
    }

    /// Construct the empty hash map.
    ///
    /// Every empty map shares the same absent root, so this doesn't
    /// allocate.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # use hamtrie::HashMap;
    /// let map = HashMap::<i32, i32>::empty();
    /// assert!(map.is_empty());
    /// assert!(!map.contains_key(&1));
    /// ```
    #[inline]
    #[must_use]
    pub fn empty() -> Self
    where
        S: Default,
    {
        Self::default()
    }

    /// Test whether a hash map is empty.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hamtrie;
    /// # use hamtrie::hashmap::HashMap;
    /// assert!(
    ///   !hashmap!{1 => 2}.is_empty()
    /// );
    /// assert!(
    ///   HashMap::<i32, i32>::new().is_empty()
    /// );
    /// ```
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the size of a hash map.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hamtrie;
    /// # use hamtrie::hashmap::HashMap;
    /// assert_eq!(3, hashmap!{
    ///   1 => 11,
    ///   2 => 22,
    ///   3 => 33
    /// }.len());
    /// ```
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Test whether two maps refer to the same content in memory.
    ///
    /// This is true if the two sides are references to the same map,
    /// or if the two maps refer to the same root node.
    ///
    /// This would return true if you're comparing a map to itself, or
    /// if you're comparing a map to a fresh clone of itself.
    ///
    /// Time: O(1)
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => SharedPointer::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Construct an empty hash map using the provided hasher.
    #[inline]
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        GenericHashMap {
            size: 0,
            hasher,
            root: None,
        }
    }

    /// Get a reference to the map's [`BuildHasher`][BuildHasher].
    ///
    /// [BuildHasher]: https://doc.rust-lang.org/std/hash/trait.BuildHasher.html
    #[must_use]
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Get an iterator over the key/value pairs of a hash map.
    ///
    /// Please note that the order is consistent between maps using
    /// the same hasher, but no other ordering guarantee is offered.
    /// Items will not come out in insertion order or sort order.
    /// They will, however, come out in the same order every time for
    /// the same map.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter {
            it: NodeIter::new(self.root.as_deref(), self.size),
        }
    }

    /// Get an iterator over a hash map's keys.
    ///
    /// Same ordering caveats as [`iter`][GenericHashMap::iter].
    #[inline]
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V, P> {
        Keys {
            it: NodeIter::new(self.root.as_deref(), self.size),
        }
    }

    /// Get an iterator over a hash map's values.
    ///
    /// Same ordering caveats as [`iter`][GenericHashMap::iter].
    #[inline]
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V, P> {
        Values {
            it: NodeIter::new(self.root.as_deref(), self.size),
        }
    }

    /// Discard all elements from the map.
    ///
    /// Other maps sharing nodes with this one are unaffected.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hamtrie;
    /// # use hamtrie::HashMap;
    /// let mut map = hashmap![1=>1, 2=>2, 3=>3];
    /// let snapshot = map.clone();
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(3, snapshot.len());
    /// ```
    pub fn clear(&mut self) {
        self.root = None;
        self.size = 0;
    }
}

impl<K, V, S, P> GenericHashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: SharedPointerKind,
{
    fn test_eq<S2: BuildHasher, P2: SharedPointerKind>(
        &self,
        other: &GenericHashMap<K, V, S2, P2>,
    ) -> bool
    where
        V: PartialEq,
    {
        if self.len() != other.len() {
            return false;
        }
        // Keys are unique on both sides and the sizes match, so one
        // direction is enough.
        self.iter()
            .all(|(key, value)| other.get(key) == Some(value))
    }

    /// Get the value for a key from a hash map.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hamtrie;
    /// # use hamtrie::hashmap::HashMap;
    /// let map = hashmap!{123 => "lol"};
    /// assert_eq!(
    ///   map.get(&123),
    ///   Some(&"lol")
    /// );
    /// ```
    #[must_use]
    pub fn get<BK>(&self, key: &BK) -> Option<&V>
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Get the key/value pair for a key from a hash map.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hamtrie;
    /// # use hamtrie::hashmap::HashMap;
    /// let map = hashmap!{123 => "lol"};
    /// assert_eq!(
    ///   map.get_key_value(&123),
    ///   Some((&123, &"lol"))
    /// );
    /// ```
    #[must_use]
    pub fn get_key_value<BK>(&self, key: &BK) -> Option<(&K, &V)>
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        let root = self.root.as_ref()?;
        root.get(hash_key(&self.hasher, key), key)
    }

    /// Test for the presence of a key in a hash map.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hamtrie;
    /// # use hamtrie::hashmap::HashMap;
    /// let map = hashmap!{123 => "lol"};
    /// assert!(
    ///   map.contains_key(&123)
    /// );
    /// assert!(
    ///   !map.contains_key(&321)
    /// );
    /// ```
    #[inline]
    #[must_use]
    pub fn contains_key<BK>(&self, k: &BK) -> bool
    where
        BK: Hash + Eq + ?Sized,
        K: Borrow<BK>,
    {
        self.get_key_value(k).is_some()
    }

    /// Check the structure of the underlying trie.
    ///
    /// Panics if any node claims a slot in both of its bitmaps, if a
    /// node's entry or child count disagrees with its bitmaps, if an entry
    /// is stored off the path its hash selects, if a collision bucket is
    /// malformed, if a key can't be found again through the map's hasher,
    /// or if the stored size is wrong.
    #[cfg(any(test, feature = "debug"))]
    pub fn assert_invariants(&self) {
        let count = self
            .root
            .as_ref()
            .map_or(0, |root| root.assert_invariants(0, 0));
        assert_eq!(self.size, count, "map size disagrees with the trie");
        for (key, value) in self.iter() {
            match self.get_key_value(key) {
                Some((_, found)) => assert!(
                    std::ptr::eq(found, value),
                    "key resolves to a different entry, Hash and Eq disagree"
                ),
                None => panic!("stored key is unreachable through its hash"),
            }
        }
    }
}

impl<K, V, S, P> GenericHashMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
    P: SharedPointerKind,
{
    /// Construct a new hash map by inserting a key/value mapping into a map.
    ///
    /// If the map already has a mapping for the given key, the previous value
    /// is replaced in the new map. The original map is left as it was.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hamtrie;
    /// # use hamtrie::hashmap::HashMap;
    /// let map = hashmap!{123 => "123"};
    /// let next = map.add(123, "onetwothree").add(456, "456");
    /// assert_eq!(
    ///   next,
    ///   hashmap!{123 => "onetwothree", 456 => "456"}
    /// );
    /// assert_eq!(map, hashmap!{123 => "123"});
    /// ```
    #[must_use]
    pub fn add(&self, k: K, v: V) -> Self {
        let hash = hash_key(&self.hasher, &k);
        let (root, replaced) = match &self.root {
            Some(root) => {
                let (node, previous) = root.add(hash, 0, k, v);
                (node, previous.is_some())
            }
            None => (Node::unit(hash, 0, k, v), false),
        };
        GenericHashMap {
            size: if replaced { self.size } else { self.size + 1 },
            root: Some(SharedPointer::new(root)),
            hasher: self.hasher.clone(),
        }
    }

    /// Insert a key/value mapping into a map, rebinding it to the map
    /// [`add`][GenericHashMap::add] would return, and return the value
    /// previously bound to the key.
    ///
    /// Clones of the map taken before the call don't see the change.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate hamtrie;
    /// # use hamtrie::hashmap::HashMap;
    /// let mut map = hashmap!{};
    /// assert_eq!(None, map.insert(123, "123"));
    /// assert_eq!(Some("123"), map.insert(123, "onetwothree"));
    /// assert_eq!(
    ///   map,
    ///   hashmap!{123 => "onetwothree"}
    /// );
    /// ```
    pub fn insert(&mut self, k: K, v: V) -> Option<V> {
        let hash = hash_key(&self.hasher, &k);
        let (root, previous) = match &self.root {
            Some(root) => {
                let (node, previous) = root.add(hash, 0, k, v);
                (node, previous.cloned())
            }
            None => (Node::unit(hash, 0, k, v), None),
        };
        if previous.is_none() {
            self.size += 1;
        }
        self.root = Some(SharedPointer::new(root));
        previous
    }
}

// Core traits

impl<K, V, S, P> Clone for GenericHashMap<K, V, S, P>
where
    S: Clone,
    P: SharedPointerKind,
{
    /// Clone a map.
    ///
    /// Time: O(1)
    #[inline]
    fn clone(&self) -> Self {
        GenericHashMap {
            root: self.root.clone(),
            size: self.size,
            hasher: self.hasher.clone(),
        }
    }
}

impl<K, V, S1, S2, P1, P2> PartialEq<GenericHashMap<K, V, S2, P2>> for GenericHashMap<K, V, S1, P1>
where
    K: Hash + Eq,
    V: PartialEq,
    S1: BuildHasher,
    S2: BuildHasher,
    P1: SharedPointerKind,
    P2: SharedPointerKind,
{
    fn eq(&self, other: &GenericHashMap<K, V, S2, P2>) -> bool {
        self.test_eq(other)
    }
}

impl<K, V, S, P> Eq for GenericHashMap<K, V, S, P>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
    P: SharedPointerKind,
{
}

impl<K, V, S, P> Default for GenericHashMap<K, V, S, P>
where
    S: Default,
    P: SharedPointerKind,
{
    #[inline]
    fn default() -> Self {
        GenericHashMap {
            size: 0,
            root: None,
            hasher: Default::default(),
        }
    }
}

impl<K, V, S, RK, RV, P> Extend<(RK, RV)> for GenericHashMap<K, V, S, P>
where
    K: Hash + Eq + Clone + From<RK>,
    V: Clone + From<RV>,
    S: BuildHasher + Clone,
    P: SharedPointerKind,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (RK, RV)>,
    {
        for (key, value) in iter {
            self.insert(From::from(key), From::from(value));
        }
    }
}

impl<BK, K, V, S, P> Index<&BK> for GenericHashMap<K, V, S, P>
where
    BK: Hash + Eq + ?Sized,
    K: Hash + Eq + Borrow<BK>,
    S: BuildHasher,
    P: SharedPointerKind,
{
    type Output = V;

    fn index(&self, key: &BK) -> &Self::Output {
        match self.get(key) {
            None => panic!("HashMap::index: invalid key"),
            Some(value) => value,
        }
    }
}

impl<K, V, S, P> Debug for GenericHashMap<K, V, S, P>
where
    K: Debug,
    V: Debug,
    P: SharedPointerKind,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let mut d = f.debug_map();
        for (k, v) in self {
            d.entry(k, v);
        }
        d.finish()
    }
}

// Iterators

/// An iterator over the elements of a map.
pub struct Iter<'a, K, V, P: SharedPointerKind> {
    it: NodeIter<'a, K, V, P>,
}

// We impl Clone instead of deriving it, because we want Clone even if K and V aren't.
impl<'a, K, V, P: SharedPointerKind> Clone for Iter<'a, K, V, P> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
        }
    }
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Iter<'a, K, V, P> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Iter<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Iter<'a, K, V, P> {}

/// An iterator over the keys of a map.
pub struct Keys<'a, K, V, P: SharedPointerKind> {
    it: NodeIter<'a, K, V, P>,
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Keys<'a, K, V, P> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Keys<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Keys<'a, K, V, P> {}

/// An iterator over the values of a map.
pub struct Values<'a, K, V, P: SharedPointerKind> {
    it: NodeIter<'a, K, V, P>,
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Values<'a, K, V, P> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Values<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Values<'a, K, V, P> {}

impl<'a, K, V, S, P: SharedPointerKind> IntoIterator for &'a GenericHashMap<K, V, S, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Conversions

impl<K, V, S, P> FromIterator<(K, V)> for GenericHashMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from_iter<T>(i: T) -> Self
    where
        T: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::default();
        for (k, v) in i {
            map.insert(k, v);
        }
        map
    }
}

impl<'a, K, V, S, P> From<&'a [(K, V)]> for GenericHashMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from(m: &'a [(K, V)]) -> Self {
        m.iter().cloned().collect()
    }
}

impl<K, V, S, P> From<Vec<(K, V)>> for GenericHashMap<K, V, S, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default + Clone,
    P: SharedPointerKind,
{
    fn from(m: Vec<(K, V)>) -> Self {
        m.into_iter().collect()
    }
}

impl<K, V, S1, S2, P> From<collections::HashMap<K, V, S2>> for GenericHashMap<K, V, S1, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S1: BuildHasher + Default + Clone,
    S2: BuildHasher,
    P: SharedPointerKind,
{
    fn from(m: collections::HashMap<K, V, S2>) -> Self {
        m.into_iter().collect()
    }
}

impl<'a, K, V, S1, S2, P> From<&'a collections::HashMap<K, V, S2>> for GenericHashMap<K, V, S1, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S1: BuildHasher + Default + Clone,
    S2: BuildHasher,
    P: SharedPointerKind,
{
    fn from(m: &'a collections::HashMap<K, V, S2>) -> Self {
        m.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

// Tests

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared_ptr::RcK;
    use crate::test::{IdentityHasher, LolHasher};
    use ::proptest::prelude::any;
    use ::proptest::{collection, num::i16, proptest};
    use metrohash::MetroBuildHasher;
    use pretty_assertions::assert_eq;
    use proptest_derive::Arbitrary;
    use rand::{rngs::SmallRng, Rng, SeedableRng};
    use rayon::prelude::*;
    use static_assertions::{assert_impl_all, assert_not_impl_any};
    use std::hash::BuildHasherDefault;

    type IdentityMap<K, V> =
        GenericHashMap<K, V, BuildHasherDefault<IdentityHasher>, DefaultSharedPtr>;
    type LolMap<K, V> = GenericHashMap<K, V, BuildHasherDefault<LolHasher>, DefaultSharedPtr>;

    assert_impl_all!(HashMap<i32, i32>: Send, Sync);
    assert_not_impl_any!(HashMap<i32, *const i32>: Send, Sync);
    assert_not_impl_any!(HashMap<*const i32, i32>: Send, Sync);
    assert_not_impl_any!(GenericHashMap<i32, i32, RandomState, RcK>: Send, Sync);

    #[test]
    fn add_then_contains() {
        let map = IdentityMap::empty().add(1, 1);
        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
        map.assert_invariants();
    }

    #[test]
    fn latest_write_wins() {
        let map = IdentityMap::empty().add(1, 1).add(1, 2);
        assert_eq!(Some(&2), map.get(&1));
        assert_eq!(1, map.len());
        assert_eq!(vec![(&1, &2)], map.iter().collect::<Vec<_>>());
        map.assert_invariants();
    }

    #[test]
    fn distinct_low_slots_stay_in_root() {
        let map = (0..5).fold(IdentityMap::empty(), |map, i| map.add(i, i));
        for i in 0..5 {
            assert!(map.contains_key(&i));
        }
        assert!(!map.contains_key(&5));
        let root = map.root.as_ref().expect("non-empty map has a root");
        assert_eq!(5, root.assert_invariants(0, 0));
        assert!(format!("{:?}", **root).matches("Node[").count() == 1);
    }

    #[test]
    fn million_identity_keys() {
        let mut map = IdentityMap::empty();
        for i in 0..1_000_000u32 {
            map = map.add(i, i);
        }
        assert_eq!(1_000_000, map.len());
        for i in 0..1_000_000u32 {
            assert!(map.contains_key(&i), "{i} went missing");
        }
        map.assert_invariants();
    }

    #[test]
    fn seeded_random_keys() {
        let mut rng = SmallRng::seed_from_u64(42);
        let keys: Vec<i32> = (0..1002).map(|_| rng.random()).collect();
        let map = keys
            .iter()
            .fold(HashMap::empty(), |map, key| map.add(*key, *key));
        for key in &keys {
            assert_eq!(Some(key), map.get(key));
        }
        map.assert_invariants();
    }

    #[test]
    fn rigged_hash_collision() {
        // Both keys land on hash 1 with a four bit hasher.
        let map = LolMap::empty().add(1, "one").add(17, "seventeen");
        assert_eq!(2, map.len());
        assert_eq!(Some(&"one"), map.get(&1));
        assert_eq!(Some(&"seventeen"), map.get(&17));
        assert!(!map.contains_key(&33));
        let map = map.add(17, "SEVENTEEN").add(33, "thirty-three");
        assert_eq!(3, map.len());
        assert_eq!(Some(&"SEVENTEEN"), map.get(&17));
        assert_eq!(Some(&"thirty-three"), map.get(&33));
        map.assert_invariants();
    }

    #[test]
    fn old_versions_survive() {
        let v1: HashMap<usize, usize> = GenericHashMap::from_iter((0..131_072).map(|i| (i, i)));
        let v2 = v1.add(131_000, 23).add(200_000, 1);
        assert_eq!(Some(&23), v2.get(&131_000));
        assert_eq!(Some(&131_000), v1.get(&131_000));
        assert!(!v1.contains_key(&200_000));
        assert_eq!(131_072, v1.len());
        assert_eq!(131_073, v2.len());
        v1.assert_invariants();
        v2.assert_invariants();
    }

    #[test]
    fn insert_returns_previous() {
        let mut map = HashMap::new();
        assert_eq!(None, map.insert("a", 1));
        let snapshot = map.clone();
        assert!(snapshot.ptr_eq(&map));
        assert_eq!(Some(1), map.insert("a", 2));
        assert!(!snapshot.ptr_eq(&map));
        assert_eq!(Some(&1), snapshot.get("a"));
        assert_eq!(Some(&2), map.get("a"));
    }

    #[test]
    fn empty_maps_are_equal() {
        let a = HashMap::<i32, i32>::empty();
        let b = HashMap::<i32, i32>::new();
        assert!(a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_eq!(None, a.get(&0));
        assert_eq!(0, a.iter().count());
        a.assert_invariants();
    }

    #[test]
    fn index_operator() {
        let map: HashMap<usize, usize> = hashmap![1 => 2, 3 => 4, 5 => 6];
        assert_eq!(4, map[&3]);
    }

    #[test]
    #[should_panic(expected = "invalid key")]
    fn index_operator_missing_key() {
        let map: HashMap<usize, usize> = hashmap![1 => 2];
        let _ = map[&3];
    }

    #[test]
    fn proper_formatting() {
        let map: HashMap<usize, usize> = hashmap![1 => 2];
        assert_eq!("{1: 2}", format!("{:?}", map));

        assert_eq!("{}", format!("{:?}", HashMap::<(), ()>::new()));
    }

    #[test]
    fn match_string_keys_with_string_slices() {
        let map: HashMap<String, i32> = HashMap::from(vec![
            ("foo".to_string(), 1),
            ("bar".to_string(), 2),
            ("baz".to_string(), 3),
        ]);
        assert_eq!(Some(&1), map.get("foo"));
        assert_eq!(2, map["bar"]);
        assert!(!map.contains_key("qux"));
    }

    #[test]
    fn macro_allows_trailing_comma() {
        let map1: HashMap<&str, i32> = hashmap! {"x" => 1, "y" => 2};
        let map2: HashMap<&str, i32> = hashmap! {
            "x" => 1,
            "y" => 2,
        };
        assert_eq!(map1, map2);
    }

    #[test]
    fn conversions_and_extend() {
        let std_map: collections::HashMap<i32, i32> = (0..100).map(|i| (i, i * 2)).collect();
        let from_ref: HashMap<i32, i32> = HashMap::from(&std_map);
        let from_owned: HashMap<i32, i32> = HashMap::from(std_map.clone());
        let pairs: Vec<(i32, i32)> = std_map.iter().map(|(k, v)| (*k, *v)).collect();
        let from_slice: HashMap<i32, i32> = HashMap::from(&pairs[..]);
        assert_eq!(from_ref, from_owned);
        assert_eq!(from_ref, from_slice);

        let mut extended = HashMap::<i64, i64>::new();
        extended.extend((0..100).map(|i: i32| (i, i * 2)));
        assert_eq!(100, extended.len());
        assert_eq!(Some(&198), extended.get(&99));
    }

    #[test]
    fn other_hashers() {
        let map: GenericHashMap<u64, u64, MetroBuildHasher, DefaultSharedPtr> =
            (0..10_000).map(|i| (i, i)).collect();
        assert_eq!(10_000, map.len());
        for i in 0..10_000 {
            assert_eq!(Some(&i), map.get(&i));
        }
        map.assert_invariants();

        let rc_map: GenericHashMap<u64, u64, RandomState, RcK> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(map, rc_map);
    }

    #[test]
    fn concurrent_adds_from_one_map() {
        let base: HashMap<u32, u32> = (0..10_000).map(|i| (i, i)).collect();
        let forks: Vec<HashMap<u32, u32>> = (0..64u32)
            .into_par_iter()
            .map(|i| base.add(i, i + 1).add(100_000 + i, i))
            .collect();
        for (i, fork) in (0..64u32).zip(&forks) {
            assert_eq!(10_001, fork.len());
            assert_eq!(Some(&(i + 1)), fork.get(&i));
            assert_eq!(Some(&i), fork.get(&(100_000 + i)));
            assert!(!fork.contains_key(&(100_000 + (i + 1) % 64)));
        }
        assert_eq!(10_000, base.len());
        assert!((0..10_000).into_par_iter().all(|i| base.get(&i) == Some(&i)));
    }

    #[test]
    fn large_map() {
        let mut map = HashMap::<_, _>::new();
        let size = 32769;
        for i in 0..size {
            map.insert(i, i);
        }
        assert_eq!(size, map.len());
        for i in 0..size {
            assert_eq!(Some(&i), map.get(&i));
        }
    }

    #[derive(Arbitrary, Debug)]
    enum Action {
        Add(i16, i16),
        Lookup(i16),
        Snapshot,
    }

    proptest! {
        #[test]
        fn add_and_length(ref m in collection::hash_map(i16::ANY, i16::ANY, 0..1000)) {
            let mut map: LolMap<i16, i16> = Default::default();
            for (index, (k, v)) in m.iter().enumerate() {
                map = map.add(*k, *v);
                assert_eq!(Some(v), map.get(k));
                assert_eq!(index + 1, map.len());
            }
            map.assert_invariants();
        }

        #[test]
        fn lookup(ref m in collection::hash_map(i16::ANY, i16::ANY, 0..1000)) {
            let map: HashMap<i16, i16> = FromIterator::from_iter(m.iter().map(|(k, v)| (*k, *v)));
            for (k, v) in m {
                assert_eq!(Some(*v), map.get(k).cloned(), "{k} not found in map {map:?}");
            }
        }

        #[test]
        fn equality(ref m in collection::hash_map(i16::ANY, i16::ANY, 0..1000)) {
            let map1: HashMap<i16, i16> = FromIterator::from_iter(m.iter().map(|(k, v)| (*k, *v)));
            let map2: LolMap<i16, i16> = FromIterator::from_iter(m.iter().map(|(k, v)| (*k, *v)));
            assert_eq!(map1, map2);
        }

        #[test]
        fn iterate_over(ref m in collection::hash_map(i16::ANY, i16::ANY, 0..1000)) {
            let map: LolMap<i16, i16> = FromIterator::from_iter(m.iter().map(|(k, v)| (*k, *v)));
            let mut seen: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
            let mut expected: Vec<_> = m.iter().map(|(k, v)| (*k, *v)).collect();
            seen.sort();
            expected.sort();
            assert_eq!(expected, seen);
        }

        #[test]
        fn exact_size_iterator(ref m in crate::proptest::hash_map(i16::ANY, i16::ANY, 0..100)) {
            let mut should_be = m.len();
            let mut it = m.iter();
            loop {
                assert_eq!(should_be, it.len());
                match it.next() {
                    None => break,
                    Some(_) => should_be -= 1,
                }
            }
            assert_eq!(0, it.len());
        }

        #[test]
        fn against_std_model(ref actions in collection::vec(any::<Action>(), 0..400)) {
            let mut map: LolMap<i16, i16> = Default::default();
            let mut model = collections::HashMap::new();
            let mut snapshots = Vec::new();
            for action in actions {
                match *action {
                    Action::Add(k, v) => {
                        let previous = model.insert(k, v);
                        assert_eq!(previous, map.insert(k, v));
                    }
                    Action::Lookup(k) => {
                        assert_eq!(model.get(&k), map.get(&k));
                        assert_eq!(model.contains_key(&k), map.contains_key(&k));
                    }
                    Action::Snapshot => snapshots.push((map.clone(), model.clone())),
                }
                assert_eq!(model.len(), map.len());
            }
            map.assert_invariants();
            for (snapshot, model) in snapshots {
                snapshot.assert_invariants();
                assert_eq!(model.len(), snapshot.len());
                for (k, v) in &model {
                    assert_eq!(Some(v), snapshot.get(k));
                }
            }
        }

        #[test]
        fn persistence(ref m in collection::hash_map(i16::ANY, i16::ANY, 0..300),
                       ref extra in collection::vec((i16::ANY, i16::ANY), 1..50)) {
            let m1: LolMap<i16, i16> = FromIterator::from_iter(m.iter().map(|(k, v)| (*k, *v)));
            let mut m2 = m1.clone();
            for (k, v) in extra {
                m2 = m2.add(*k, *v);
            }
            assert_eq!(m.len(), m1.len());
            for (k, v) in m {
                assert_eq!(Some(v), m1.get(k));
            }
            for (k, _) in extra {
                let last = extra.iter().rev().find(|(k2, _)| k2 == k).map(|(_, v)| v);
                assert_eq!(last, m2.get(k));
            }
            m1.assert_invariants();
            m2.assert_invariants();
        }
    }
}
