// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::iter::FusedIterator;
use std::slice::Iter as SliceIter;

use archery::{SharedPointer, SharedPointerKind};
use bitmaps::{Bits, BitsImpl};
use tracing::trace;

pub(crate) use crate::config::HASH_LEVEL_SIZE as HASH_SHIFT;
pub(crate) const HASH_WIDTH: usize = 2_usize.pow(HASH_SHIFT as u32);
pub(crate) type Bitmap = <BitsImpl<HASH_WIDTH> as Bits>::Store; // a uint of HASH_WIDTH bits
pub(crate) type HashBits = u32;
pub(crate) const HASH_BITS: usize = HashBits::BITS as usize;
const HASH_MASK: HashBits = (HASH_WIDTH - 1) as HashBits;

// A whole level has to fit in one 64 bit bitmap.
const _: () = assert!(HASH_WIDTH <= 64);

pub(crate) fn hash_key<K: Hash + ?Sized, S: BuildHasher>(bh: &S, key: &K) -> HashBits {
    let mut hasher = bh.build_hasher();
    key.hash(&mut hasher);
    hasher.finish() as HashBits
}

/// The slot `hash` selects at the level which starts at bit `shift`.
#[inline]
pub(crate) fn slot(hash: HashBits, shift: usize) -> usize {
    debug_assert!(shift < HASH_BITS);
    (hash >> shift & HASH_MASK) as usize
}

#[inline]
pub(crate) fn bit_of(slot: usize) -> Bitmap {
    1 << slot
}

/// The compacted array position of `bit` in `bitmap`: the number of set
/// bits strictly below it. `bit` must have exactly one bit set.
#[inline]
pub(crate) fn rank(bitmap: Bitmap, bit: Bitmap) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

// Copy-on-write edits of a compacted slot array. The source slice is owned
// by a node that may be reachable from another map, so it is only read.

fn inserted<A: Clone>(items: &[A], index: usize, item: A) -> Vec<A> {
    let mut out = Vec::with_capacity(items.len() + 1);
    out.extend_from_slice(&items[..index]);
    out.push(item);
    out.extend_from_slice(&items[index..]);
    out
}

fn removed<A: Clone>(items: &[A], index: usize) -> Vec<A> {
    let mut out = Vec::with_capacity(items.len() - 1);
    out.extend_from_slice(&items[..index]);
    out.extend_from_slice(&items[index + 1..]);
    out
}

fn replaced<A: Clone>(items: &[A], index: usize, item: A) -> Vec<A> {
    let mut out = Vec::with_capacity(items.len());
    out.extend_from_slice(&items[..index]);
    out.push(item);
    out.extend_from_slice(&items[index + 1..]);
    out
}

/// A key/value pair stored directly in a node, with the full hash it was
/// placed by.
#[derive(Clone)]
pub(crate) struct Entry<K, V> {
    key: K,
    value: V,
    hash: HashBits,
}

/// Two or more entries whose keys share one full hash.
#[derive(Clone)]
pub(crate) struct CollisionNode<K, V> {
    hash: HashBits,
    data: Vec<(K, V)>,
}

pub(crate) enum Child<K, V, P: SharedPointerKind> {
    Node(SharedPointer<Node<K, V, P>, P>),
    Collision(SharedPointer<CollisionNode<K, V>, P>),
}

impl<K, V, P: SharedPointerKind> Clone for Child<K, V, P> {
    fn clone(&self) -> Self {
        match self {
            Child::Node(node) => Child::Node(node.clone()),
            Child::Collision(coll) => Child::Collision(coll.clone()),
        }
    }
}

impl<K, V, P: SharedPointerKind> From<CollisionNode<K, V>> for Child<K, V, P> {
    fn from(node: CollisionNode<K, V>) -> Self {
        Child::Collision(SharedPointer::new(node))
    }
}

impl<K, V, P: SharedPointerKind> From<Node<K, V, P>> for Child<K, V, P> {
    fn from(node: Node<K, V, P>) -> Self {
        Child::Node(SharedPointer::new(node))
    }
}

/// A compound trie node.
///
/// Each of the `HASH_WIDTH` slots is either empty, an inline entry (bit
/// set in `value_map`) or a child (bit set in `branch_map`), never both.
/// `values` and `children` hold one element per set bit, in ascending bit
/// order, so an element's position is the [`rank`] of its bit.
///
/// Nodes are never modified once built. Every operation which changes the
/// map builds new nodes along the path to the change and shares everything
/// else with the previous version.
pub(crate) struct Node<K, V, P: SharedPointerKind> {
    value_map: Bitmap,
    branch_map: Bitmap,
    values: Vec<Entry<K, V>>,
    children: Vec<Child<K, V, P>>,
}

impl<K, V, P: SharedPointerKind> Node<K, V, P> {
    /// A node holding a single inline entry, placed for the level at `shift`.
    pub(crate) fn unit(hash: HashBits, shift: usize, key: K, value: V) -> Self {
        Node {
            value_map: bit_of(slot(hash, shift)),
            branch_map: 0,
            values: vec![Entry { key, value, hash }],
            children: Vec::new(),
        }
    }

    fn single_child(index: usize, child: Child<K, V, P>) -> Self {
        Node {
            value_map: 0,
            branch_map: bit_of(index),
            values: Vec::new(),
            children: vec![child],
        }
    }

    /// Build the smallest subtree holding two entries with distinct hashes
    /// which agree on every bit below `shift`.
    fn merge_values(entry1: Entry<K, V>, entry2: Entry<K, V>, shift: usize) -> Self {
        debug_assert_ne!(entry1.hash, entry2.hash);
        let index1 = slot(entry1.hash, shift);
        let index2 = slot(entry2.hash, shift);
        if index1 != index2 {
            // Both values fit on the same level.
            let values = if index1 < index2 {
                vec![entry1, entry2]
            } else {
                vec![entry2, entry1]
            };
            Node {
                value_map: bit_of(index1) | bit_of(index2),
                branch_map: 0,
                values,
                children: Vec::new(),
            }
        } else {
            // Pass the values down a level.
            let node = Node::merge_values(entry1, entry2, shift + HASH_SHIFT);
            Node::single_child(index1, Child::from(node))
        }
    }

    pub(crate) fn get<BK>(&self, hash: HashBits, key: &BK) -> Option<(&K, &V)>
    where
        BK: Eq + ?Sized,
        K: Borrow<BK>,
    {
        let mut node = self;
        let mut shift = 0;
        loop {
            let bit = bit_of(slot(hash, shift));
            if node.branch_map & bit != 0 {
                match &node.children[rank(node.branch_map, bit)] {
                    Child::Node(child) => {
                        node = &**child;
                        shift += HASH_SHIFT;
                    }
                    Child::Collision(coll) => return coll.get(hash, key),
                }
            } else if node.value_map & bit != 0 {
                let entry = &node.values[rank(node.value_map, bit)];
                return if entry.hash == hash && key == entry.key.borrow() {
                    Some((&entry.key, &entry.value))
                } else {
                    None
                };
            } else {
                return None;
            }
        }
    }
}

impl<K, V, P> Node<K, V, P>
where
    K: Clone + Eq,
    V: Clone,
    P: SharedPointerKind,
{
    /// Build a new node with `key` bound to `value` in the subtree rooted
    /// here, which sits at the level starting at `shift`.
    ///
    /// The second half of the result is the value `key` was bound to
    /// before, if any.
    pub(crate) fn add(&self, hash: HashBits, shift: usize, key: K, value: V) -> (Self, Option<&V>) {
        let bit = bit_of(slot(hash, shift));
        if self.branch_map & bit != 0 {
            let index = rank(self.branch_map, bit);
            let (child, previous) = self.children[index].add(hash, shift + HASH_SHIFT, key, value);
            let node = Node {
                value_map: self.value_map,
                branch_map: self.branch_map,
                values: self.values.clone(),
                children: replaced(&self.children, index, child),
            };
            (node, previous)
        } else if self.value_map & bit != 0 {
            let index = rank(self.value_map, bit);
            let current = &self.values[index];
            if current.hash == hash && current.key == key {
                let node = Node {
                    value_map: self.value_map,
                    branch_map: self.branch_map,
                    values: replaced(&self.values, index, Entry { key, value, hash }),
                    children: self.children.clone(),
                };
                return (node, Some(&current.value));
            }
            let child = if current.hash == hash {
                trace!(hash, "hash collision, creating bucket");
                Child::from(CollisionNode::new(
                    hash,
                    (current.key.clone(), current.value.clone()),
                    (key, value),
                ))
            } else {
                debug_assert!(
                    current.key != key,
                    "equal keys produced different hashes, Hash and Eq disagree"
                );
                let entry = Entry { key, value, hash };
                Child::from(Node::merge_values(current.clone(), entry, shift + HASH_SHIFT))
            };
            (self.value_to_branch(bit, index, child), None)
        } else {
            let node = Node {
                value_map: self.value_map | bit,
                branch_map: self.branch_map,
                values: inserted(&self.values, rank(self.value_map, bit), Entry { key, value, hash }),
                children: self.children.clone(),
            };
            (node, None)
        }
    }

    /// Replace the inline entry at `bit` (found at `value_index`) with a
    /// child, which now holds that entry.
    fn value_to_branch(&self, bit: Bitmap, value_index: usize, child: Child<K, V, P>) -> Self {
        Node {
            value_map: self.value_map & !bit,
            branch_map: self.branch_map | bit,
            values: removed(&self.values, value_index),
            children: inserted(&self.children, rank(self.branch_map, bit), child),
        }
    }
}

impl<K, V, P> Child<K, V, P>
where
    K: Clone + Eq,
    V: Clone,
    P: SharedPointerKind,
{
    fn add(&self, hash: HashBits, shift: usize, key: K, value: V) -> (Self, Option<&V>) {
        match self {
            Child::Node(node) => {
                let (node, previous) = node.add(hash, shift, key, value);
                (Child::from(node), previous)
            }
            Child::Collision(coll) if coll.hash == hash => {
                let (coll, previous) = coll.add(key, value);
                (Child::from(coll), previous)
            }
            Child::Collision(coll) => {
                // The new hash only shares a prefix with the bucket, so the
                // bucket moves one level down under a fresh node which can
                // tell the two apart.
                trace!(hash, bucket = coll.hash, "splitting hash collision bucket");
                let wrapper = Node::single_child(slot(coll.hash, shift), self.clone());
                let (node, _) = wrapper.add(hash, shift, key, value);
                (Child::from(node), None)
            }
        }
    }
}

impl<K, V> CollisionNode<K, V> {
    fn new(hash: HashBits, pair1: (K, V), pair2: (K, V)) -> Self {
        CollisionNode {
            hash,
            data: vec![pair1, pair2],
        }
    }

    fn get<BK>(&self, hash: HashBits, key: &BK) -> Option<(&K, &V)>
    where
        BK: Eq + ?Sized,
        K: Borrow<BK>,
    {
        if hash != self.hash {
            return None;
        }
        self.data
            .iter()
            .find(|(k, _)| key == k.borrow())
            .map(|(k, v)| (k, v))
    }
}

impl<K: Clone + Eq, V: Clone> CollisionNode<K, V> {
    fn add(&self, key: K, value: V) -> (Self, Option<&V>) {
        match self.data.iter().position(|(k, _)| *k == key) {
            Some(index) => {
                let node = CollisionNode {
                    hash: self.hash,
                    data: replaced(&self.data, index, (key, value)),
                };
                (node, Some(&self.data[index].1))
            }
            None => {
                trace!(hash = self.hash, len = self.data.len() + 1, "growing hash collision bucket");
                let node = CollisionNode {
                    hash: self.hash,
                    data: inserted(&self.data, self.data.len(), (key, value)),
                };
                (node, None)
            }
        }
    }
}

// Invariant checks

/// Mask of the hash bits which pick the path to a node at `shift`.
#[cfg(any(test, feature = "debug"))]
fn path_mask(shift: usize) -> HashBits {
    if shift >= HASH_BITS {
        HashBits::MAX
    } else {
        (1 << shift) - 1
    }
}

#[cfg(any(test, feature = "debug"))]
impl<K: Eq, V, P: SharedPointerKind> Node<K, V, P> {
    /// Walk the subtree rooted at this node, which was reached through the
    /// hash bits `path` and sits at `shift`, and return its entry count.
    ///
    /// Panics if a slot is claimed by both bitmaps, if a compacted array
    /// disagrees with its bitmap, or if any entry's hash doesn't lead to
    /// where it is stored.
    pub(crate) fn assert_invariants(&self, shift: usize, path: HashBits) -> usize {
        assert!(shift < HASH_BITS, "compound node below the last hash level");
        assert_eq!(
            self.value_map & self.branch_map,
            0,
            "slot holds both a value and a branch"
        );
        assert_eq!(self.values.len(), self.value_map.count_ones() as usize);
        assert_eq!(self.children.len(), self.branch_map.count_ones() as usize);
        assert!(
            !self.values.is_empty() || !self.children.is_empty(),
            "empty compound node"
        );
        let mut count = 0;
        for index in 0..HASH_WIDTH {
            let bit = bit_of(index);
            if self.value_map & bit != 0 {
                let entry = &self.values[rank(self.value_map, bit)];
                assert_eq!(entry.hash & path_mask(shift), path, "entry off its hash path");
                assert_eq!(slot(entry.hash, shift), index, "entry in the wrong slot");
                count += 1;
            } else if self.branch_map & bit != 0 {
                let child_path = path | (index as HashBits) << shift;
                count += match &self.children[rank(self.branch_map, bit)] {
                    Child::Node(node) => node.assert_invariants(shift + HASH_SHIFT, child_path),
                    Child::Collision(coll) => coll.assert_invariants(shift + HASH_SHIFT, child_path),
                };
            }
        }
        count
    }
}

#[cfg(any(test, feature = "debug"))]
impl<K: Eq, V> CollisionNode<K, V> {
    fn assert_invariants(&self, shift: usize, path: HashBits) -> usize {
        assert!(self.data.len() >= 2, "collision bucket with a single entry");
        assert_eq!(self.hash & path_mask(shift), path, "bucket off its hash path");
        for (index, (key, _)) in self.data.iter().enumerate() {
            assert!(
                self.data[index + 1..].iter().all(|(other, _)| other != key),
                "duplicate key in collision bucket"
            );
        }
        self.data.len()
    }
}

// Ref iterator

pub(crate) struct Iter<'a, K, V, P: SharedPointerKind> {
    count: usize,
    stack: Vec<(SliceIter<'a, Entry<K, V>>, SliceIter<'a, Child<K, V, P>>)>,
    collision: Option<SliceIter<'a, (K, V)>>,
}

// We impl Clone instead of deriving it, because we want Clone even if K and V aren't.
impl<'a, K, V, P: SharedPointerKind> Clone for Iter<'a, K, V, P> {
    fn clone(&self) -> Self {
        Self {
            count: self.count,
            stack: self.stack.clone(),
            collision: self.collision.clone(),
        }
    }
}

impl<'a, K, V, P: SharedPointerKind> Iter<'a, K, V, P> {
    pub(crate) fn new(root: Option<&'a Node<K, V, P>>, size: usize) -> Self {
        let mut result = Iter {
            count: size,
            stack: Vec::with_capacity(HASH_BITS / HASH_SHIFT + 2),
            collision: None,
        };
        if let Some(node) = root {
            result.stack.push((node.values.iter(), node.children.iter()));
        }
        result
    }
}

impl<'a, K, V, P: SharedPointerKind> Iterator for Iter<'a, K, V, P> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        'outer: loop {
            if let Some(coll) = &mut self.collision {
                match coll.next() {
                    None => self.collision = None,
                    Some((key, value)) => {
                        self.count -= 1;
                        return Some((key, value));
                    }
                }
            }

            while let Some((values, children)) = self.stack.last_mut() {
                if let Some(entry) = values.next() {
                    self.count -= 1;
                    return Some((&entry.key, &entry.value));
                }
                match children.next() {
                    Some(Child::Node(child)) => {
                        self.stack.push((child.values.iter(), child.children.iter()));
                    }
                    Some(Child::Collision(coll)) => {
                        self.collision = Some(coll.data.iter());
                        continue 'outer;
                    }
                    None => {
                        self.stack.pop();
                    }
                }
            }
            return None;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.count, Some(self.count))
    }
}

impl<'a, K, V, P: SharedPointerKind> ExactSizeIterator for Iter<'a, K, V, P> {}

impl<'a, K, V, P: SharedPointerKind> FusedIterator for Iter<'a, K, V, P> {}

impl<K: fmt::Debug, V: fmt::Debug, P: SharedPointerKind> fmt::Debug for Node<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Node[ ")?;
        for index in 0..HASH_WIDTH {
            let bit = bit_of(index);
            if self.value_map & bit != 0 {
                let entry = &self.values[rank(self.value_map, bit)];
                write!(f, "{}: {:?} => {:?} :: {}, ", index, entry.key, entry.value, entry.hash)?;
            } else if self.branch_map & bit != 0 {
                match &self.children[rank(self.branch_map, bit)] {
                    Child::Node(node) => write!(f, "{}: {:?}, ", index, &**node)?,
                    Child::Collision(coll) => {
                        write!(f, "{}: Coll{:?} :: {}, ", index, coll.data, coll.hash)?
                    }
                }
            }
        }
        write!(f, " ]")
    }
}
