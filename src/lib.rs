// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! # Persistent hash array mapped tries
//!
//! This crate provides a persistent map built on a hash array mapped trie
//! (HAMT). A persistent map never changes once built: adding a key gives
//! you a new map, and the old one is still there, still valid and still
//! the same. The two share every node the insertion didn't touch, so an
//! update costs one path through the trie, not a copy of the whole thing.
//!
//! ## How it's laid out
//!
//! The 32 bit hash of a key is consumed a few bits at a time, six bits
//! per level by default, each group picking one slot in a node. A node
//! keeps two bitmaps over its slots: one marks slots holding a key/value
//! pair inline, the other marks slots pointing at a deeper node. Only the
//! occupied slots take up memory, packed in slot order, and the position
//! of a slot's contents is the number of set bits below it in its bitmap.
//!
//! A key lives inline until another key claims its slot, at which point
//! both move down into a new node and keep descending until their hashes
//! tell them apart. Keys whose hashes are equal all the way down end up
//! in a collision bucket and are told apart by [`Eq`].
//!
//! Lookups and insertions take a number of steps bounded by the hash
//! width divided by the level width, which is at most six for the
//! default configuration, no matter how large the map grows.
//!
//! ## Sharing
//!
//! Nodes are linked through reference counted pointers from the
//! [`archery`][archery] crate. [`HashMap`] uses [`Arc`][std::sync::Arc]
//! so maps can be sent between and shared across threads. Use
//! [`GenericHashMap`] with [`RcK`][shared_ptr::RcK] to get cheaper
//! single threaded maps.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! | ------- | ----------- |
//! | [`debug`](https://doc.rust-lang.org/cargo/reference/features.html) | Exposes `assert_invariants` outside of tests |
//! | [`small-chunks`](https://doc.rust-lang.org/cargo/reference/features.html) | Uses three bit levels, making deep tries easy to reach in tests |
//! | [`triomphe`](https://crates.io/crates/triomphe/) | Uses `triomphe::Arc` as the default shared pointer |
//! | [`proptest`](https://crates.io/crates/proptest) | Strategies for generating maps with proptest |
//! | [`quickcheck`](https://crates.io/crates/quickcheck) | [`quickcheck::Arbitrary`](https://docs.rs/quickcheck/latest/quickcheck/trait.Arbitrary.html) implementation |
//! | [`arbitrary`](https://crates.io/crates/arbitrary/) | [`arbitrary::Arbitrary`](https://docs.rs/arbitrary/latest/arbitrary/trait.Arbitrary.html) implementation |
//! | [`serde`](https://crates.io/crates/serde) | [`Serialize`](https://docs.rs/serde/latest/serde/trait.Serialize.html) and [`Deserialize`](https://docs.rs/serde/latest/serde/trait.Deserialize.html) implementations |
//!
//! [archery]: https://docs.rs/archery/latest/archery/

#![forbid(rust_2018_idioms)]
#![deny(nonstandard_style)]
#![warn(unreachable_pub, missing_docs)]

mod config;
mod nodes;

#[macro_use]
#[path = "hash/map.rs"]
pub mod hashmap;

pub mod shared_ptr;

#[cfg(feature = "arbitrary")]
mod arbitrary;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest;
#[cfg(feature = "quickcheck")]
mod quickcheck;
#[cfg(any(test, feature = "serde"))]
mod ser;

pub use crate::hashmap::{GenericHashMap, HashMap};
