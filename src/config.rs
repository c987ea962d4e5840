// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// The level size of the trie, in bits.
/// Branching factor is 2 ^ HashLevelSize, and every level uses the same width.
// The small setting keeps nodes at eight slots so tests reach deep
// branches and collision buckets with few keys.
#[cfg(feature = "small-chunks")]
pub(crate) const HASH_LEVEL_SIZE: usize = 3;
#[cfg(not(feature = "small-chunks"))]
pub(crate) const HASH_LEVEL_SIZE: usize = 6;
