#![allow(dead_code)]
use rand::seq::SliceRandom;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

const SEED: u64 = 42;

// Trait for generating test data
pub trait TestData: Clone + Debug + Ord + Eq + Hash {
    fn generate(size: usize) -> Vec<Self>;
}

/// Draw `size` distinct values from `next`, in sorted order.
fn distinct<T: Ord>(size: usize, mut next: impl FnMut(&mut SmallRng) -> T) -> Vec<T> {
    let mut gen = SmallRng::seed_from_u64(SEED);
    let mut set = BTreeSet::new();
    while set.len() < size {
        set.insert(next(&mut gen));
    }
    set.into_iter().collect()
}

impl TestData for i64 {
    fn generate(size: usize) -> Vec<Self> {
        distinct(size, |gen| gen.random::<i64>())
    }
}

impl TestData for String {
    fn generate(size: usize) -> Vec<Self> {
        distinct(size, |gen| {
            let len = gen.random_range(5..20);
            (0..len)
                .map(|_| gen.random_range(b'a'..=b'z') as char)
                .collect()
        })
    }
}

impl<T> TestData for Arc<T>
where
    T: TestData + 'static,
{
    fn generate(size: usize) -> Vec<Self> {
        T::generate(size).into_iter().map(Arc::new).collect()
    }
}

pub fn reorder<A: Clone>(vec: &[A]) -> Vec<A> {
    let mut gen = SmallRng::seed_from_u64(SEED);
    let mut out = vec.to_vec();
    out.shuffle(&mut gen);
    out
}
