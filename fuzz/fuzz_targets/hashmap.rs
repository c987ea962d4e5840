#![no_main]

use std::collections::HashMap as NatMap;
use std::fmt::Debug;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use hamtrie::HashMap;

#[derive(Arbitrary, Debug)]
enum Action<K, V> {
    Add(K, V),
    Insert(K, V),
    Lookup(K),
    Snapshot,
}

fuzz_target!(|actions: Vec<Action<u16, u32>>| {
    let mut map = HashMap::new();
    let mut nat = NatMap::new();
    let mut snapshots = Vec::new();
    for action in actions {
        match action {
            Action::Add(key, value) => {
                let next = map.add(key, value);
                assert_eq!(map.len(), nat.len());
                nat.insert(key, value);
                map = next;
            }
            Action::Insert(key, value) => {
                assert_eq!(nat.insert(key, value), map.insert(key, value));
            }
            Action::Lookup(key) => {
                assert_eq!(nat.get(&key), map.get(&key));
                assert_eq!(nat.contains_key(&key), map.contains_key(&key));
            }
            Action::Snapshot => snapshots.push((map.clone(), nat.clone())),
        }
        assert_eq!(nat.len(), map.len());
    }
    map.assert_invariants();
    assert_eq!(HashMap::from(nat.clone()), map);
    assert_eq!(map.iter().count(), nat.len());
    for (snapshot, nat) in snapshots {
        snapshot.assert_invariants();
        assert_eq!(HashMap::from(nat), snapshot);
    }
});
