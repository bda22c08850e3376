#![no_main]

use agedkit::clock::ManualClock;
use agedkit::AgedHashMultiMap;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on a hashed multimap
//
// Exercises insert, touch, erase, erase by id, pop_oldest and explicit
// rehash, then audits both indices after every step.
fuzz_target!(|data: &[u8]| {
    let clock = ManualClock::new(0);
    let mut map: AgedHashMultiMap<u8, u32, _> = AgedHashMultiMap::with_bucket_count(&clock, 1);
    let mut ids = Vec::new();

    for pair in data.chunks_exact(2) {
        let op = pair[0] % 8;
        let arg = pair[1];

        match op {
            0 | 1 => {
                // insert
                let before = map.count(&(arg % 32));
                let id = map.insert(arg % 32, u32::from(arg)).unwrap();
                assert_eq!(map.count(&(arg % 32)), before + 1);
                assert_eq!(map.chronological().back_id(), Some(id));
                ids.push(id);
            }
            2 => {
                // touch
                clock.advance(1);
                let touched = map.touch(&(arg % 32));
                assert_eq!(touched, map.count(&(arg % 32)));
                if touched > 0 {
                    let back = map.chronological().back().unwrap();
                    assert_eq!(*back.key(), arg % 32);
                    assert_eq!(back.when(), clock.now());
                }
            }
            3 => {
                // erase by key
                map.erase(&(arg % 32));
                assert!(!map.contains_key(&(arg % 32)));
            }
            4 => {
                // erase by id
                if !ids.is_empty() {
                    let id = ids.swap_remove(usize::from(arg) % ids.len());
                    map.erase_at(id);
                    assert!(map.element(id).is_none());
                }
            }
            5 => {
                // pop_oldest
                let front = map.chronological().front_id();
                let popped = map.pop_oldest();
                assert_eq!(front.is_some(), popped.is_some());
            }
            6 => {
                // rehash
                map.rehash(usize::from(arg)).unwrap();
                assert!(map.load_factor() <= map.max_load_factor());
            }
            _ => {
                clock.advance(u64::from(arg));
            }
        }

        map.check_invariants().unwrap();
    }
});
