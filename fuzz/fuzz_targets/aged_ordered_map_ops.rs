#![no_main]

use agedkit::clock::ManualClock;
use agedkit::AgedMap;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on an ordered map
//
// Keeps a sorted-key check and a time-order check alongside the invariant
// audit, including range erase in both orders.
fuzz_target!(|data: &[u8]| {
    let clock = ManualClock::new(0);
    let mut map: AgedMap<u8, u8, _> = AgedMap::new(&clock);

    for pair in data.chunks_exact(2) {
        let op = pair[0] % 6;
        let arg = pair[1];

        match op {
            0 | 1 => {
                let (id, inserted) = map.insert(arg, arg).unwrap();
                assert_eq!(map.find(&arg), Some(id));
                if inserted {
                    assert_eq!(map.chronological().back_id(), Some(id));
                }
            }
            2 => {
                clock.advance(1);
                map.touch(&arg);
            }
            3 => {
                // erase a key range in primary order
                if let Some(first) = map.lower_bound(&arg) {
                    let last = map.upper_bound(&arg.saturating_add(8));
                    map.erase_range(first, last);
                    assert!(map.range(arg..=arg.saturating_add(8)).next().is_none());
                }
            }
            4 => {
                // erase the oldest few in time order
                if let Some(first) = map.chronological().front_id() {
                    let mut last = Some(first);
                    for _ in 0..(arg % 4) {
                        last = last.and_then(|id| map.chronological().next(id));
                    }
                    map.erase_chronological_range(first, last);
                }
            }
            _ => {
                map.pop_oldest();
            }
        }

        let keys: Vec<_> = map.keys().copied().collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        let whens: Vec<_> = map.chronological().iter().map(|e| e.when()).collect();
        assert!(whens.windows(2).all(|w| w[0] <= w[1]));
        map.check_invariants().unwrap();
    }
});
