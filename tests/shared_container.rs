// ==============================================
// SHARED CONTAINER CONCURRENCY TESTS (integration)
// ==============================================
//
// Several threads insert, touch and expire through one SharedContainer.
// These require multi-threaded execution and cannot live inline.

#![cfg(feature = "concurrency")]

use std::sync::{Arc, Barrier};
use std::thread;

use agedkit::clock::ManualClock;
use agedkit::sync::SharedContainer;
use agedkit::{AgedHashMultiMap, AgedMap};

// ==============================================
// Writers racing on disjoint keys
// ==============================================

mod disjoint_writers {
    use super::*;

    #[test]
    fn every_insert_lands_once() {
        let clock = Arc::new(ManualClock::new(0));
        let shared = SharedContainer::new(AgedHashMultiMap::<u32, u32, _>::new(Arc::clone(&clock)));
        let threads = 8;
        let per_thread = 200;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads as u32)
            .map(|t| {
                let shared = shared.clone();
                let clock = Arc::clone(&clock);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..per_thread {
                        clock.advance(1);
                        shared.write(|m| m.insert(i, t)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.len(), threads * per_thread as usize);
        shared.read(|m| {
            for key in 0..per_thread {
                assert_eq!(m.count(&key), threads);
            }
            m.check_invariants().unwrap();
        });
    }
}

// ==============================================
// Readers alongside an expiring writer
// ==============================================

mod expiry_under_readers {
    use super::*;

    #[test]
    fn readers_never_see_a_torn_container() {
        let clock = Arc::new(ManualClock::new(0));
        let shared = SharedContainer::new(AgedMap::<u32, u64, _>::new(Arc::clone(&clock)));
        for key in 0..500 {
            clock.advance(1);
            shared.write(|m| m.insert(key, u64::from(key))).unwrap();
        }

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        shared.read(|m| {
                            let whens: Vec<_> = m.chronological().iter().map(|e| e.when()).collect();
                            assert!(whens.windows(2).all(|w| w[0] <= w[1]));
                            assert_eq!(whens.len(), m.len());
                        });
                    }
                })
            })
            .collect();

        let writer = {
            let shared = shared.clone();
            let clock = Arc::clone(&clock);
            thread::spawn(move || {
                let mut expired = 0;
                for cutoff in (50..=500).step_by(50) {
                    clock.advance(1);
                    shared.touch(&499);
                    expired += shared.pop_while(|e| e.when() <= cutoff).len();
                }
                expired
            })
        };

        for reader in readers {
            reader.join().unwrap();
        }
        let expired = writer.join().unwrap();
        assert_eq!(expired + shared.len(), 500);
        assert!(shared.contains_key(&499));
        shared.read(|m| m.check_invariants()).unwrap();
    }
}
