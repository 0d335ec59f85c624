// ==============================================
// TRACKER → WEAK CACHE PIPELINE (integration)
// ==============================================
//
// The strong reference pool is the only thing keeping a weakly keyed entry
// reachable. Releasing a pooled key must turn its entry into garbage that
// reads as absent and is reaped by clean_up.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use weakkit::builder::WeakCacheBuilder;
use weakkit::cache::WeakCache;
use weakkit::harness::key::Key;
use weakkit::harness::tracker::{Admission, StrongRefTracker};

fn weak_key_cache() -> WeakCache<Key, u32> {
    WeakCacheBuilder::new()
        .maximum_size(10_000)
        .weak_keys()
        .build()
}

mod single_key {
    use super::*;

    #[test]
    fn release_makes_entry_collectable() {
        let cache = weak_key_cache();
        let tracker = StrongRefTracker::with_admission(0, Admission::Always);

        let key = Arc::new(Key::new(7));
        assert!(tracker.track_key(Arc::clone(&key)));
        cache.put(key, Arc::new(70));

        // Only the pool holds the key now
        assert_eq!(cache.get(&Key::new(7)).as_deref(), Some(&70));

        assert!(tracker.release_oldest());
        assert!(cache.get(&Key::new(7)).is_none());
        assert_eq!(cache.clean_up(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn pooled_key_below_bound_stays_live() {
        let cache = weak_key_cache();
        let tracker = StrongRefTracker::new(1);

        let key = Arc::new(Key::new(1));
        assert!(tracker.track_key(Arc::clone(&key)));
        cache.put(key, Arc::new(10));

        // At the bound nothing is released
        assert!(!tracker.release_oldest());
        assert_eq!(cache.clean_up(), 0);
        assert_eq!(cache.get(&Key::new(1)).as_deref(), Some(&10));
    }
}

mod fifo_release {
    use super::*;

    #[test]
    fn oldest_entries_die_first() {
        let cache = weak_key_cache();
        let tracker = StrongRefTracker::with_admission(5, Admission::Always);
        for id in 0..10 {
            let key = Arc::new(Key::new(id));
            tracker.track_key(Arc::clone(&key));
            cache.put(key, Arc::new(id as u32));
        }
        assert_eq!(cache.live_len(), 10);

        while tracker.release_oldest() {}

        assert_eq!(cache.live_len(), 5);
        for id in 0..5 {
            assert!(cache.get(&Key::new(id)).is_none());
        }
        for id in 5..10 {
            assert_eq!(cache.get(&Key::new(id)).as_deref(), Some(&(id as u32)));
        }
        assert_eq!(cache.clean_up(), 5);
        cache.check_invariants().unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn concurrent_writers_and_releaser_drain_to_bound() {
        let cache = weak_key_cache();
        let tracker = StrongRefTracker::with_admission(0, Admission::Always);
        let done = AtomicBool::new(false);

        thread::scope(|scope| {
            scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    tracker.release_oldest();
                }
            });
            let writers: Vec<_> = (0..4)
                .map(|t| {
                    let (cache, tracker) = (&cache, &tracker);
                    scope.spawn(move || {
                        for i in 0..1_000 {
                            let key = Arc::new(Key::new(t * 1_000 + i));
                            tracker.track_key(Arc::clone(&key));
                            cache.put(key, Arc::new(i as u32));
                        }
                    })
                })
                .collect();
            for writer in writers {
                writer.join().unwrap();
            }
            done.store(true, Ordering::Release);
        });
        while tracker.release_oldest() {}

        assert!(tracker.is_empty());
        assert_eq!(tracker.collections(), 4_000);
        assert_eq!(cache.live_len(), 0);
        cache.clean_up();
        assert!(cache.is_empty());
        cache.check_invariants().unwrap();
    }
}
