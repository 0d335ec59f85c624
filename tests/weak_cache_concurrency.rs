// ==============================================
// WEAK CACHE CONCURRENCY TESTS (integration)
// ==============================================
//
// Shard bookkeeping under contention: concurrent writers, removers and
// reapers must leave every shard consistent, keep the size bound, and never
// surface a collected entry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use weakkit::builder::WeakCacheBuilder;
use weakkit::cache::WeakCache;
use weakkit::harness::key::Key;

const THREADS: usize = 8;
const OPS_PER_THREAD: usize = 5_000;

// ==============================================
// Mixed put / remove / clean_up
// ==============================================

mod mixed_ops {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore)]
    fn put_remove_clean_up_keep_invariants() {
        let cache: Arc<WeakCache<u64, u64>> = Arc::new(WeakCache::new(1_024));
        let keys: Arc<Vec<Arc<u64>>> = Arc::new((0..2_048).map(Arc::new).collect());
        let value = Arc::new(7u64);
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let (cache, keys, value, barrier) = (
                    Arc::clone(&cache),
                    Arc::clone(&keys),
                    Arc::clone(&value),
                    Arc::clone(&barrier),
                );
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..OPS_PER_THREAD {
                        let key = &keys[(t * 31 + i * 7) % keys.len()];
                        match i % 4 {
                            0 | 1 => cache.put(Arc::clone(key), Arc::clone(&value)),
                            2 => {
                                cache.remove(key);
                            },
                            _ => {
                                if let Some(found) = cache.get(key) {
                                    assert_eq!(*found, 7);
                                }
                            },
                        }
                        if i % 1_000 == 0 {
                            cache.clean_up();
                        }
                        assert!(cache.len() <= 1_024);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        cache.check_invariants().unwrap();
        assert!(cache.len() <= 1_024);
        // Every key and value is still held by the test
        assert_eq!(cache.clean_up(), 0);
        assert_eq!(cache.live_len(), cache.len());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn dropped_keys_are_reaped_after_concurrent_puts() {
        let cache: Arc<WeakCache<Key, u32>> = Arc::new(
            WeakCacheBuilder::new()
                .maximum_size(100_000)
                .weak_keys()
                .build(),
        );

        thread::scope(|scope| {
            for t in 0..THREADS {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..OPS_PER_THREAD {
                        let id = (t * OPS_PER_THREAD + i) as i32;
                        // Key handle dropped right after the put
                        cache.put(Arc::new(Key::new(id)), Arc::new(id as u32));
                    }
                });
            }
        });

        assert!(cache.get(&Key::new(0)).is_none());
        cache.clean_up();
        assert!(cache.is_empty());
        cache.check_invariants().unwrap();
    }
}

// ==============================================
// Compute-if-absent
// ==============================================

mod compute {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore)]
    fn same_key_computes_once() {
        let cache: WeakCache<u64, String> = WeakCacheBuilder::new().weak_values().build();
        let key = Arc::new(42u64);
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(THREADS);

        let values: Vec<Arc<String>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache.get_with(Arc::clone(&key), |k| {
                            calls.fetch_add(1, Ordering::Relaxed);
                            Arc::new(format!("value-{k}"))
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        // Every caller still holds the value, so it was never collected
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
        assert_eq!(values[0].as_str(), "value-42");
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn collected_value_is_recomputed() {
        let cache: WeakCache<u64, u64> = WeakCacheBuilder::new().weak_values().build();
        let key = Arc::new(1u64);

        let first = cache.get_with(Arc::clone(&key), |_| Arc::new(10));
        drop(first);
        let second = cache.get_with(Arc::clone(&key), |_| Arc::new(20));
        assert_eq!(*second, 20);
    }
}

// ==============================================
// Strong handles survive contention
// ==============================================

mod strong {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore)]
    fn unbounded_strong_cache_keeps_every_entry() {
        let cache: WeakCache<u64, u64> = WeakCacheBuilder::new().build();

        thread::scope(|scope| {
            for t in 0..THREADS as u64 {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..1_000u64 {
                        let id = t * 1_000 + i;
                        cache.put(Arc::new(id), Arc::new(id * 2));
                    }
                });
            }
        });

        assert_eq!(cache.clean_up(), 0);
        assert_eq!(cache.len(), THREADS * 1_000);
        assert_eq!(cache.get(&4_321).as_deref(), Some(&8_642));
    }
}
