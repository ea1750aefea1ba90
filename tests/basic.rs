use cortado::{CacheBuilder, ConfigError};
use std::sync::Arc;

fn make_cache(max: usize) -> cortado::Cache<String, String> {
    CacheBuilder::new().maximum_size(max).build().unwrap()
}

// ---------------------------------------------------------------------------
// Fundamental API correctness
// ---------------------------------------------------------------------------

#[test]
fn get_returns_none_on_miss() {
    let cache = make_cache(10);
    assert_eq!(cache.get(&"missing".to_string()), None);
}

#[test]
fn put_and_get_round_trip() {
    let cache = make_cache(10);
    cache.put("hello".to_string(), "world".to_string());
    assert_eq!(
        cache.get(&"hello".to_string()),
        Some(Arc::new("world".to_string()))
    );
}

#[test]
fn update_replaces_value_without_growing() {
    let cache = make_cache(10);
    cache.put("x".to_string(), "1".to_string());
    cache.put("x".to_string(), "2".to_string());
    assert_eq!(
        cache.get(&"x".to_string()),
        Some(Arc::new("2".to_string()))
    );
    assert_eq!(cache.size(), 1, "update must not create a second entry");
}

#[test]
fn remove_drops_entry() {
    let cache = make_cache(10);
    cache.put("key".to_string(), "val".to_string());
    cache.remove(&"key".to_string());
    assert_eq!(cache.get(&"key".to_string()), None);
    assert_eq!(cache.size(), 0);
}

#[test]
fn remove_unknown_key_is_noop() {
    let cache = make_cache(10);
    cache.remove(&"ghost".to_string()); // must not panic
    assert!(cache.is_empty());
}

#[test]
fn clear_empties_the_cache() {
    let cache = make_cache(100);
    for i in 0..50 {
        cache.put(format!("k{i}"), format!("v{i}"));
    }
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.get(&"k0".to_string()), None);
    // The cache stays usable after a clear.
    cache.put("again".to_string(), "yes".to_string());
    assert_eq!(cache.size(), 1);
}

#[test]
fn contains_does_not_count_as_access() {
    let cache = make_cache(10);
    cache.put("k".to_string(), "v".to_string());
    assert!(cache.contains(&"k".to_string()));
    assert!(!cache.contains(&"other".to_string()));
    let stats = cache.stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 0);
}

#[test]
fn cache_is_clone_and_shared() {
    let c1 = make_cache(10);
    let c2 = c1.clone();
    c1.put("shared".to_string(), "yes".to_string());
    assert!(
        c2.get(&"shared".to_string()).is_some(),
        "cloned handle must see the same entries"
    );
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[test]
fn stats_track_hits_and_misses() {
    let cache = make_cache(100);
    cache.put("a".to_string(), "1".to_string());
    cache.get(&"a".to_string()); // hit
    cache.get(&"b".to_string()); // miss

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate - 0.5).abs() < 1e-9, "hit_rate = {}", stats.hit_rate);
    assert_eq!(stats.total_accesses, 2);
}

#[test]
fn total_accesses_equals_hits_plus_misses() {
    let cache = make_cache(20);
    for i in 0..200u64 {
        cache.put(i.to_string(), i.to_string());
        cache.get(&(i / 2).to_string());
        cache.get(&format!("absent-{i}"));
    }
    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, stats.total_accesses);
    assert_eq!(stats.request_count(), stats.total_accesses);
}

#[test]
fn stats_display_is_human_readable() {
    let cache = make_cache(10);
    cache.put("a".to_string(), "1".to_string());
    cache.get(&"a".to_string());
    let rendered = cache.stats().to_string();
    assert!(rendered.contains("hits=1"), "got: {rendered}");
    assert!(rendered.contains("hit_rate=100.00%"), "got: {rendered}");
}

// ---------------------------------------------------------------------------
// Configuration validation
// ---------------------------------------------------------------------------

#[test]
fn invalid_configs_are_rejected() {
    let result = CacheBuilder::<String, String>::new().ai_weight(1.5).build();
    assert_eq!(result.err(), Some(ConfigError::InvalidAiWeight));

    let result = CacheBuilder::<String, String>::new().maximum_size(0).build();
    assert_eq!(result.err(), Some(ConfigError::InvalidMaximumSize));

    let result = CacheBuilder::<String, String>::new().learning_rate(0.0).build();
    assert_eq!(result.err(), Some(ConfigError::InvalidLearningRate));

    let result = CacheBuilder::<String, String>::new().window_size(0).build();
    assert_eq!(result.err(), Some(ConfigError::InvalidWindowSize));

    let result = CacheBuilder::<String, String>::new()
        .max_training_examples(0)
        .build();
    assert_eq!(result.err(), Some(ConfigError::InvalidMaxTrainingExamples));
}

#[test]
fn config_error_messages_name_the_parameter() {
    let err = CacheBuilder::<String, String>::new()
        .ai_weight(2.0)
        .build()
        .err()
        .unwrap();
    assert!(err.to_string().contains("ai_weight"));
}

// ---------------------------------------------------------------------------
// Capacity enforcement
// ---------------------------------------------------------------------------

#[test]
fn capacity_is_respected_under_load() {
    let cache = make_cache(50);
    for i in 0..250u64 {
        cache.put(i.to_string(), i.to_string());
    }
    assert!(
        cache.size() <= 50,
        "size {} exceeds capacity 50",
        cache.size()
    );
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_put_and_get() {
    let cache: Arc<cortado::Cache<String, String>> =
        Arc::new(CacheBuilder::new().maximum_size(1_000).build().unwrap());
    let mut handles = Vec::new();

    for t in 0..8 {
        let c = Arc::clone(&cache);
        handles.push(std::thread::spawn(move || {
            for j in 0..200 {
                let key = format!("t{}-k{}", t, j);
                c.put(key.clone(), key.clone());
                let _ = c.get(&key);
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert!(
        cache.size() <= 1_000,
        "size {} exceeds capacity",
        cache.size()
    );
    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, stats.total_accesses);
}

#[test]
fn concurrent_mixed_workload_with_removals() {
    let cache: Arc<cortado::Cache<u64, u64>> =
        Arc::new(CacheBuilder::new().maximum_size(100).build().unwrap());
    let mut handles = Vec::new();

    for t in 0..4u64 {
        let c = Arc::clone(&cache);
        handles.push(std::thread::spawn(move || {
            for j in 0..500u64 {
                let k = (t * 131 + j * 7) % 400;
                match j % 5 {
                    0 => c.remove(&k),
                    1 | 2 => c.put(k, j),
                    _ => {
                        let _ = c.get(&k);
                    }
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    assert!(cache.size() <= 100);
}
