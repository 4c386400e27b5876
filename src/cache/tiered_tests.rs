use std::time::Duration;

use tempfile::TempDir;

use super::builder::CacheBuilder;
use super::tiered::TwoTierCache;
use super::types::TierStatus;

fn quiet_builder(dir: &TempDir) -> CacheBuilder {
    CacheBuilder::at(dir.path()).housekeeping_interval(Duration::from_secs(3600))
}

fn build(dir: &TempDir) -> TwoTierCache<u32, String> {
    quiet_builder(dir).build().expect("build cache")
}

#[test]
fn test_lookup_reports_tier() {
    let dir = TempDir::new().expect("temp dir");
    let cache = build(&dir);

    assert_eq!(cache.lookup(&1).expect("lookup").status(), TierStatus::Miss);

    cache.put(1, "one".into()).expect("put");
    let result = cache.lookup(&1).expect("lookup");
    assert!(result.is_l1_hit());
    assert_eq!(result.into_value(), Some("one".to_string()));
}

#[test]
fn test_l2_hit_pulls_through_into_l1() {
    let dir = TempDir::new().expect("temp dir");
    let cache = build(&dir);

    cache.put(1, "one".into()).expect("put");
    cache.l1().clear();

    let first = cache.lookup(&1).expect("lookup");
    assert!(first.is_l2_hit());
    assert_eq!(cache.l1().get(&1), Some("one".to_string()));

    let second = cache.lookup(&1).expect("lookup");
    assert!(second.is_l1_hit());
}

#[test]
fn test_miss_is_not_cached() {
    let dir = TempDir::new().expect("temp dir");
    let cache = build(&dir);

    assert_eq!(cache.get(&5).expect("get"), None);
    cache.put(5, "five".into()).expect("put");
    assert_eq!(cache.get(&5).expect("get"), Some("five".to_string()));
}

#[test]
fn test_l1_never_ahead_of_l2() {
    let dir = TempDir::new().expect("temp dir");
    let cache: TwoTierCache<u32, String> = quiet_builder(&dir)
        .max_in_memory_entities(4)
        .build()
        .expect("build");

    for key in 0..20u32 {
        cache.put(key, format!("v{key}")).expect("put");
    }
    for key in (0..20u32).step_by(3) {
        cache.remove(&key).expect("remove");
    }

    for (key, value) in cache.l1().entries() {
        assert_eq!(cache.l2().get(&key).expect("l2 get"), Some(value));
    }
    assert!(cache.num_l1_keys() <= 4);
    assert_eq!(cache.num_l2_keys(), 13);
}

#[test]
fn test_get_or_default() {
    let dir = TempDir::new().expect("temp dir");
    let cache = build(&dir);

    assert_eq!(
        cache.get_or_default(&1, "fallback".into()).expect("get"),
        "fallback"
    );
    cache.put(1, "real".into()).expect("put");
    assert_eq!(cache.get_or_default(&1, "fallback".into()).expect("get"), "real");
}

#[test]
fn test_show_l1_format() {
    let dir = TempDir::new().expect("temp dir");
    let cache = build(&dir);
    cache.put(1, "one".into()).expect("put");

    let mut out = String::new();
    cache.show_l1(&mut out).expect("show");

    assert_eq!(out, "   0: '1' == \"one\"\n");
}

#[test]
fn test_show_l2_skips_entries() {
    let dir = TempDir::new().expect("temp dir");
    let cache = build(&dir);
    for key in 0..5u32 {
        cache.put(key, key.to_string()).expect("put");
    }

    let mut every_other = String::new();
    cache.show_l2(&mut every_other, 2).expect("show");
    let lines: Vec<&str> = every_other.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("   0: '"));
    assert!(lines[1].starts_with("   2: '"));
    assert!(lines[2].starts_with("   4: '"));

    let mut all = String::new();
    cache.show_l2(&mut all, 0).expect("show");
    assert_eq!(all.lines().count(), 5);
}

#[test]
fn test_cleanup_l2_storage_demotes_idle_values() {
    let dir = TempDir::new().expect("temp dir");
    let cache: TwoTierCache<u32, String> = quiet_builder(&dir)
        .lazy_timeout(Duration::ZERO)
        .build()
        .expect("build");

    cache.put(1, "one".into()).expect("put");
    cache.put(2, "two".into()).expect("put");

    let report = cache.cleanup_l2_storage().expect("cleanup");
    assert_eq!(report.demoted, 2);
    assert_eq!(cache.l2().resident_len(), 0);

    cache.l1().clear();
    assert_eq!(cache.get(&2).expect("get"), Some("two".to_string()));
}

#[test]
fn test_put_after_shutdown_leaves_l1_untouched() {
    let dir = TempDir::new().expect("temp dir");
    let cache = build(&dir);
    cache.put(1, "one".into()).expect("put");

    cache.shutdown();
    cache.shutdown();

    assert!(!cache.running());
    assert!(cache.put(2, "two".into()).unwrap_err().is_not_running());
    assert!(cache.get(&1).unwrap_err().is_not_running());
    assert!(!cache.l1().contains_key(&2));
}

#[test]
fn test_reinit_when_stopped_keeps_l2() {
    let dir = TempDir::new().expect("temp dir");
    let builder = quiet_builder(&dir);
    {
        let cache: TwoTierCache<u32, String> = builder.build().expect("build");
        cache.put(1, "one".into()).expect("put");
        cache.shutdown();

        cache.reinit().expect("reinit on stopped cache");
        assert_eq!(cache.num_l1_keys(), 0);
    }

    let cache: TwoTierCache<u32, String> = builder.build().expect("rebuild");
    assert_eq!(cache.get(&1).expect("get"), Some("one".to_string()));
}

#[test]
fn test_builder_from_config_wires_l2_settings() {
    let dir = TempDir::new().expect("temp dir");
    let config = crate::config::CacheConfig {
        entities_per_segment: 3,
        lazy_timeout: Duration::from_secs(9),
        housekeeping_interval: Duration::from_secs(3600),
        ..crate::config::CacheConfig::at(dir.path())
    };
    let builder = CacheBuilder::from_config(config);
    assert_eq!(builder.config().entities_per_segment, 3);

    let cache: TwoTierCache<u32, String> = builder.build().expect("build");

    assert_eq!(cache.l2().config().entities_per_segment, 3);
    assert_eq!(cache.l2().config().lazy_timeout, Duration::from_secs(9));
    assert_eq!(cache.l1().capacity(), 1_000);
    assert_eq!(cache.l2().root(), std::path::absolute(dir.path()).expect("abs"));
}

#[test]
fn test_l1_eviction_follows_recent_reads() {
    let dir = TempDir::new().expect("temp dir");
    let cache: TwoTierCache<u32, String> = quiet_builder(&dir)
        .max_in_memory_entities(3)
        .build()
        .expect("build");

    for key in 0..3u32 {
        cache.put(key, key.to_string()).expect("put");
    }
    assert!(cache.lookup(&0).expect("lookup").is_l1_hit());
    cache.put(3, "3".into()).expect("put");

    assert!(cache.l1().contains_key(&0));
    assert!(!cache.l1().contains_key(&1));
    assert_eq!(cache.num_l1_keys(), 3);
    assert_eq!(cache.num_l2_keys(), 4);

    let mut out = String::new();
    cache.show_l1(&mut out).expect("show");
    assert_eq!(out.lines().count(), 3);
}

#[test]
fn test_build_reports_directory_creation_failure_as_io() {
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("plain");
    std::fs::write(&file, b"x").expect("write file");

    let result = CacheBuilder::at(file.join("sub")).build::<u32, String>();

    assert!(matches!(
        result,
        Err(crate::error::CacheError::Storage(crate::storage::StorageError::Io(_)))
    ));
}
