use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_strata_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("STRATA_STORAGE_PATH");
        env::remove_var("STRATA_CACHE_NAME");
        env::remove_var("STRATA_L1_CAPACITY");
        env::remove_var("STRATA_LAZY_TIMEOUT_SECS");
        env::remove_var("STRATA_ENTITIES_PER_SEGMENT");
        env::remove_var("STRATA_HOUSEKEEPING_INTERVAL_SECS");
    }
}

#[test]
fn test_default_config() {
    let config = CacheConfig::default();

    assert_eq!(config.storage_path, PathBuf::from("./.data"));
    assert!(config.name.is_none());
    assert_eq!(config.l1_capacity, 1_000);
    assert_eq!(config.lazy_timeout, Duration::from_secs(30));
    assert_eq!(config.entities_per_segment, 10);
    assert_eq!(config.housekeeping_interval, Duration::from_secs(5));
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_strata_env();

    let config = CacheConfig::from_env().expect("should parse with defaults");

    assert_eq!(config.l1_capacity, 1_000);
    assert!(config.name.is_none());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_strata_env();

    with_env_vars(
        &[
            ("STRATA_STORAGE_PATH", "/tmp/strata-env"),
            ("STRATA_CACHE_NAME", "inventory"),
            ("STRATA_L1_CAPACITY", "42"),
            ("STRATA_LAZY_TIMEOUT_SECS", "7"),
            ("STRATA_ENTITIES_PER_SEGMENT", "3"),
            ("STRATA_HOUSEKEEPING_INTERVAL_SECS", "2"),
        ],
        || {
            let config = CacheConfig::from_env().expect("should parse");
            assert_eq!(config.storage_path, PathBuf::from("/tmp/strata-env"));
            assert_eq!(config.name.as_deref(), Some("inventory"));
            assert_eq!(config.l1_capacity, 42);
            assert_eq!(config.lazy_timeout, Duration::from_secs(7));
            assert_eq!(config.entities_per_segment, 3);
            assert_eq!(config.housekeeping_interval, Duration::from_secs(2));
        },
    );
}

#[test]
#[serial]
fn test_from_env_blank_name_is_ignored() {
    clear_strata_env();

    with_env_vars(&[("STRATA_CACHE_NAME", "   ")], || {
        let config = CacheConfig::from_env().expect("should parse");
        assert!(config.name.is_none());
    });
}

#[test]
#[serial]
fn test_from_env_invalid_capacity() {
    clear_strata_env();

    with_env_vars(&[("STRATA_L1_CAPACITY", "lots")], || {
        let result = CacheConfig::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::EnvParse {
                name: "STRATA_L1_CAPACITY",
                ..
            })
        ));
    });
}

#[test]
fn test_validate_missing_dir_is_ok() {
    let dir = TempDir::new().expect("temp dir");
    let config = CacheConfig::at(dir.path().join("not-yet-created"));

    assert!(config.validate().is_ok());
    assert!(!config.storage_path.exists());
}

#[test]
fn test_validate_file_is_not_a_directory() {
    let dir = TempDir::new().expect("temp dir");
    let file_path = dir.path().join("plain.txt");
    std::fs::write(&file_path, b"x").expect("write file");

    let config = CacheConfig::at(&file_path);
    let err = config.validate().expect_err("file must be rejected");

    assert!(matches!(err, ConfigError::NotADirectory { .. }));
    assert!(err.to_string().contains("not a directory"));
}

#[test]
fn test_validate_zero_capacity() {
    let dir = TempDir::new().expect("temp dir");
    let config = CacheConfig {
        l1_capacity: 0,
        ..CacheConfig::at(dir.path())
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            name: "l1_capacity",
            ..
        })
    ));
}

#[test]
fn test_validate_zero_segment_size() {
    let dir = TempDir::new().expect("temp dir");
    let config = CacheConfig {
        entities_per_segment: 0,
        ..CacheConfig::at(dir.path())
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            name: "entities_per_segment",
            ..
        })
    ));
}

#[test]
fn test_validate_leaves_no_probe_file() {
    let dir = TempDir::new().expect("temp dir");
    CacheConfig::at(dir.path()).validate().expect("valid dir");

    let leftovers = std::fs::read_dir(dir.path()).expect("read dir").count();
    assert_eq!(leftovers, 0);
}

#[test]
fn test_resolved_name_defaults_to_dir_name() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("grid_inventory");
    let config = CacheConfig::at(&path);

    assert_eq!(config.resolved_name().expect("name"), "grid_inventory");
}

#[test]
fn test_resolved_name_prefers_explicit_name() {
    let config = CacheConfig {
        name: Some("tracker".to_string()),
        ..CacheConfig::at("/tmp/whatever")
    };

    assert_eq!(config.resolved_name().expect("name"), "tracker");
}

#[cfg(unix)]
#[test]
fn test_validate_read_only_dir() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().expect("temp dir");
    let locked = dir.path().join("ro");
    std::fs::create_dir(&locked).expect("create dir");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555))
        .expect("chmod");

    let result = validate_storage_dir(&locked);

    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755))
        .expect("restore perms");

    // Root bypasses permission bits, so only assert when the probe was actually refused.
    if let Err(err) = result {
        assert!(matches!(err, ConfigError::NotWritable { .. }));
    }
}
