//! YAML config store and `config set` validation on a temp directory.

#![allow(clippy::unwrap_used, unsafe_code)]

use extcheck_cli::application::ports::ConfigStore;
use extcheck_cli::application::services::config_service::{load_config, set_value};
use extcheck_cli::domain::config::ValidatorConfig;
use extcheck_cli::infra::config::{CONFIG_ENV, YamlConfigStore};
use serial_test::serial;

fn store_in(dir: &tempfile::TempDir) -> YamlConfigStore {
    YamlConfigStore::new(Some(dir.path().join("nested").join("config.yaml")))
}

#[test]
fn test_missing_file_loads_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(&store_in(&dir)).unwrap();
    assert_eq!(config, ValidatorConfig::default());
}

#[test]
fn test_set_value_persists_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    set_value(&store, "process_name", "gpa-agent").unwrap();
    set_value(&store, "poll.status.timeout_secs", "900").unwrap();
    set_value(&store, "use_sudo", "true").unwrap();

    let config = store.load().unwrap();
    assert_eq!(config.process_name, "gpa-agent");
    assert_eq!(config.poll.status.timeout_secs, 900);
    assert!(config.use_sudo);
    assert_eq!(config.poll.locate, ValidatorConfig::default().poll.locate);
}

#[test]
fn test_set_unknown_key_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let err = set_value(&store, "poll.status.jitter", "3").unwrap_err();

    assert!(err.to_string().contains("Unknown setting"));
    assert!(!store.path().unwrap().exists());
}

#[test]
fn test_set_zero_interval_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    assert!(set_value(&store, "poll.locate.interval_secs", "0").is_err());
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let path = store.path().unwrap();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "helper_package: curl\npoll:\n  process:\n    interval_secs: 2\n    timeout_secs: 10\n").unwrap();

    let config = store.load().unwrap();

    assert_eq!(config.helper_package, "curl");
    assert_eq!(config.poll.process.interval_secs, 2);
    assert_eq!(config.waagent_dir, "/var/lib/waagent");
}

#[cfg(unix)]
#[test]
fn test_saved_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.save(&ValidatorConfig::default()).unwrap();

    let mode = std::fs::metadata(store.path().unwrap())
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
#[serial]
fn test_env_var_overrides_default_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("from-env.yaml");
    // SAFETY: serialized with every other test touching this variable.
    unsafe { std::env::set_var(CONFIG_ENV, &path) };

    let resolved = YamlConfigStore::default().path().unwrap();

    unsafe { std::env::remove_var(CONFIG_ENV) };
    assert_eq!(resolved, path);
}

#[test]
#[serial]
fn test_explicit_path_wins_over_env_var() {
    let dir = tempfile::tempdir().unwrap();
    let explicit = dir.path().join("explicit.yaml");
    // SAFETY: serialized with every other test touching this variable.
    unsafe { std::env::set_var(CONFIG_ENV, dir.path().join("from-env.yaml")) };

    let resolved = YamlConfigStore::new(Some(explicit.clone())).path().unwrap();

    unsafe { std::env::remove_var(CONFIG_ENV) };
    assert_eq!(resolved, explicit);
}
