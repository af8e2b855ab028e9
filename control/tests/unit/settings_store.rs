//! `YamlSettingsStore` on disk and the environment settings layer.

#![allow(unsafe_code)] // env mutation is unsafe in edition 2024

use salt_control::application::SettingsStore;
use salt_control::application::settings::{load_settings, remember_login};
use salt_control::domain::{ConfigError, SaltSettings, SettingsLayer};
use salt_control::infra::config::{CONFIG_PATH_ENV, YamlSettingsStore, env_layer};
use serial_test::serial;

const ENV_VARS: &[&str] = &[
    "SALT_API_URL",
    "SALT_USERNAME",
    "SALT_PASSWORD",
    "SALT_TIMEOUT_SECS",
    "SALT_ACCEPT_INVALID_CERTS",
];

fn clear_env() {
    for var in ENV_VARS {
        // SAFETY: tests touching the environment are `#[serial]`.
        unsafe { std::env::remove_var(var) };
    }
}

fn set_env(key: &str, value: &str) {
    // SAFETY: tests touching the environment are `#[serial]`.
    unsafe { std::env::set_var(key, value) };
}

fn store_in(dir: &tempfile::TempDir) -> YamlSettingsStore {
    YamlSettingsStore::at(dir.path().join("nested").join("config.yaml"))
}

#[test]
fn load_missing_file_is_none() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    assert!(store_in(&dir).load().expect("load").is_none());
}

#[test]
fn save_then_load_keeps_every_field() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    let layer = SettingsLayer {
        api_url: Some("http://203.0.113.7:8000".to_string()),
        username: Some("saltapi".to_string()),
        password: Some("pw".to_string()),
        timeout_secs: Some(45),
        accept_invalid_certs: Some(false),
        bastion_ip: Some("203.0.113.7".to_string()),
        stack_name: Some("prod".to_string()),
    };
    store.save(&layer).expect("save");
    assert_eq!(store.load().expect("load"), Some(layer));
}

#[test]
fn saved_file_is_private() {
    use std::os::unix::fs::PermissionsExt;
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    store.save(&SettingsLayer::default()).expect("save");
    let mode = std::fs::metadata(store.path().expect("path"))
        .expect("meta")
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn saving_over_a_world_readable_file_makes_it_private() {
    use std::os::unix::fs::PermissionsExt;
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "username: old\n").expect("seed");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).expect("chmod");

    let store = YamlSettingsStore::at(path.clone());
    let layer = SettingsLayer {
        password: Some("s3cret".to_string()),
        ..SettingsLayer::default()
    };
    store.save(&layer).expect("save");

    let mode = std::fs::metadata(&path).expect("meta").permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert_eq!(store.load().expect("load"), Some(layer));
    let leftovers = std::fs::read_dir(dir.path()).expect("read dir").count();
    assert_eq!(leftovers, 1, "staging file must not be left behind");
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    let path = store.path().expect("path");
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(&path, "api_url: [unterminated").expect("write");
    let err = store.load().unwrap_err();
    assert!(err.to_string().contains("cannot parse"), "{err}");
}

#[test]
fn remember_login_round_trips_through_load_settings() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    let settings = SaltSettings::new("http://10.0.0.5:8000", "ops", "pw").expect("valid");
    remember_login(&store, &settings, Some("10.0.0.5"), Some("staging")).expect("save");

    let saved = store.load().expect("load").expect("present");
    assert_eq!(saved.bastion_ip.as_deref(), Some("10.0.0.5"));
    assert_eq!(saved.stack_name.as_deref(), Some("staging"));

    let loaded = load_settings(SettingsLayer::default(), &store).expect("resolve");
    assert_eq!(loaded, settings);
}

#[test]
fn load_settings_without_password_fails_fast() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    let env = SettingsLayer {
        api_url: Some("http://h:8000".to_string()),
        ..SettingsLayer::default()
    };
    let err = load_settings(env, &store).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::MissingPassword)
    ));
}

#[test]
#[serial]
fn env_layer_reads_prefixed_variables() {
    clear_env();
    set_env("SALT_API_URL", "https://salt.example.com");
    set_env("SALT_PASSWORD", "from-env");
    set_env("SALT_TIMEOUT_SECS", "90");
    set_env("SALT_ACCEPT_INVALID_CERTS", "false");
    let layer = env_layer().expect("env");
    clear_env();

    assert_eq!(layer.api_url.as_deref(), Some("https://salt.example.com"));
    assert_eq!(layer.password.as_deref(), Some("from-env"));
    assert_eq!(layer.username, None);
    assert_eq!(layer.timeout_secs, Some(90));
    assert_eq!(layer.accept_invalid_certs, Some(false));
}

#[test]
#[serial]
fn env_layer_rejects_unparsable_timeout() {
    clear_env();
    set_env("SALT_TIMEOUT_SECS", "soon");
    let result = env_layer();
    clear_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn environment_wins_over_saved_file() {
    clear_env();
    let dir = tempfile::TempDir::new().expect("tempdir");
    let store = store_in(&dir);
    store
        .save(&SettingsLayer {
            api_url: Some("http://10.0.0.5:8000".to_string()),
            username: Some("saved".to_string()),
            password: Some("saved-pw".to_string()),
            ..SettingsLayer::default()
        })
        .expect("save");

    set_env("SALT_PASSWORD", "env-pw");
    let settings = load_settings(env_layer().expect("env"), &store).expect("resolve");
    clear_env();

    assert_eq!(settings.api_url, "http://10.0.0.5:8000");
    assert_eq!(settings.username, "saved");
    assert_eq!(settings.password, "env-pw");
}

#[test]
#[serial]
fn config_path_can_be_overridden_by_environment() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("custom.yaml");
    set_env(CONFIG_PATH_ENV, path.to_str().expect("utf-8 path"));
    let resolved = YamlSettingsStore::new().path().expect("path");
    // SAFETY: serial test.
    unsafe { std::env::remove_var(CONFIG_PATH_ENV) };
    assert_eq!(resolved, path);
}
