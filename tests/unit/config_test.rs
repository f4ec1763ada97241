//! Unit tests for config module

use flipcache::Config;

#[test]
fn default_config_has_expected_values() {
    let config = Config::default();
    assert_eq!(config.api.base_url, "http://localhost:3001");
    assert!(config.auth_header().is_none());
    assert_eq!(config.memory_cache.max_size_mb, 50.0);
    assert_eq!(config.memory_cache.max_entries, 100);
    assert_eq!(config.preload.concurrency, 3);
    assert_eq!(config.preload.preload_ahead, 2);
    assert_eq!(config.preload.preload_behind, 1);
    assert!(config.persistent_cache.enabled);
    assert_eq!(config.persistent_cache.version, "flipbook-v2");
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn config_serialization_roundtrip() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&toml_str).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn cache_limits_come_from_megabytes() {
    let toml_str = r#"
[memory_cache]
max_size_mb = 2.5
max_entries = 7
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let limits = config.cache_limits();
    assert_eq!(limits.max_bytes, 2_621_440);
    assert_eq!(limits.max_entries, 7);
}

#[test]
fn blank_auth_header_is_ignored() {
    let config: Config = toml::from_str("[api]\nauth_header = \"   \"\n").unwrap();
    assert!(config.auth_header().is_none());

    let config: Config = toml::from_str("[api]\nauth_header = \"Bearer abc\"\n").unwrap();
    assert_eq!(config.auth_header().as_deref(), Some("Bearer abc"));
}

#[test]
fn viewer_options_follow_preload_section() {
    let config: Config =
        toml::from_str("[preload]\npreload_ahead = 4\npreload_behind = 0\n").unwrap();
    let options = config.viewer_options();
    assert_eq!(options.preload_ahead, 4);
    assert_eq!(options.preload_behind, 0);
}

#[test]
fn validate_rejects_zero_concurrency() {
    let mut config = Config::default();
    config.preload.concurrency = 0;
    assert!(config.validate().unwrap_err().contains("concurrency"));
}

#[test]
fn absolute_cache_directory_is_kept() {
    let mut config = Config::default();
    config.persistent_cache.directory = "/var/cache/flipcache".to_string();
    assert_eq!(
        config.cache_directory(),
        std::path::PathBuf::from("/var/cache/flipcache")
    );
}
