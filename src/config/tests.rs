//! Config module tests

use super::*;
use std::io::Write;

#[test]
fn test_substitute_env_vars_simple() {
    std::env::set_var("VIBESN_TEST_VAR_SIMPLE", "hello");
    let result = substitute_env_vars("value = \"${VIBESN_TEST_VAR_SIMPLE}\"");
    assert_eq!(result, "value = \"hello\"");
    std::env::remove_var("VIBESN_TEST_VAR_SIMPLE");
}

#[test]
fn test_substitute_env_vars_with_default() {
    // Unset var should use default
    std::env::remove_var("VIBESN_TEST_VAR_UNSET");
    let result = substitute_env_vars("value = \"${VIBESN_TEST_VAR_UNSET:-default_value}\"");
    assert_eq!(result, "value = \"default_value\"");

    // Set var should use env value
    std::env::set_var("VIBESN_TEST_VAR_SET", "env_value");
    let result = substitute_env_vars("value = \"${VIBESN_TEST_VAR_SET:-default_value}\"");
    assert_eq!(result, "value = \"env_value\"");
    std::env::remove_var("VIBESN_TEST_VAR_SET");
}

#[test]
fn test_substitute_env_vars_missing_no_default() {
    std::env::remove_var("VIBESN_TEST_VAR_MISSING");
    let result = substitute_env_vars("value = \"${VIBESN_TEST_VAR_MISSING}\"");
    assert_eq!(result, "value = \"\"");
}

#[test]
fn test_load_config_with_env_substitution() {
    std::env::set_var("VIBESN_TEST_PROFILE", "egress-cloud");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[gateway]
profile = "${{VIBESN_TEST_PROFILE}}"
max_connected_clients = ${{VIBESN_TEST_CLIENTS:-42}}

[session]
monitor_interval = "5s"
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.gateway.profile, PerformanceProfile::EgressCloud);
    assert_eq!(config.gateway.max_connected_clients(), 42);
    assert_eq!(config.max_queue_size(), 250);
    assert_eq!(config.session.monitor_interval, Duration::from_secs(5));
    // Untouched sections fall back to defaults
    assert_eq!(config.session.prefix_search_limit, 100);
    assert_eq!(config.tree.max_path_segments, DEFAULT_MAX_PATH_SEGMENTS);

    std::env::remove_var("VIBESN_TEST_PROFILE");
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.gateway.profile, PerformanceProfile::BalancedGateway);
    assert_eq!(config.session.payload_expiry, Duration::from_secs(365 * 24 * 60 * 60));
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.log.level, "info");
    assert_eq!(config.gateway.max_connected_clients(), 100);
    assert_eq!(config.max_queue_size(), 25);
    assert!(!config.gateway.sleep_clears_registrations);
    assert_eq!(config.session.monitor_interval, Duration::from_secs(30));
    assert_eq!(config.session.default_session_expiry, u32::MAX);
    assert_eq!(config.session.default_max_packet_size, 65535);
    assert_eq!(config.queue.max_stored_payloads, 100_000);
    assert!(config.topics.predefined.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_full_config() {
    let config = Config::parse(
        r#"
[log]
level = "debug"

[gateway]
profile = "ingress-cloud"
sleep_clears_registrations = true
max_topic_length = 256

[session]
monitor_interval = "1m"
default_session_expiry = 3600
payload_expiry = "2h"
prefix_search_limit = 10

[queue]
max_queue_size = 8
max_stored_payloads = 1000

[tree]
max_path_segments = 64

[[topics.predefined]]
id = 1
topic = "sensors/temperature"

[[topics.predefined]]
id = 2
topic = "sensors/humidity"
"#,
    )
    .unwrap();

    assert_eq!(config.log.level, "debug");
    assert_eq!(config.gateway.profile, PerformanceProfile::IngressCloud);
    assert_eq!(config.gateway.max_connected_clients(), 10_000);
    assert!(config.gateway.sleep_clears_registrations);
    assert_eq!(config.session.monitor_interval, Duration::from_secs(60));
    assert_eq!(config.session.default_session_expiry, 3600);
    assert_eq!(config.session.payload_expiry, Duration::from_secs(7200));
    assert_eq!(config.max_queue_size(), 8);
    assert_eq!(config.tree.limits().max_path_segments, 64);
    assert_eq!(config.tree.limits().max_path_size, DEFAULT_MAX_PATH_SIZE);
    assert_eq!(config.topics.predefined.len(), 2);
    assert_eq!(config.topics.predefined[1].topic, "sensors/humidity");
}

#[test]
fn test_profiles() {
    for (name, clients, queue) in [
        ("balanced-gateway", 100, 25),
        ("balanced-cloud", 5000, 50),
        ("ingress-cloud", 10_000, 25),
        ("egress-cloud", 5000, 250),
    ] {
        let config = Config::parse(&format!("[gateway]\nprofile = \"{}\"", name)).unwrap();
        assert_eq!(config.gateway.max_connected_clients(), clients, "{}", name);
        assert_eq!(config.max_queue_size(), queue, "{}", name);
    }
}

#[test]
fn test_unknown_profile_rejected() {
    let result = Config::parse("[gateway]\nprofile = \"turbo\"");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_validation_zero_monitor_interval() {
    let result = Config::parse("[session]\nmonitor_interval = \"0s\"");
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn test_validation_topic_length_exceeds_tree() {
    let result = Config::parse(
        r#"
[gateway]
max_topic_length = 2048

[tree]
max_path_size = 1024
"#,
    );
    match result {
        Err(ConfigError::Validation(msg)) => assert!(msg.contains("max_topic_length")),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_validation_duplicate_predefined_id() {
    let result = Config::parse(
        r#"
[[topics.predefined]]
id = 5
topic = "a"

[[topics.predefined]]
id = 5
topic = "b"
"#,
    );
    match result {
        Err(ConfigError::Validation(msg)) => assert!(msg.contains("more than once")),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_validation_predefined_wildcard_and_reserved_id() {
    let wild = Config::parse("[[topics.predefined]]\nid = 1\ntopic = \"a/#\"");
    assert!(matches!(wild, Err(ConfigError::Validation(_))));

    let reserved = Config::parse("[[topics.predefined]]\nid = 0\ntopic = \"a\"");
    assert!(matches!(reserved, Err(ConfigError::Validation(_))));
}

#[test]
fn test_config_error_display() {
    let err = ConfigError::Validation("bad value".to_string());
    assert_eq!(err.to_string(), "Validation error: bad value");
}
