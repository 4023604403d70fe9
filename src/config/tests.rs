use super::*;
use serial_test::serial;
use std::env;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.client.server_addr, "127.0.0.1:5683");
    assert_eq!(settings.client.heartbeat_interval_secs, 60);
    assert_eq!(settings.client.heartbeat_payload, "Heart beat msg.");
    assert_eq!(settings.client.heartbeat_ids, HeartbeatIdPolicy::Shared);
    assert_eq!(settings.client.poll_interval_ms, 1000);
    assert_eq!(settings.logging.level, "info");
    assert!(settings.topics.is_empty());
}

#[test]
fn test_client_config_from_settings() {
    let cfg = ClientConfig::from(ClientSettings {
        channel_capacity: 0,
        max_receive_errors: 3,
        ..ClientSettings::default()
    });
    assert_eq!(cfg.heartbeat_interval, Duration::from_secs(60));
    assert_eq!(cfg.poll_interval, Duration::from_secs(1));
    assert_eq!(cfg.channel_capacity, 1);
    assert_eq!(cfg.max_receive_errors, Some(3));

    let cfg = ClientConfig::new("10.0.0.1:5683");
    assert_eq!(cfg.server_addr, "10.0.0.1:5683");
    assert_eq!(cfg.max_receive_errors, None);
    assert!(cfg.ack_confirmable);
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    // load_config reads config/default.toml relative to the current dir
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    fs::create_dir_all("config").expect("create config dir");
    let toml = r#"
        topics = ["sensors/temp", "sensors/humidity"]

        [client]
        server_addr = "192.168.1.20:5683"
        heartbeat_interval_secs = 30
        heartbeat_ids = "per_topic"

        [logging]
        level = "debug"
    "#;
    fs::write("config/default.toml", toml).expect("write config file");

    let cfg = load_config();
    env::set_current_dir(orig).expect("restore cwd");
    let cfg = cfg.expect("load_config failed");

    assert_eq!(cfg.client.server_addr, "192.168.1.20:5683");
    assert_eq!(cfg.client.heartbeat_interval_secs, 30);
    assert_eq!(cfg.client.heartbeat_ids, HeartbeatIdPolicy::PerTopic);
    // untouched keys keep their defaults
    assert_eq!(cfg.client.poll_interval_ms, 1000);
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.topics, vec!["sensors/temp", "sensors/humidity"]);
}

#[test]
#[serial]
fn load_config_from_env() {
    temp_env::with_vars(
        [
            ("COAP_PUBSUB_CLIENT__SERVER_ADDR", Some("10.1.1.1:5683")),
            ("COAP_PUBSUB_CLIENT__MAX_RECEIVE_ERRORS", Some("5")),
            ("COAP_PUBSUB_TOPICS", Some("a,b")),
        ],
        || {
            let cfg = load_config().expect("load_config failed");
            assert_eq!(cfg.client.server_addr, "10.1.1.1:5683");
            assert_eq!(cfg.client.max_receive_errors, 5);
            assert_eq!(cfg.topics, vec!["a", "b"]);
        },
    );
}
