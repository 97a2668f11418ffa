use std::io::Write;
use std::sync::Mutex;

use sketch::config::{Config, ConfigError};
use sketch::web::MatchPolicy;

// Tests touching the process environment must not interleave.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.router.match_policy, MatchPolicy::FirstEntry);
    assert_eq!(cfg.log.level().unwrap(), tracing::Level::INFO);
}

#[test]
fn test_config_default_address() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe {
        std::env::remove_var("LISTEN");
        std::env::remove_var("SKETCH_CONFIG");
    }

    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
}

#[test]
fn test_config_custom_address_from_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe {
        std::env::remove_var("SKETCH_CONFIG");
        std::env::set_var("LISTEN", "0.0.0.0:3000");
    }

    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:3000");

    unsafe {
        std::env::remove_var("LISTEN");
    }
}

#[test]
fn test_config_from_yaml() {
    let cfg = Config::from_yaml_str(
        r#"
server:
  listen_addr: "0.0.0.0:5000"
router:
  match_policy: scan
log:
  level: debug
"#,
    )
    .unwrap();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:5000");
    assert_eq!(cfg.router.match_policy, MatchPolicy::Scan);
    assert_eq!(cfg.log.level().unwrap(), tracing::Level::DEBUG);
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let cfg = Config::from_yaml_str("router:\n  match_policy: first_entry\n").unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.log.level, "info");
}

#[test]
fn test_config_rejects_unknown_keys() {
    let result = Config::from_yaml_str("server:\n  port: 80\n");

    assert!(matches!(result, Err(ConfigError::Yaml(_))));
}

#[test]
fn test_config_rejects_bad_log_level() {
    let result = Config::from_yaml_str("log:\n  level: loud\n");

    assert!(matches!(result, Err(ConfigError::InvalidLevel(level)) if level == "loud"));
}

#[test]
fn test_config_file_with_env_override() {
    let _guard = ENV_LOCK.lock().unwrap();

    let path = std::env::temp_dir().join(format!("sketch-config-{}.yaml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "server:\n  listen_addr: \"127.0.0.1:9000\"").unwrap();

    unsafe {
        std::env::set_var("SKETCH_CONFIG", &path);
        std::env::remove_var("LISTEN");
    }
    assert_eq!(Config::load().unwrap().server.listen_addr, "127.0.0.1:9000");

    unsafe {
        std::env::set_var("LISTEN", "127.0.0.1:9001");
    }
    assert_eq!(Config::load().unwrap().server.listen_addr, "127.0.0.1:9001");

    unsafe {
        std::env::remove_var("SKETCH_CONFIG");
        std::env::remove_var("LISTEN");
    }
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_config_missing_file() {
    let result = Config::from_file("/nonexistent/sketch.yaml".into());

    assert!(matches!(result, Err(ConfigError::Io { .. })));
}
