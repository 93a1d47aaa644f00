//! Loading configuration files from disk.

use bondlab_core::domain::RecordKind;
use bondlab_runner::config::{AppConfig, Backend, ConfigError};
use std::fs;

const MAIN: &str = r#"
[database]
backend = "postgres"
host = "db.internal"
user = "collector"

[tables.coupons]
name = "coupons"
unique_key = ["isin", "coupondate"]
columns = [
    { column = "isin", type = "VARCHAR(36)" },
    { column = "coupondate", type = "DATE" },
    { column = "value", type = "NUMERIC(18, 6)", source = "VALUE_RUB" },
]
"#;

#[test]
fn secrets_file_overlays_the_main_file() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("bondlab.toml");
    let secrets = dir.path().join("secrets.toml");
    fs::write(&main, MAIN).unwrap();
    fs::write(&secrets, "[database]\npassword = \"hunter2\"\nport = 6432\n").unwrap();

    let cfg = AppConfig::load(&main, Some(&secrets)).unwrap();
    assert_eq!(cfg.database.backend, Backend::Postgres);
    assert_eq!(cfg.database.host, "db.internal");
    assert_eq!(cfg.database.port, 6432);
    assert_eq!(cfg.database.password.as_deref(), Some("hunter2"));

    let coupons = cfg.table(RecordKind::Coupon).unwrap();
    assert_eq!(coupons.mapping.lookup("VALUE_RUB").unwrap().column, "value");
    assert!(coupons.mapping.lookup("VALUE").is_none());
}

#[test]
fn missing_secrets_file_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("bondlab.toml");
    fs::write(&main, MAIN).unwrap();

    let cfg = AppConfig::load(&main, Some(&dir.path().join("secrets.toml"))).unwrap();
    assert_eq!(cfg.database.password, None);
}

#[test]
fn missing_main_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::load(&dir.path().join("absent.toml"), None).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn malformed_secrets_fail_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("bondlab.toml");
    let secrets = dir.path().join("secrets.toml");
    fs::write(&main, MAIN).unwrap();
    fs::write(&secrets, "[database\npassword = ").unwrap();

    let err = AppConfig::load(&main, Some(&secrets)).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { ref origin, .. } if origin == "secrets"));
}

#[test]
fn shipped_example_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/bondlab.example.toml");
    let cfg = AppConfig::load(std::path::Path::new(path), None).unwrap();
    assert_eq!(cfg.table_errors().count(), 0);
    for kind in RecordKind::ALL {
        assert!(cfg.table(kind).is_ok(), "{kind}");
    }
}
