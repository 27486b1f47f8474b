use std::{env, fs};

use cpanel_api::ConfigError;
use cpanel_api::config::loader::load_config;

#[test]
fn environment_defaults_and_file_overrides() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("cpanel.toml");

    unsafe {
        env::set_var("CPANEL_HOST", "https://env-host:2083");
        env::set_var("CPANEL_USERNAME", "env-user");
        env::set_var("CPANEL_API_TOKEN", "ENVTOKEN");
    }

    // 1) Environment alone is enough
    let cfg = load_config(Some(&path)).expect("env-only config");
    assert_eq!(cfg.host, "https://env-host:2083");
    assert_eq!(cfg.username, "env-user");
    assert_eq!(cfg.timeout_secs, 10);

    // 2) File values override the environment
    fs::write(
        &path,
        r#"
[gateway]
host = "https://file-host:2083"
timeout_secs = 30

[user.app]
name = "app"
password = "pw"
"#,
    )
    .expect("write toml");
    let cfg = load_config(Some(&path)).expect("merged config");
    assert_eq!(cfg.host, "https://file-host:2083");
    assert_eq!(cfg.username, "env-user");
    assert_eq!(cfg.api_token, "ENVTOKEN");
    assert_eq!(cfg.timeout_secs, 30);

    // 3) Numeric-looking values keep their exact text
    fs::remove_file(&path).expect("remove toml");
    unsafe {
        env::set_var("CPANEL_API_TOKEN", "00123456789012345678901234567890");
        env::set_var("CPANEL_TIMEOUT_SECS", "45");
    }
    let cfg = load_config(Some(&path)).expect("numeric token config");
    assert_eq!(cfg.api_token, "00123456789012345678901234567890");
    assert_eq!(cfg.timeout_secs, 45);
    unsafe {
        env::set_var("CPANEL_API_TOKEN", "1e10");
        env::remove_var("CPANEL_TIMEOUT_SECS");
    }
    let cfg = load_config(None).expect("exponent token config");
    assert_eq!(cfg.api_token, "1e10");

    // 4) Missing token is reported with the variable to set
    unsafe {
        env::remove_var("CPANEL_API_TOKEN");
    }
    let err = load_config(Some(&path)).expect_err("token missing");
    assert!(matches!(err, ConfigError::Missing { env: "CPANEL_API_TOKEN", .. }));

    unsafe {
        env::remove_var("CPANEL_HOST");
        env::remove_var("CPANEL_USERNAME");
    }
}
