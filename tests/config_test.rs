//! Integration tests for configuration loading and validation.

use std::io::Write;

use typeshift::config::{self, Config};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.server.max_upload_bytes(), 50 * 1024 * 1024);
    assert!(config.server.auth.enabled);
    assert_eq!(config.server.auth.token_ttl_minutes, 30);
    assert!(config.scratch.dir.is_none());
    assert_eq!(config.conversion.grid_max_rows, 100);
    assert_eq!(config.conversion.grid_cell_chars, 15);
    assert_eq!(config.conversion.jpeg_quality, 75);
    config::validate_config(&config).unwrap();
}

#[test]
fn partial_file_keeps_defaults() {
    let file = write_config(
        r#"
[server]
port = 9001

[server.auth]
enabled = false
bcrypt_cost = 4

[conversion]
grid_max_rows = 10
"#,
    );

    let config = config::load_config(file.path()).unwrap();
    assert_eq!(config.server.port, 9001);
    assert_eq!(config.server.host, "127.0.0.1");
    assert!(!config.server.auth.enabled);
    assert_eq!(config.server.auth.bcrypt_cost, 4);
    assert_eq!(config.conversion.grid_max_rows, 10);
    assert_eq!(config.conversion.grid_cell_chars, 15);

    let options = config.conversion.options();
    assert_eq!(options.grid.max_rows, 10);
    assert_eq!(options.jpeg_quality, 75);
}

#[test]
fn rejects_invalid_values() {
    let cases = [
        "[server]\nport = 0\n",
        "[server]\nmax_upload_mb = 0\n",
        "[server.auth]\ntoken_ttl_minutes = 0\n",
        "[server.auth]\nbcrypt_cost = 2\n",
        "[conversion]\njpeg_quality = 0\n",
        "[conversion]\ngrid_cell_chars = 0\n",
    ];

    for case in cases {
        let file = write_config(case);
        assert!(
            config::load_config(file.path()).is_err(),
            "accepted invalid config: {case}"
        );
    }
}

#[test]
fn rejects_malformed_toml() {
    let file = write_config("[server\nport = 1");
    let err = config::load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn missing_explicit_path_is_an_error() {
    let result = config::load_config_or_default(Some(std::path::Path::new(
        "/nonexistent/typeshift.toml",
    )));
    assert!(result.is_err());
}

#[test]
fn environment_secret_overrides_file() {
    let file = write_config("[server.auth]\nsecret = \"from-file\"\n");

    let config = config::load_config(file.path()).unwrap();
    assert_eq!(config.server.auth.secret.as_deref(), Some("from-file"));

    std::env::set_var(config::SECRET_ENV, "from-env");
    let config = config::load_config(file.path()).unwrap();
    std::env::remove_var(config::SECRET_ENV);
    assert_eq!(config.server.auth.secret.as_deref(), Some("from-env"));
}
