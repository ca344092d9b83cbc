mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variable that overrides `server.auth.secret`.
pub const SECRET_ENV: &str = "TYPESHIFT_AUTH_SECRET";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./typeshift.toml",
        "./config.toml",
        "~/.config/typeshift/config.toml",
        "/etc/typeshift/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    let mut config = Config::default();
    apply_env(&mut config);
    Ok(config)
}

/// The environment secret wins over the file.
fn apply_env(config: &mut Config) {
    if let Ok(secret) = std::env::var(SECRET_ENV) {
        if !secret.is_empty() {
            config.server.auth.secret = Some(secret);
        }
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    // Validate server config
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }
    if config.server.max_upload_mb == 0 {
        anyhow::bail!("server.max_upload_mb must be greater than 0");
    }

    // Validate auth config
    let auth = &config.server.auth;
    if auth.token_ttl_minutes == 0 {
        anyhow::bail!("server.auth.token_ttl_minutes must be greater than 0");
    }
    if !(4..=31).contains(&auth.bcrypt_cost) {
        anyhow::bail!(
            "server.auth.bcrypt_cost must be between 4 and 31, got {}",
            auth.bcrypt_cost
        );
    }
    if auth.secret.as_deref() == Some("") {
        anyhow::bail!("server.auth.secret cannot be empty");
    }

    // Validate conversion config
    let conversion = &config.conversion;
    if conversion.grid_max_rows == 0 || conversion.grid_cell_chars == 0 {
        anyhow::bail!("conversion grid limits must be greater than 0");
    }
    if !(1..=100).contains(&conversion.jpeg_quality) {
        anyhow::bail!(
            "conversion.jpeg_quality must be between 1 and 100, got {}",
            conversion.jpeg_quality
        );
    }

    if let Some(dir) = &config.scratch.dir {
        if !dir.exists() {
            tracing::warn!("Scratch directory does not exist yet, it will be created: {:?}", dir);
        }
    }

    Ok(())
}
