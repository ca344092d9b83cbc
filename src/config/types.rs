use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use typeshift_convert::{ConvertOptions, GridOptions};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scratch: ScratchConfig,

    #[serde(default)]
    pub conversion: ConversionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body, in MiB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,

    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_max_upload_mb() -> usize {
    50
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Require a bearer token on the conversion endpoint
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Token signing secret (or set TYPESHIFT_AUTH_SECRET)
    #[serde(default)]
    pub secret: Option<String>,

    /// Retired secrets still accepted when verifying tokens
    #[serde(default)]
    pub previous_secrets: Vec<String>,

    /// Access token lifetime in minutes (default: 30)
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,

    /// Bcrypt work factor for stored password hashes
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_true() -> bool {
    true
}
fn default_token_ttl() -> u64 {
    30
}
fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret: None,
            previous_secrets: Vec::new(),
            token_ttl_minutes: default_token_ttl(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScratchConfig {
    /// Directory for transient upload and output files (default: system temp dir)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// pdfium shared library, file or directory
    #[serde(default)]
    pub pdfium_library_path: Option<PathBuf>,

    /// Data rows kept when rendering a spreadsheet as a PDF grid
    #[serde(default = "default_grid_max_rows")]
    pub grid_max_rows: usize,

    /// Characters kept per grid cell
    #[serde(default = "default_grid_cell_chars")]
    pub grid_cell_chars: usize,

    /// JPEG quality for lossy output (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_grid_max_rows() -> usize {
    100
}
fn default_grid_cell_chars() -> usize {
    15
}
fn default_jpeg_quality() -> u8 {
    75
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            pdfium_library_path: None,
            grid_max_rows: default_grid_max_rows(),
            grid_cell_chars: default_grid_cell_chars(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl ConversionConfig {
    /// Options for building the conversion router.
    pub fn options(&self) -> ConvertOptions {
        ConvertOptions {
            pdfium_library_path: self
                .pdfium_library_path
                .as_ref()
                .map(|p| PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref())),
            grid: GridOptions {
                max_rows: self.grid_max_rows,
                cell_chars: self.grid_cell_chars,
            },
            jpeg_quality: self.jpeg_quality,
        }
    }
}
