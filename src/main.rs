mod cli;

use typeshift::{auth, config, server};
use typeshift_convert::{format, pdf::PdfiumLoader, ConversionRouter};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting Typeshift server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "typeshift=debug,typeshift_convert=debug,tower_http=debug".to_string()
        } else {
            "typeshift=info,typeshift_convert=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Convert { input, to, output } => {
            convert_file(&input, &to, output, cli.config.as_deref())
        }
        Commands::Formats => list_formats(cli.config.as_deref()),
        Commands::CheckPdfium => check_pdfium(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("typeshift {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::GenerateSecret => {
            println!("{}", auth::generate_secret());
            Ok(())
        }
    }
}

fn convert_file(
    input: &Path,
    target: &str,
    output: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("Input path has no file name")?;
    let extension = format::source_extension(&filename);
    let target = format::normalize_target(target);

    let router = ConversionRouter::new(config.conversion.options());
    let route = router.resolve(&extension, &target)?;

    let output = output.unwrap_or_else(|| {
        input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format::download_name(&filename, &target))
    });

    tracing::info!(
        input = ?input,
        output = ?output,
        strategy = route.strategy.name(),
        "Converting file"
    );

    if let Err(e) = router.convert(&extension, &target, input, &output) {
        // No partial results
        let _ = std::fs::remove_file(&output);
        return Err(e.into());
    }

    println!("{}", output.display());
    Ok(())
}

fn list_formats(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let router = ConversionRouter::new(config.conversion.options());

    println!("{:<8} {:<8} STRATEGY", "SOURCE", "TARGET");
    for route in router.routes() {
        println!(
            "{:<8} {:<8} {}",
            route.source,
            route.target,
            route.strategy.name()
        );
    }

    Ok(())
}

fn check_pdfium(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let loader = PdfiumLoader::new(config.conversion.pdfium_library_path.clone());

    for candidate in loader.candidates() {
        println!("  candidate: {}", candidate.display());
    }

    match loader.bind() {
        Ok(_) => {
            println!("✓ PDFium loaded; PDF reading and rendering are available");
            Ok(())
        }
        Err(e) => {
            println!("✗ {}", e);
            println!("PDF sources (pdf to DOCX, XLSX, CSV, PNG, JPG) will fail until PDFium is installed.");
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Max upload: {} MB", config.server.max_upload_mb);
            println!("  Auth enabled: {}", config.server.auth.enabled);
            println!(
                "  Token secret: {}",
                if config.server.auth.secret.is_some() {
                    "configured"
                } else {
                    "not set (development fallback)"
                }
            );
            println!(
                "  Previous secrets: {}",
                config.server.auth.previous_secrets.len()
            );
            println!("  Token TTL: {} minutes", config.server.auth.token_ttl_minutes);
            match &config.scratch.dir {
                Some(dir) => println!("  Scratch dir: {}", dir.display()),
                None => println!("  Scratch dir: system temp"),
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
