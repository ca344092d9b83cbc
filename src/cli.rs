use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "typeshift")]
#[command(author, version, about = "File-format conversion relay")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the conversion API server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Convert a single local file
    Convert {
        /// Input file to convert
        #[arg(required = true)]
        input: PathBuf,

        /// Target format, e.g. PDF, DOCX, CSV, XLSX, PNG, JPG
        #[arg(long = "to", required = true)]
        to: String,

        /// Output path (defaults to converted_<stem>.<ext> beside the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List supported conversions
    Formats,

    /// Check whether the PDFium library can be loaded
    CheckPdfium,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,

    /// Generate a random token signing secret
    GenerateSecret,
}
