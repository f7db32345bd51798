//! gleaner CLI - extract typed concepts from text documents
//!
//! Loads concept rules from YAML or JSON, runs them over a plain-text document
//! (pages separated by form feeds) and prints the results as JSON.

use clap::{Parser, Subcommand, ValueEnum};
use gleaner::loader::{load_concepts, load_conversion_config};
use gleaner::serialization::{write_json_array, write_ndjson};
use gleaner::{read_document, ConversionConfig, TextParser, ValueConverter};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gleaner")]
#[command(version, about = "Extract typed concepts from line-oriented documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a concept file and print the execution order
    Validate {
        /// Path to the concept file (.yaml, .yml or .json)
        #[arg(short, long)]
        concepts: PathBuf,
    },

    /// Parse a document and print the extracted concepts
    Parse {
        /// Path to the concept file (.yaml, .yml or .json)
        #[arg(short, long)]
        concepts: PathBuf,

        /// Path to the plain-text document
        #[arg(short, long)]
        document: PathBuf,

        /// Conversion settings file (default: standard settings)
        #[arg(long)]
        conversion: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Ndjson)]
        format: OutputFormat,

        /// Also print failed concepts
        #[arg(short, long)]
        errors: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Ndjson,
    Json,
}

fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { concepts } => validate(concepts),
        Commands::Parse {
            concepts,
            document,
            conversion,
            format,
            errors,
        } => parse(concepts, document, conversion, format, errors),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Load and resolve a concept file, printing the execution order
fn validate(concepts: PathBuf) -> Result<(), String> {
    let resolved = load_concepts(&concepts).map_err(|e| e.to_string())?;

    println!("✓ {} concepts are valid", resolved.len());
    for (position, concept) in resolved.iter().enumerate() {
        let definition = concept.definition();
        println!(
            "  {}. {} ({}, {})",
            position + 1,
            definition.description,
            definition.strategy,
            definition.target
        );
    }

    Ok(())
}

/// Run a concept file over a document
fn parse(
    concepts: PathBuf,
    document: PathBuf,
    conversion: Option<PathBuf>,
    format: OutputFormat,
    with_errors: bool,
) -> Result<(), String> {
    let resolved = load_concepts(&concepts).map_err(|e| e.to_string())?;
    let converter = ValueConverter::new();

    let config = match conversion {
        Some(path) => load_conversion_config(&path, &converter).map_err(|e| e.to_string())?,
        None => ConversionConfig::standard(),
    };

    let lines = read_document(&document).map_err(|e| e.to_string())?;
    let result = TextParser::new(&resolved, &converter, &config).parse(lines);

    if !result.is_clean() {
        tracing::warn!(
            errors = result.errors().len(),
            "Some concepts could not be extracted"
        );
    }

    let stdout = io::stdout().lock();
    match format {
        OutputFormat::Ndjson => write_ndjson(stdout, &result, with_errors),
        OutputFormat::Json => write_json_array(stdout, &result, with_errors),
    }
    .map_err(|e| format!("Failed to write results: {}", e))
}
