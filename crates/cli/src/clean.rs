//! CLI tool for removing empty rows and columns from a CSV file.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use stepdeck_core::config::{DEFAULT_CLEAN_INPUT, DEFAULT_CLEAN_OUTPUT};
use stepdeck_core::{clean_file, CleanerConfig};

/// Drop every row and column of a CSV file that holds no values.
#[derive(Parser, Debug)]
#[command(name = "csv-clean")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file
    #[arg(default_value = DEFAULT_CLEAN_INPUT)]
    input: PathBuf,

    /// Output CSV file
    #[arg(default_value = DEFAULT_CLEAN_OUTPUT)]
    output: PathBuf,

    /// Extra cell value to treat as missing (repeatable)
    #[arg(long = "na-value", value_name = "TOKEN")]
    na_values: Vec<String>,

    /// Only empty cells and --na-value tokens are missing; keep NaN, NULL, N/A, ...
    #[arg(long)]
    no_default_na: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = CleanerConfig {
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        na_values: args.na_values.clone(),
        keep_default_na: !args.no_default_na,
    };

    let report = clean_file(&config).with_context(|| {
        format!(
            "Failed to clean {} into {}",
            config.input_path.display(),
            config.output_path.display()
        )
    })?;

    if args.verbose {
        eprintln!(
            "Dropped {} of {} rows and {} columns",
            report.rows_dropped,
            report.rows_before,
            report.columns_dropped.len()
        );
        for column in &report.columns_dropped {
            eprintln!("  dropped column: {}", column);
        }
    }
    println!("Cleaned file saved as {}", config.output_path.display());

    Ok(())
}
