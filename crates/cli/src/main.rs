//! CLI tool for generating a step-by-step PowerPoint deck from a CSV sheet.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use stepdeck_core::config::{DEFAULT_IMAGE_PATH, DEFAULT_TEMPLATE_PATH};
use stepdeck_core::{
    read_rows_from_path, DeckEngine, Error, GenerationReport, GeneratorConfig, ImageData,
    SlideAssembler,
};
use stepdeck_pptx::PptxDeck;

/// Generate one slide per CSV row from a PowerPoint template.
#[derive(Parser, Debug)]
#[command(name = "step-deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file with SECTION and STEPS columns
    csv_file: PathBuf,

    /// Output PowerPoint file
    output: PathBuf,

    /// Template deck whose first slide is the prototype
    #[arg(short, long, default_value = DEFAULT_TEMPLATE_PATH)]
    template: PathBuf,

    /// Image shown in place of every picture on the prototype
    #[arg(short, long, default_value = DEFAULT_IMAGE_PATH)]
    image: PathBuf,

    /// Keep the prototype slide at the front of the output deck
    #[arg(long)]
    keep_prototype: bool,

    /// Keep the title and body placeholders on generated slides
    #[arg(long)]
    keep_placeholders: bool,

    /// Print a JSON generation report on stdout
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match run(&args) {
        Ok(report) => {
            if args.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error: failed to serialize report: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                println!(
                    "Presentation saved as {} ({} slides)",
                    args.output.display(),
                    report.slides_generated
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load every input, build the deck and save it.
fn run(args: &Args) -> Result<GenerationReport> {
    let mut config = GeneratorConfig::default()
        .with_template(args.template.clone())
        .with_image(args.image.clone())
        .with_keep_prototype(args.keep_prototype);
    if args.keep_placeholders {
        config = config.with_strip_placeholders(Vec::new());
    }

    let mut deck = PptxDeck::open(&config.template_path)
        .with_context(|| format!("Failed to load template {}", config.template_path.display()))?;

    let rows = read_rows_from_path(&args.csv_file)
        .with_context(|| format!("Failed to read {}", args.csv_file.display()))?;
    log::debug!("Read {} rows from {}", rows.len(), args.csv_file.display());

    if deck.slide_count() == 0 {
        return Err(Error::NoSlides).context("The template has no prototype slide");
    }

    let image = ImageData::load(&config.image_path)?;

    let report = SlideAssembler::from_config(&config)
        .assemble(&mut deck, &rows, &image)
        .context("Failed to generate slides")?;

    deck.save(&args.output)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;

    Ok(report)
}
