//! Bilagssamler CLI - assemble appendix PDFs into a single bundle from the
//! command line.

use anyhow::{Context, Result};
use bilagssamler_core::{AppendixInput, Assembler, AssemblyConfig};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "bilagssamler")]
#[command(author, version, about = "Assemble appendix PDFs into a paginated bundle", long_about = None)]
struct Args {
    /// Input PDF files or directories (directories contribute their .pdf files)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output PDF file
    #[arg(short, long, default_value = "samlet.pdf")]
    output: PathBuf,

    /// Page number printed on the first output page
    #[arg(short = 's', long)]
    start_page: Option<u32>,

    /// Watermark text drawn beneath every page
    #[arg(short, long)]
    watermark: Option<String>,

    /// Single-page PDF to use as the watermark instead of generated text
    #[arg(long)]
    watermark_asset: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Expand the positional inputs into a flat list of PDF paths.
fn collect_pdf_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let entries = std::fs::read_dir(input)
                .context(format!("Failed to read directory: {}", input.display()))?;
            let mut dir_paths: Vec<PathBuf> = entries
                .filter_map(std::result::Result::ok)
                .map(|entry| entry.path())
                .filter(|path| is_pdf(path))
                .collect();
            // Directory iteration order is platform-dependent
            dir_paths.sort();
            paths.extend(dir_paths);
        } else {
            paths.push(input.clone());
        }
    }

    Ok(paths)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AssemblyConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AssemblyConfig::load()
    };

    // Override config with CLI arguments
    if let Some(start_page) = args.start_page {
        config.start_page = start_page;
    }
    if let Some(watermark) = args.watermark {
        config.watermark_text = watermark;
    }
    if let Some(asset) = args.watermark_asset {
        config.watermark_asset = Some(asset);
    }

    let paths = collect_pdf_paths(&args.inputs)?;
    if paths.is_empty() {
        anyhow::bail!("No input PDFs found");
    }

    info!("Reading {} input files", paths.len());

    // Setup progress bar
    #[allow(clippy::cast_possible_truncation)]
    let pb = ProgressBar::new(paths.len() as u64);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut appendices = Vec::with_capacity(paths.len());
    for path in &paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("bilag.pdf")
            .to_string();
        pb.set_message(filename.clone());

        let bytes = std::fs::read(path)
            .context(format!("Failed to read input: {}", path.display()))?;
        appendices.push(AppendixInput::new(filename, bytes));
        pb.inc(1);
    }
    pb.finish_with_message("Inputs loaded");

    let assembler = Assembler::new(config).context("Invalid configuration")?;
    let bundle = assembler
        .assemble(appendices)
        .context("Failed to assemble bundle")?;

    std::fs::write(&args.output, bundle)
        .context(format!("Failed to write output: {}", args.output.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Bundle saved to: {}", args.output.display());
    }

    Ok(())
}
