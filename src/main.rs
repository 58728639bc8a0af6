use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;

use html2docx::Converter;
use html2docx::config::ConverterConfig;

#[derive(Parser, Debug)]
#[command(name = "html2docx")]
#[command(about = "Convert an HTML document into a .docx file")]
#[command(version)]
struct Cli {
    /// Input HTML file
    #[arg(required_unless_present = "init_config")]
    input: Option<PathBuf>,

    /// Output .docx path (defaults to the input path with a .docx extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file to use instead of the user config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the converted document model as JSON instead of writing a .docx
    #[arg(long)]
    dump_json: bool,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

fn main() -> Result<()> {
    let _ = env_logger::builder()
        .filter_module("html2docx", log::LevelFilter::Warn)
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();

    if cli.init_config {
        match ConverterConfig::init_default()? {
            Some(path) => println!("Wrote default configuration to {}", path.display()),
            None => println!("No configuration directory available"),
        }
        return Ok(());
    }

    let Some(input) = cli.input else {
        anyhow::bail!("no input file given");
    };

    let config = match &cli.config {
        Some(path) => ConverterConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ConverterConfig::load()?,
    };

    let html = fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let converter = Converter::new(config);
    #[cfg(feature = "http")]
    let converter = converter.with_fetcher(html2docx::HttpFetcher::default());

    if cli.dump_json {
        let document = converter.convert(&html)?;
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let output = cli
        .output
        .unwrap_or_else(|| input.with_extension("docx"));
    let bytes = converter.to_docx(&html)?;
    fs::write(&output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!("wrote {} bytes to {}", bytes.len(), output.display());
    println!("Converted {} -> {}", input.display(), output.display());
    Ok(())
}
