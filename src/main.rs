use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use schemagraph::config::LayoutConfig;
use schemagraph::layout::LayoutEngine;
use schemagraph::layout_schema_with;
use schemagraph::svg::SvgRenderer;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Svg,
}

/// Lay out a multi-service schema graph
#[derive(Parser, Debug)]
#[command(name = "schemagraph")]
#[command(about = "Group schema entities by service and lay them out as JSON or SVG", long_about = None)]
struct Args {
    /// Schema JSON file (use "-" for stdin)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Focus on one entity and its neighbourhood
    #[arg(short, long, value_name = "ENTITY")]
    select: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Svg)]
    format: Format,

    /// Layout config (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Log pipeline phases to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => LayoutConfig::load(path)?,
        None => LayoutConfig::default(),
    };

    let input = if args.input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(&args.input)
            .with_context(|| format!("Failed to read {}", args.input.display()))?
    };

    let metrics = config.metrics.clone();
    let engine = LayoutEngine::new(config);
    let layout = layout_schema_with(&input, args.select.as_deref(), &engine)?;

    let rendered = match args.format {
        Format::Json => serde_json::to_string_pretty(&layout).context("Failed to encode layout")?,
        Format::Svg => SvgRenderer::new(metrics).render(&layout),
    };

    match &args.output {
        Some(path) => std::fs::write(path, &rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{}", rendered),
    }
    Ok(())
}
