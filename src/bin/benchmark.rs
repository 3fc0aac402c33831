//! MetaDoc codec benchmark.
//!
//! Encodes each input file with every available method plus `auto`,
//! verifies the round trip, and prints a comparison table followed by the
//! engine's statistics report.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use metadoc::{
    CompressionEngine, CompressionMetadata, Config, ContentType, Method, MethodRequest, VERSION,
};

#[derive(Parser)]
#[command(name = "benchmark")]
#[command(version = VERSION)]
#[command(about = "Compare MetaDoc encoding methods on real files", long_about = None)]
struct Cli {
    /// Files to encode
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Compression level (0-22)
    #[arg(short, long, default_value = "6", allow_negative_numbers = true)]
    level: i32,

    /// Content-type hint for `auto` (image, video, audio, pdf, text, json, ...)
    #[arg(short = 't', long = "type", default_value = "unknown")]
    content_type: String,

    /// TOML config file (default: user config dir, then environment)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print only the JSON report
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?.with_env_overrides(),
        None => Config::load()?,
    };
    let engine = CompressionEngine::with_config(config)?;
    let hint = ContentType::from_label(&cli.content_type);

    let mut requests: Vec<MethodRequest> = Method::ALL
        .into_iter()
        .filter(|m| engine.capabilities().supports(*m))
        .map(MethodRequest::Exact)
        .collect();
    requests.push(MethodRequest::Auto);

    for path in &cli.files {
        let payload =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

        if !cli.json {
            println!();
            println!("{} ({} bytes)", path.display(), payload.len());
            println!(
                "{:<16} {:<16} {:>12} {:>9} {:>10} {:>10}",
                "Request", "Method", "Size", "Ratio", "vs base64", "Time"
            );
            println!("{}", "-".repeat(78));
        }

        for &request in &requests {
            let (text, meta) = engine.compress_with_hint(&payload, hint, request, cli.level)?;
            let decoded = engine
                .decompress(&text, &meta)
                .with_context(|| format!("{} failed to decode", meta.method))?;
            if decoded != payload {
                bail!("{} round trip mismatch on {}", meta.method, path.display());
            }

            if !cli.json {
                print_row(request, &meta);
            }
        }

        if !cli.json {
            let method = engine.select_method(payload.len(), hint);
            println!("Selector picks {method} for {hint:?}");
        }
    }

    if !cli.json {
        println!();
        println!("Report:");
    }
    println!("{}", serde_json::to_string_pretty(&engine.report())?);

    Ok(())
}

fn print_row(request: MethodRequest, meta: &CompressionMetadata) {
    let request = match request {
        MethodRequest::Auto => "auto".to_string(),
        MethodRequest::Exact(method) => method.to_string(),
    };
    println!(
        "{:<16} {:<16} {:>12} {:>8.1}% {:>9.1}% {:>8.3}ms",
        request,
        meta.method.to_string(),
        meta.compressed_size,
        meta.compression_ratio * 100.0,
        meta.baseline_improvement * 100.0,
        meta.processing_time_ms
    );
}
