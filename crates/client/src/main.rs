use std::sync::Arc;
use std::time::Duration;

use occex_catalog::{HttpCredentialSigner, StacCatalogClient};
use occex_client::Pipeline;
use occex_common::{BoundingBox, ExtractConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = parse_config(&args)?;

    let timeout = Duration::from_secs(config.http_timeout_secs);
    let locator = Arc::new(StacCatalogClient::new(config.catalog_url.clone(), timeout)?);
    let signer = Arc::new(HttpCredentialSigner::new(
        config.signing_url.clone(),
        timeout,
    )?);

    let pipeline = Pipeline::new(config, locator, signer)?;
    let report = pipeline.run()?;

    println!(
        "sampled {}/{} partitions, wrote {} rows to {}",
        report.partitions_sampled,
        report.partitions_total,
        report.rows_written,
        report.output_path
    );
    Ok(())
}

fn parse_config(args: &[String]) -> Result<ExtractConfig, Box<dyn std::error::Error>> {
    let mut config = ExtractConfig::default();
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.get(i).ok_or("missing value for --config")?;
                config = ExtractConfig::load_from_json(path)?;
            }
            "--collection" => {
                i += 1;
                config.collection = args.get(i).cloned().ok_or("missing value for --collection")?;
            }
            "--taxon" => {
                i += 1;
                config.taxon_order = args.get(i).cloned().ok_or("missing value for --taxon")?;
            }
            "--bbox" => {
                i += 1;
                let raw = args.get(i).ok_or("missing value for --bbox")?;
                config.bbox = parse_bbox(raw)?;
            }
            "--probability" => {
                i += 1;
                config.sample_probability = args
                    .get(i)
                    .and_then(|v| v.parse::<f64>().ok())
                    .ok_or("invalid value for --probability")?;
            }
            "--seed" => {
                i += 1;
                config.sample_seed = args
                    .get(i)
                    .and_then(|v| v.parse::<u64>().ok())
                    .ok_or("invalid value for --seed")?;
            }
            "--output" => {
                i += 1;
                config.output_path = args.get(i).cloned().ok_or("missing value for --output")?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                return Err(format!("unknown argument: {other}").into());
            }
        }
        i += 1;
    }
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn parse_bbox(raw: &str) -> Result<BoundingBox, Box<dyn std::error::Error>> {
    let parts = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| format!("invalid --bbox '{raw}': {e}"))?;
    if parts.len() != 4 {
        return Err(format!("--bbox expects MINLON,MINLAT,MAXLON,MAXLAT, got '{raw}'").into());
    }
    Ok(BoundingBox::new(parts[0], parts[1], parts[2], parts[3])?)
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  occex [--config PATH] [--collection NAME] [--taxon ORDER]");
    eprintln!("        [--bbox MINLON,MINLAT,MAXLON,MAXLAT] [--probability P]");
    eprintln!("        [--seed N] [--output PATH]");
    eprintln!();
    eprintln!("Defaults extract Anura occurrences from the gbif collection");
    eprintln!("inside the Richmond NSW bounding box into richmond_frogs.csv.");
}
