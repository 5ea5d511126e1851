use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use gridsweep::prelude::*;
use gridsweep::Credentials;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

mod output;

/// Fields requested by default; `nextPageToken` is always added.
const DEFAULT_FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,\
places.location,places.types,places.primaryType,places.businessStatus,places.rating,\
places.userRatingCount,places.priceLevel,places.websiteUri,places.nationalPhoneNumber,\
places.regularOpeningHours,places.googleMapsUri";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sweep a region and write every place found to a JSON file
    Run(RunArgs),
    /// Print the number of places in a result file
    Count { file: PathBuf },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// GeoJSON file with the region boundary
    #[arg(short, long)]
    boundary: PathBuf,

    /// Only use features whose `name` property matches
    #[arg(long)]
    feature: Option<String>,

    /// Free-text query, e.g. "restaurant"
    #[arg(short, long)]
    query: String,

    /// OAuth access token
    #[arg(long, env = "GRIDSWEEP_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API key, used when no token is given
    #[arg(long, env = "GRIDSWEEP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// JSON or TOML sweep configuration; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    divisions: Option<usize>,

    #[arg(long)]
    sub_divisions: Option<usize>,

    #[arg(long)]
    cap: Option<usize>,

    #[arg(long)]
    concurrency: Option<usize>,

    /// Maximum subdivision depth; 0 disables the limit
    #[arg(long)]
    max_depth: Option<u32>,

    #[arg(long)]
    retries: Option<u32>,

    #[arg(long)]
    endpoint: Option<String>,

    #[arg(long, default_value = DEFAULT_FIELD_MASK)]
    field_mask: String,

    /// Output file (default: results/places_<timestamp>.json)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gridsweep=info,gridsweep_cli=info,info".into()),
        )
        .init();

    match Cli::parse().command {
        Command::Run(args) => run(args).await,
        Command::Count { file } => {
            let count = output::count_records(&file)?;
            println!("Total number of places saved: {}", count);
            Ok(())
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let credentials = match (&args.token, &args.api_key) {
        (Some(token), _) => Credentials::Bearer(token.clone()),
        (None, Some(key)) => Credentials::ApiKey(key.clone()),
        (None, None) => bail!("no credentials: pass --token or --api-key"),
    };

    let mut provider = GeoJsonBoundary::from_path(&args.boundary)
        .with_context(|| format!("reading boundary {}", args.boundary.display()))?;
    if let Some(name) = &args.feature {
        provider = provider.with_feature_name(name);
    }
    let boundary = provider.boundary()?;

    let cancel = CancellationToken::new();
    let sweeper = SweepBuilder::new()
        .config(config)
        .credentials(credentials)
        .cancellation(cancel.clone())
        .build()?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding queries");
            cancel.cancel();
        }
    });

    let template = SearchRequestTemplate::new(args.query.clone(), args.field_mask.clone());
    let outcome = sweeper.run(&boundary, &template).await;

    report(&outcome);

    let path = args.output.unwrap_or_else(output::default_output_path);
    output::write_records(&path, &outcome.records)?;
    info!("Results saved to {}", path.display());
    info!("Total number of requests: {}", outcome.requests_issued);

    Ok(())
}

fn load_config(args: &RunArgs) -> anyhow::Result<SweepConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => SweepConfig::default(),
    };

    if let Some(divisions) = args.divisions {
        config = config.with_top_divisions(divisions);
    }
    if let Some(divisions) = args.sub_divisions {
        config = config.with_sub_divisions(divisions);
    }
    if let Some(cap) = args.cap {
        config = config.with_cap(cap);
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(depth) = args.max_depth {
        config = config.with_max_depth(Some(depth));
    }
    if let Some(retries) = args.retries {
        let backoff = config.retry_backoff();
        config = config.with_retries(retries, backoff);
    }
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;
    Ok(config)
}

fn read_config(path: &Path) -> anyhow::Result<SweepConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => SweepConfig::from_toml(&contents)?,
        _ => SweepConfig::from_json(&contents)?,
    };
    Ok(config)
}

fn report(outcome: &SearchOutcome) {
    info!("{}", outcome.summary());

    for failure in &outcome.failures {
        warn!(
            rectangle = %failure.rectangle,
            depth = failure.depth,
            kept = failure.records_kept,
            "Query failed: {}",
            failure.error
        );
    }

    for region in &outcome.exhausted {
        warn!(
            rectangle = %region.rectangle,
            depth = region.depth,
            "Still saturated, coverage incomplete ({:?})",
            region.reason
        );
    }

    if !outcome.cancelled.is_empty() {
        warn!(
            "{} regions were not searched because the sweep was cancelled",
            outcome.cancelled.len()
        );
    }

    if !outcome.is_complete() {
        warn!("Coverage is incomplete; see warnings above");
    }
}
