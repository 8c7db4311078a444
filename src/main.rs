//! Coupon Catalog CLI
//!
//! Builds a catalog from local source files and prints one view of it.

use std::{io, path::PathBuf};

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::{info, warn};

use coupon_catalog::{
    catalog::CouponCatalog,
    config::EngineConfig,
    coupons::{CouponType, CouponTypeSet},
    ingest::{AppIngestor, PaperIngestor, PaybackIngestor, RawBatch},
    listing,
    logging::{LogFormat, init_subscriber},
    sorting::SortMode,
    time::PointInTime,
    users::UserSettings,
    views,
};

/// Coupon catalog inspection tool
#[derive(Debug, Parser)]
#[command(name = "coupon-catalog", about = "Coupon catalog inspection tool", long_about = None)]
struct Cli {
    /// Engine configuration (YAML)
    #[arg(short, long, env = "COUPON_CATALOG_CONFIG")]
    config: Option<PathBuf>,

    /// Paper flyer batch files (JSON arrays)
    #[arg(short, long = "paper", env = "COUPON_CATALOG_PAPER", value_delimiter = ',')]
    paper: Vec<PathBuf>,

    /// App coupon file (JSON array)
    #[arg(short, long, env = "COUPON_CATALOG_APP")]
    app: Option<PathBuf>,

    /// Loyalty card offer file (JSON array)
    #[arg(long, env = "COUPON_CATALOG_PAYBACK")]
    payback: Option<PathBuf>,

    /// View index
    #[arg(short, long, default_value_t = 0)]
    view: usize,

    /// Sort code; the view's default when absent
    #[arg(short, long)]
    sort: Option<u8>,

    /// Restrict to one coupon type code
    #[arg(short = 't', long)]
    coupon_type: Option<u8>,

    /// Collapse duplicate offers for the same product
    #[arg(long)]
    hide_duplicates: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore if missing)
    _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_subscriber(&cli.log_level, cli.log_format)?;

    let config = cli.config.as_deref().map_or_else(
        || Ok(EngineConfig::default()),
        |path| {
            EngineConfig::load(path).with_context(|| format!("loading config {}", path.display()))
        },
    )?;

    let at = PointInTime::now(config.time_zone()?);

    let paper_batches = file_batches(&cli.paper);
    let app_batches = file_batches(cli.app.as_slice());
    let payback_batches = file_batches(cli.payback.as_slice());

    let (catalog, report) = CouponCatalog::merge([
        PaperIngestor::new(&config.paper, &config.abbreviations).ingest(&paper_batches, &at),
        AppIngestor::new(&config.abbreviations).ingest(&app_batches),
        PaybackIngestor::new(&config.abbreviations).ingest(&payback_batches),
    ]);

    if report.has_warnings() {
        warn!(
            warnings = report.warnings().count(),
            "ingestion finished with warnings"
        );
    }

    let view = views::view(cli.view).ok_or_else(|| anyhow!("unknown view {}", cli.view))?;

    let sort_mode = cli
        .sort
        .map_or(Ok(view.default_sort_mode()), SortMode::try_from_code)?;

    let settings = UserSettings {
        hide_duplicates: cli.hide_duplicates,
        ..UserSettings::DEFAULT
    };

    let mut filter = settings.filter_for(view);

    if let Some(code) = cli.coupon_type {
        filter.allowed_types = Some(CouponTypeSet::of(&[CouponType::try_from(code)?]));
    }

    let coupons = filter.apply_sorted_by(&catalog, sort_mode, &at);

    info!(
        view = view.name,
        %sort_mode,
        shown = coupons.len(),
        total = catalog.len(),
        "rendering view"
    );

    listing::write_to(io::stdout().lock(), coupons, &at, settings.highlights(view))?;

    Ok(())
}

/// Unreadable files surface as skipped batches in the ingestion report.
fn file_batches(paths: &[PathBuf]) -> Vec<RawBatch> {
    paths
        .iter()
        .map(PathBuf::as_path)
        .map(RawBatch::from_file)
        .collect()
}
