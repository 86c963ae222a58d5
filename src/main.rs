use anyhow::{bail, Result};
use clap::Parser;
use pagebatch::{
    charts::{update::DEFAULT_PAGE_TYPE, update_chart_blocks, UpdateOptions},
    content::JsonPageStore,
    logging,
    snapshot::{expand_path, Snapshot},
};
use std::path::PathBuf;
use tracing::{info, warn};

/// Monthly updates to data snapshot values: rewrite chart block dates.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON file containing all markets' data snapshot values
    #[arg(long = "snapshot_file", visible_alias = "snapshot-file")]
    snapshot_file: PathBuf,

    /// Page store directory
    #[arg(long, env = "CONTENT_STORE_DIR", default_value = "./content")]
    store: PathBuf,

    /// Only pages of this type are scanned
    #[arg(long, default_value = DEFAULT_PAGE_TYPE)]
    page_type: String,

    /// Report what would change without publishing
    #[arg(long)]
    dry_run: bool,

    /// Exit non-zero if any line-index chart could not be tied to a market
    #[arg(long)]
    fail_on_unresolved: bool,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    logging::init();
    let args = Args::parse();

    // ─── 2) load snapshot before touching any page ───────────────────
    let snapshot_path = expand_path(&args.snapshot_file)?;
    info!(path = %snapshot_path.display(), "reading snapshot");
    let snapshot = Snapshot::load(&snapshot_path)?;

    // ─── 3) rewrite + publish ────────────────────────────────────────
    let mut store = JsonPageStore::open_existing(expand_path(&args.store)?)?;
    let options = UpdateOptions {
        page_type: args.page_type,
        dry_run: args.dry_run,
    };
    let report = update_chart_blocks(&mut store, &snapshot, &options)?;

    info!(
        scanned = report.pages_scanned,
        published = report.pages_published,
        charts = report.charts_updated,
        unresolved = report.unresolved.len(),
        "chart dates updated"
    );
    for u in &report.unresolved {
        warn!(
            page_id = u.page_id,
            block = ?u.block_id,
            data_source = %u.data_source,
            reason = %u.reason,
            "unresolved"
        );
    }

    if args.fail_on_unresolved && !report.unresolved.is_empty() {
        bail!(
            "{} line-index chart(s) could not be resolved to a market",
            report.unresolved.len()
        );
    }
    Ok(())
}
