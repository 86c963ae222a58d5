use anyhow::Result;
use clap::{Parser, Subcommand};
use pagebatch::{
    content::{JsonPageStore, PageStore},
    logging,
    migrate::{self, run_backward, run_forward},
    snapshot::expand_path,
};
use std::path::PathBuf;
use tracing::info;

/// Apply stream-field data migrations to a page store.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Page store directory
    #[arg(long, env = "CONTENT_STORE_DIR", default_value = "./content")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show known migrations and whether each has been applied
    List,
    /// Apply a migration
    Forwards { name: String },
    /// Revert a migration (fails for one-way migrations)
    Backwards { name: String },
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();
    let mut store = JsonPageStore::open_existing(expand_path(&args.store)?)?;

    match args.command {
        Command::List => {
            let applied = store.applied_migrations()?;
            for migration in migrate::registry() {
                let state = applied
                    .iter()
                    .find(|a| a.name == migration.name())
                    .map(|a| format!("applied {}", a.applied_at.to_rfc3339()))
                    .unwrap_or_else(|| "pending".to_string());
                println!("{}\t{}", migration.name(), state);
            }
        }
        Command::Forwards { name } => {
            let migration = migrate::find(&name)?;
            let report = run_forward(&mut store, migration.as_ref())?;
            info!(
                migration = %name,
                pages = report.pages_changed,
                revisions = report.revisions_changed,
                blocks = report.blocks_migrated,
                "done"
            );
        }
        Command::Backwards { name } => {
            let migration = migrate::find(&name)?;
            run_backward(&mut store, migration.as_ref())?;
            info!(migration = %name, "reverted");
        }
    }
    Ok(())
}
