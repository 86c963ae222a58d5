//! Market data snapshot: the JSON file the monthly consumer-credit-trends
//! job drops next to the site, plus the lookups the chart updater runs
//! against it.

pub mod resolve;
pub mod types;

pub use resolve::{resolve_projected_month, Feed, ResolvedMonth, Unresolved};
pub use types::{MarketRecord, Snapshot};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::{
    env, fs,
    path::{Component, Path, PathBuf},
};

/// Expand a leading `~` against `$HOME` and make the result absolute.
///
/// Purely lexical: `.` and `..` are folded, symlinks are not resolved and the
/// path does not have to exist.
pub fn expand_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => {
            let home = env::var_os("HOME").context("cannot expand `~`: $HOME is not set")?;
            PathBuf::from(home).join(rest)
        }
        Err(_) => path.to_path_buf(),
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        env::current_dir()
            .context("reading current directory")?
            .join(expanded)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

impl Snapshot {
    /// Read and validate a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading snapshot {:?}", path))?;
        Self::from_json(&text).with_context(|| format!("parsing snapshot {:?}", path))
    }

    /// Parse snapshot JSON. An empty `markets` list is rejected because there
    /// is no latest data month to publish.
    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        if snapshot.markets.is_empty() {
            bail!("snapshot contains no markets");
        }
        Ok(snapshot)
    }

    /// `max(data_month)` across every market.
    pub fn latest_data_month(&self) -> Option<NaiveDate> {
        self.markets.iter().map(|m| m.data_month).max()
    }

    pub fn market(&self, market_key: &str) -> Option<&MarketRecord> {
        self.markets.iter().find(|m| m.market_key == market_key)
    }
}
