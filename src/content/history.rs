// src/content/history.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use super::store::write_json_atomic;

/// One row of the migration ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMigration {
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// JSON-file ledger of applied migrations (`migrations.json`).
///
/// A missing file means nothing has been applied yet.
pub struct MigrationHistory {
    path: PathBuf,
}

impl MigrationHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Vec<AppliedMigration>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("reading migration history {:?}", self.path))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing migration history {:?}", self.path))
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.load()?.iter().any(|m| m.name == name))
    }

    /// Append `name`; a no-op when it is already recorded.
    pub fn record(&self, name: &str) -> Result<()> {
        let mut applied = self.load()?;
        if applied.iter().any(|m| m.name == name) {
            return Ok(());
        }
        applied.push(AppliedMigration {
            name: name.to_string(),
            applied_at: Utc::now(),
        });
        write_json_atomic(&self.path, &applied)
    }

    pub fn forget(&self, name: &str) -> Result<()> {
        let mut applied = self.load()?;
        let before = applied.len();
        applied.retain(|m| m.name != name);
        if applied.len() == before {
            return Ok(());
        }
        write_json_atomic(&self.path, &applied)
    }
}
