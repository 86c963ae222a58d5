use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use glob::glob;
use serde::Serialize;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::debug;

use super::history::{AppliedMigration, MigrationHistory};
use super::types::Page;

/// The page-storage collaborator both batch tools run against.
pub trait PageStore {
    /// Every page of `page_type`, ordered by id.
    fn pages_of_type(&self, page_type: &str) -> Result<Vec<Page>>;

    /// Persist `page`'s current fields as a new published revision.
    fn publish(&mut self, page: &mut Page) -> Result<()>;

    /// Persist `pages` exactly as given, without creating revisions.
    fn save_all(&mut self, pages: &[Page]) -> Result<()>;

    fn applied_migrations(&self) -> Result<Vec<AppliedMigration>>;

    fn record_migration(&mut self, name: &str) -> Result<()>;

    fn forget_migration(&mut self, name: &str) -> Result<()>;
}

/// Directory-backed store: `pages/<id>.json` plus a `migrations.json` ledger.
pub struct JsonPageStore {
    root: PathBuf,
    pages_dir: PathBuf,
    history: MigrationHistory,
}

impl JsonPageStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let pages_dir = root.join("pages");
        fs::create_dir_all(&pages_dir)
            .with_context(|| format!("creating page directory {:?}", pages_dir))?;
        let history = MigrationHistory::new(root.join("migrations.json"));
        Ok(Self {
            root,
            pages_dir,
            history,
        })
    }

    /// Open a store that must already exist; nothing is created.
    pub fn open_existing(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let pages_dir = root.join("pages");
        if !pages_dir.is_dir() {
            bail!(
                "page store `{}` has no pages directory; expected {}",
                root.display(),
                pages_dir.display()
            );
        }
        let history = MigrationHistory::new(root.join("migrations.json"));
        Ok(Self {
            root,
            pages_dir,
            history,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn page_path(&self, id: u64) -> PathBuf {
        self.pages_dir.join(format!("{}.json", id))
    }

    /// Write a page without publishing it.
    pub fn insert(&mut self, page: &Page) -> Result<()> {
        write_json_atomic(&self.page_path(page.id), page)
    }

    /// Every stored page regardless of type, ordered by id.
    pub fn all_pages(&self) -> Result<Vec<Page>> {
        let pattern = format!("{}/*.json", self.pages_dir.display());
        let mut pages = Vec::new();
        for entry in glob(&pattern).context("invalid glob pattern for page directory")? {
            let path = entry.context("reading page directory entry")?;
            let text = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
            let page: Page =
                serde_json::from_str(&text).with_context(|| format!("parsing page {:?}", path))?;
            pages.push(page);
        }
        pages.sort_by_key(|p| p.id);
        Ok(pages)
    }
}

impl PageStore for JsonPageStore {
    fn pages_of_type(&self, page_type: &str) -> Result<Vec<Page>> {
        Ok(self
            .all_pages()?
            .into_iter()
            .filter(|p| p.page_type == page_type)
            .collect())
    }

    fn publish(&mut self, page: &mut Page) -> Result<()> {
        page.publish_at(Utc::now());
        write_json_atomic(&self.page_path(page.id), page)
            .with_context(|| format!("publishing page {}", page.id))
    }

    /// Stage every page in a temp file first; nothing is renamed into place
    /// unless every page serialized and wrote cleanly.
    fn save_all(&mut self, pages: &[Page]) -> Result<()> {
        let mut staged = Vec::with_capacity(pages.len());
        for page in pages {
            let tmp = stage_json(&self.pages_dir, page)
                .with_context(|| format!("staging page {}", page.id))?;
            staged.push((tmp, self.page_path(page.id)));
        }
        debug!(count = staged.len(), "staged pages; committing");
        for (tmp, path) in staged {
            tmp.persist(&path)
                .map_err(|e| anyhow!("renaming staged page into {:?}: {}", path, e.error))?;
        }
        Ok(())
    }

    fn applied_migrations(&self) -> Result<Vec<AppliedMigration>> {
        self.history.load()
    }

    fn record_migration(&mut self, name: &str) -> Result<()> {
        self.history.record(name)
    }

    fn forget_migration(&mut self, name: &str) -> Result<()> {
        self.history.forget(name)
    }
}

fn stage_json<T: Serialize>(dir: &Path, value: &T) -> Result<NamedTempFile> {
    let mut tmp =
        NamedTempFile::new_in(dir).with_context(|| format!("creating temp file in {:?}", dir))?;
    serde_json::to_writer_pretty(&mut tmp, value).context("serializing JSON")?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Write `value` as pretty JSON: temp file in the same directory, then rename.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let tmp = stage_json(dir, value)?;
    tmp.persist(path)
        .map_err(|e| anyhow!("renaming temp file into {:?}: {}", path, e.error))?;
    Ok(())
}
