use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::{Migration, MigrationError, StreamFieldTarget};
use crate::content::{Page, PageStore, StreamValue};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub pages_changed: usize,
    pub revisions_changed: usize,
    pub blocks_migrated: usize,
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

/// Apply `migration` to every matching block of every page and revision.
///
/// Everything is mapped in memory first; a single malformed block fails the
/// whole run before the store is written to.
pub fn run_forward<S, M>(store: &mut S, migration: &M) -> Result<MigrationReport>
where
    S: PageStore,
    M: Migration + ?Sized,
{
    let name = migration.name();
    if is_applied(store, name)? {
        return Err(MigrationError::AlreadyApplied(name.to_string()).into());
    }

    let (pages, report) = map_pages(store, migration, Direction::Forward)?;
    store
        .save_all(&pages)
        .with_context(|| format!("saving pages migrated by {}", name))?;
    store.record_migration(name)?;

    info!(
        migration = name,
        pages = report.pages_changed,
        revisions = report.revisions_changed,
        blocks = report.blocks_migrated,
        "applied migration"
    );
    Ok(report)
}

/// Undo `migration`. Irreversible migrations fail before anything is read.
pub fn run_backward<S, M>(store: &mut S, migration: &M) -> Result<MigrationReport>
where
    S: PageStore,
    M: Migration + ?Sized,
{
    let name = migration.name();
    if !migration.reversible() {
        return Err(MigrationError::Irreversible(name.to_string()).into());
    }
    if !is_applied(store, name)? {
        return Err(MigrationError::NotApplied(name.to_string()).into());
    }

    let (pages, report) = map_pages(store, migration, Direction::Backward)?;
    store
        .save_all(&pages)
        .with_context(|| format!("saving pages reverted by {}", name))?;
    store.forget_migration(name)?;

    info!(migration = name, blocks = report.blocks_migrated, "reverted migration");
    Ok(report)
}

fn is_applied<S: PageStore>(store: &S, name: &str) -> Result<bool> {
    Ok(store.applied_migrations()?.iter().any(|m| m.name == name))
}

/// Returns only the pages that changed.
fn map_pages<S, M>(
    store: &S,
    migration: &M,
    direction: Direction,
) -> Result<(Vec<Page>, MigrationReport)>
where
    S: PageStore,
    M: Migration + ?Sized,
{
    let mut by_page_type: BTreeMap<&str, Vec<&StreamFieldTarget>> = BTreeMap::new();
    for target in migration.targets() {
        by_page_type.entry(target.page_type).or_default().push(target);
    }

    let mut report = MigrationReport::default();
    let mut changed = Vec::new();
    for (page_type, targets) in by_page_type {
        let pages = store
            .pages_of_type(page_type)
            .with_context(|| format!("loading {} pages", page_type))?;
        debug!(page_type, pages = pages.len(), "mapping pages");

        for mut page in pages {
            let page_id = page.id;
            let mut page_blocks = 0;
            for target in &targets {
                if let Some(stream) = page.stream_mut(target.field) {
                    page_blocks += map_stream(stream, target, migration, direction)
                        .with_context(|| format!("page {} field {}", page_id, target.field))?;
                }
                for revision in page.revisions.iter_mut() {
                    let revision_id = revision.id;
                    let Some(stream) = revision.fields.get_mut(target.field) else {
                        continue;
                    };
                    let n = map_stream(stream, target, migration, direction).with_context(|| {
                        format!(
                            "page {} revision {} field {}",
                            page_id, revision_id, target.field
                        )
                    })?;
                    if n > 0 {
                        report.revisions_changed += 1;
                        page_blocks += n;
                    }
                }
            }

            if page_blocks > 0 {
                report.pages_changed += 1;
                report.blocks_migrated += page_blocks;
                changed.push(page);
            }
        }
    }
    Ok((changed, report))
}

fn map_stream<M: Migration + ?Sized>(
    stream: &mut StreamValue,
    target: &StreamFieldTarget,
    migration: &M,
    direction: Direction,
) -> Result<usize> {
    let mut count = 0;
    for child in stream
        .iter_mut()
        .filter(|c| c.block_type == target.block_type)
    {
        let value: Value = child.value.clone();
        let mapped = match direction {
            Direction::Forward => migration.forward(value),
            Direction::Backward => migration.backward(value),
        };
        child.value = mapped.with_context(|| {
            format!(
                "{} block {}",
                target.block_type,
                child.id.as_deref().unwrap_or("<no id>")
            )
        })?;
        count += 1;
    }
    Ok(count)
}
