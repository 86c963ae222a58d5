use anyhow::Result;
use chrono::Utc;

use super::history::AppliedMigration;
use super::store::PageStore;
use super::types::Page;

/// Vector-backed store for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    pages: Vec<Page>,
    migrations: Vec<AppliedMigration>,
    /// Page ids in the order `publish` was called.
    pub published: Vec<u64>,
}

impl MemoryPageStore {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, id: u64) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    fn upsert(&mut self, page: &Page) {
        match self.pages.iter_mut().find(|p| p.id == page.id) {
            Some(existing) => *existing = page.clone(),
            None => self.pages.push(page.clone()),
        }
    }
}

impl PageStore for MemoryPageStore {
    fn pages_of_type(&self, page_type: &str) -> Result<Vec<Page>> {
        let mut pages: Vec<Page> = self
            .pages
            .iter()
            .filter(|p| p.page_type == page_type)
            .cloned()
            .collect();
        pages.sort_by_key(|p| p.id);
        Ok(pages)
    }

    fn publish(&mut self, page: &mut Page) -> Result<()> {
        page.publish_at(Utc::now());
        self.upsert(page);
        self.published.push(page.id);
        Ok(())
    }

    fn save_all(&mut self, pages: &[Page]) -> Result<()> {
        for page in pages {
            self.upsert(page);
        }
        Ok(())
    }

    fn applied_migrations(&self) -> Result<Vec<AppliedMigration>> {
        Ok(self.migrations.clone())
    }

    fn record_migration(&mut self, name: &str) -> Result<()> {
        if !self.migrations.iter().any(|m| m.name == name) {
            self.migrations.push(AppliedMigration {
                name: name.to_string(),
                applied_at: Utc::now(),
            });
        }
        Ok(())
    }

    fn forget_migration(&mut self, name: &str) -> Result<()> {
        self.migrations.retain(|m| m.name != name);
        Ok(())
    }
}
