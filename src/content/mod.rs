//! Stored CMS pages and the store abstraction the batch tools run against.

pub mod chart;
pub mod history;
pub mod memory;
pub mod store;
pub mod types;

pub use chart::{
    set_date, ChartBlock, ChartType, CHART_BLOCK, DATE_PUBLISHED, LAST_UPDATED_PROJECTED_DATA,
};
pub use history::{AppliedMigration, MigrationHistory};
pub use memory::MemoryPageStore;
pub use store::{JsonPageStore, PageStore};
pub use types::{Page, Revision, StreamChild, StreamFields, StreamValue};
