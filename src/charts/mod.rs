pub mod update;

pub use update::{plan_page, update_chart_blocks, UnresolvedChart, UpdateOptions, UpdateReport};
