//! Forward-only data migrations over stored stream fields.

pub mod bureau;
pub mod runner;

pub use bureau::{migrate_bureau_structure, BureauStructureMultipleLeads};
pub use runner::{run_backward, run_forward, MigrationReport};

use serde_json::Value;
use thiserror::Error;

/// Which blocks a migration rewrites: every `block_type` child of the
/// `field` stream on pages of `page_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFieldTarget {
    pub page_type: &'static str,
    pub field: &'static str,
    pub block_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("migration `{0}` cannot be reversed")]
    Irreversible(String),
    #[error("migration `{0}` has already been applied")]
    AlreadyApplied(String),
    #[error("migration `{0}` has not been applied")]
    NotApplied(String),
    #[error("unknown migration `{0}`")]
    Unknown(String),
    #[error("malformed {block} at `{path}`: {reason}")]
    Structure {
        block: String,
        path: String,
        reason: String,
    },
}

pub trait Migration {
    fn name(&self) -> &str;

    fn targets(&self) -> &[StreamFieldTarget];

    /// Map one stored block value to its new shape.
    fn forward(&self, value: Value) -> Result<Value, MigrationError>;

    /// Migrations are one-way unless they say otherwise.
    fn reversible(&self) -> bool {
        false
    }

    fn backward(&self, _value: Value) -> Result<Value, MigrationError> {
        Err(MigrationError::Irreversible(self.name().to_string()))
    }
}

/// Every migration this crate knows about, oldest first.
pub fn registry() -> Vec<Box<dyn Migration>> {
    vec![Box::new(BureauStructureMultipleLeads)]
}

pub fn find(name: &str) -> Result<Box<dyn Migration>, MigrationError> {
    registry()
        .into_iter()
        .find(|m| m.name() == name)
        .ok_or_else(|| MigrationError::Unknown(name.to_string()))
}
