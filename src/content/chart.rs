use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CHART_BLOCK: &str = "chart_block";
pub const DATE_PUBLISHED: &str = "date_published";
pub const LAST_UPDATED_PROJECTED_DATA: &str = "last_updated_projected_data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartType {
    #[serde(rename = "bar")]
    Bar,
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "line-index")]
    LineIndex,
    #[serde(rename = "tile_map")]
    TileMap,
}

/// The keys of a `chart_block` value the date updater decides on.
///
/// This is a read-only view: the stored dates are never parsed, and writes go
/// through [`set_date`] on the raw value so every other key is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChartBlock {
    pub chart_type: ChartType,
    pub data_source: String,
}

impl ChartBlock {
    pub fn from_value(value: &Value) -> Result<Self> {
        ChartBlock::deserialize(value).context("parsing chart_block value")
    }
}

/// Overwrite `key` on a block value with an ISO date.
///
/// An existing key keeps its position; a missing one is appended.
pub fn set_date(value: &mut Value, key: &str, date: NaiveDate) -> Result<()> {
    let block = value
        .as_object_mut()
        .context("chart_block value is not an object")?;
    block.insert(key.to_string(), Value::String(date.format("%Y-%m-%d").to_string()));
    Ok(())
}
