// src/snapshot/types.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One market's row in the monthly data snapshot.
///
/// Only the keys the chart updater needs are modelled; anything else in the
/// record (origination counts, year-over-year text, …) is ignored on load.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct MarketRecord {
    pub market_key: String,
    pub data_month: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inquiry_month: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tightness_month: Option<NaiveDate>,
}

/// Top-level shape of the snapshot JSON file.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Snapshot {
    pub date_published: NaiveDate,
    pub markets: Vec<MarketRecord>,
}
