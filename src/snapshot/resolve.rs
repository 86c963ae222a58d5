//! Pick the "last updated" month for line-index charts.
//!
//! Line-index charts plot either the inquiry index (`inq_…` files) or the
//! credit tightness index (`crt_…` files) for a single market. Their projected
//! data month comes from that market's `inquiry_month` / `tightness_month`
//! rather than from the snapshot-wide `data_month`.

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

use super::MarketRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Inquiry,
    Tightness,
}

impl Feed {
    /// Classify a data source by its prefix. `inq_` is checked first.
    pub fn detect(data_source: &str) -> Option<Self> {
        if data_source.contains("inq_") {
            Some(Feed::Inquiry)
        } else if data_source.contains("crt_") {
            Some(Feed::Tightness)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Feed::Inquiry => "inquiry",
            Feed::Tightness => "tightness",
        }
    }

    fn month(&self, market: &MarketRecord) -> Option<NaiveDate> {
        match self {
            Feed::Inquiry => market.inquiry_month,
            Feed::Tightness => market.tightness_month,
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMonth {
    pub market_key: String,
    pub feed: Feed,
    pub month: NaiveDate,
}

/// Why a data source could not be tied to exactly one market month.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unresolved {
    #[error("`{0}` is neither an inquiry (inq_) nor a credit tightness (crt_) data source")]
    UnknownFeed(String),
    #[error("no market key occurs in `{0}`")]
    NoMarket(String),
    #[error("`{data_source}` matches more than one market: {}", keys.join(", "))]
    Ambiguous {
        data_source: String,
        keys: Vec<String>,
    },
    #[error("market `{market_key}` has no {feed} month in the snapshot")]
    MissingMonth { market_key: String, feed: Feed },
}

/// Resolve the projected-data month for a line-index chart.
///
/// A market matches when its key occurs anywhere in `data_source`. Several
/// distinct matching keys are reported as ambiguous instead of picking
/// whichever market happens to come first.
pub fn resolve_projected_month(
    markets: &[MarketRecord],
    data_source: &str,
) -> Result<ResolvedMonth, Unresolved> {
    let feed = Feed::detect(data_source)
        .ok_or_else(|| Unresolved::UnknownFeed(data_source.to_string()))?;

    let mut matched: Vec<&MarketRecord> = Vec::new();
    for market in markets {
        if market.market_key.is_empty()
            || matched.iter().any(|m| m.market_key == market.market_key)
        {
            continue;
        }
        if data_source.contains(market.market_key.as_str()) {
            matched.push(market);
        }
    }

    match matched.as_slice() {
        [] => Err(Unresolved::NoMarket(data_source.to_string())),
        [market] => {
            let month = feed.month(market).ok_or_else(|| Unresolved::MissingMonth {
                market_key: market.market_key.clone(),
                feed,
            })?;
            Ok(ResolvedMonth {
                market_key: market.market_key.clone(),
                feed,
                month,
            })
        }
        many => Err(Unresolved::Ambiguous {
            data_source: data_source.to_string(),
            keys: many.iter().map(|m| m.market_key.clone()).collect(),
        }),
    }
}
