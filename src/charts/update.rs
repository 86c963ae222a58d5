//! Monthly refresh of the dates shown under consumer-credit-trends charts.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::content::{
    set_date, ChartBlock, ChartType, Page, PageStore, CHART_BLOCK, DATE_PUBLISHED,
    LAST_UPDATED_PROJECTED_DATA,
};
use crate::snapshot::{resolve_projected_month, Snapshot, Unresolved};

pub const DEFAULT_PAGE_TYPE: &str = "BrowsePage";
pub const CONTENT_FIELD: &str = "content";

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub page_type: String,
    /// Plan and report without publishing anything.
    pub dry_run: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            page_type: DEFAULT_PAGE_TYPE.to_string(),
            dry_run: false,
        }
    }
}

/// A line-index chart whose projected-data month was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedChart {
    pub page_id: u64,
    pub block_id: Option<String>,
    pub data_source: String,
    pub reason: Unresolved,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub pages_scanned: usize,
    pub pages_published: usize,
    pub charts_updated: usize,
    pub unresolved: Vec<UnresolvedChart>,
}

/// Rewrite the chart dates of one page in memory.
///
/// Returns the number of chart blocks touched; `0` means the page has no
/// chart blocks and must not be published.
pub fn plan_page(
    page: &mut Page,
    snapshot: &Snapshot,
    latest_data_month: NaiveDate,
    unresolved: &mut Vec<UnresolvedChart>,
) -> Result<usize> {
    let page_id = page.id;
    let Some(stream) = page.stream_mut(CONTENT_FIELD) else {
        return Ok(0);
    };

    let mut touched = 0;
    for child in stream.iter_mut().filter(|c| c.block_type == CHART_BLOCK) {
        let block_id = child.id.as_deref().unwrap_or("<no id>").to_string();
        let context = || format!("page {} chart block {}", page_id, block_id);
        let chart = ChartBlock::from_value(&child.value).with_context(context)?;

        set_date(&mut child.value, DATE_PUBLISHED, snapshot.date_published)
            .with_context(context)?;
        let projected = if chart.chart_type == ChartType::LineIndex {
            match resolve_projected_month(&snapshot.markets, &chart.data_source) {
                Ok(resolved) => {
                    debug!(
                        page_id,
                        data_source = %chart.data_source,
                        market = %resolved.market_key,
                        feed = %resolved.feed,
                        month = %resolved.month,
                        "resolved line-index month"
                    );
                    Some(resolved.month)
                }
                Err(reason) => {
                    warn!(
                        page_id,
                        data_source = %chart.data_source,
                        %reason,
                        "leaving projected data month unchanged"
                    );
                    unresolved.push(UnresolvedChart {
                        page_id,
                        block_id: child.id.clone(),
                        data_source: chart.data_source,
                        reason,
                    });
                    None
                }
            }
        } else {
            Some(latest_data_month)
        };

        if let Some(month) = projected {
            set_date(&mut child.value, LAST_UPDATED_PROJECTED_DATA, month)
                .with_context(context)?;
        }
        touched += 1;
    }
    Ok(touched)
}

/// Apply `snapshot` to every chart block on every page of the configured type.
///
/// All pages are planned before the first publish, so a malformed chart block
/// aborts the run with nothing written. Publishing itself is per page; a
/// failure part-way leaves earlier pages published.
pub fn update_chart_blocks<S: PageStore>(
    store: &mut S,
    snapshot: &Snapshot,
    options: &UpdateOptions,
) -> Result<UpdateReport> {
    let latest_data_month = snapshot
        .latest_data_month()
        .context("snapshot contains no markets")?;
    info!(
        date_published = %snapshot.date_published,
        %latest_data_month,
        markets = snapshot.markets.len(),
        "applying snapshot"
    );

    let pages = store
        .pages_of_type(&options.page_type)
        .with_context(|| format!("loading {} pages", options.page_type))?;

    let mut report = UpdateReport {
        pages_scanned: pages.len(),
        ..Default::default()
    };

    let mut planned = Vec::new();
    for mut page in pages {
        let touched = plan_page(&mut page, snapshot, latest_data_month, &mut report.unresolved)?;
        if touched == 0 {
            continue;
        }
        report.charts_updated += touched;
        planned.push(page);
    }

    if options.dry_run {
        info!(pages = planned.len(), "dry run; nothing published");
        return Ok(report);
    }

    for mut page in planned {
        store
            .publish(&mut page)
            .with_context(|| format!("publishing page {} ({})", page.id, page.title))?;
        info!(page_id = page.id, title = %page.title, "published");
        report.pages_published += 1;
    }

    Ok(report)
}
