use anyhow::Result;

use crate::db::Store;
use crate::models::{BookSummary, LedgerStats, Sale};

/// State for the ledger screen: the full sale history, newest first, with a
/// movable selection so long histories can be scrolled.
pub(crate) struct LedgerScreen {
    pub(crate) sales: Vec<Sale>,
    pub(crate) selected: usize,
}

impl LedgerScreen {
    pub(crate) fn load(store: &Store) -> Result<Self> {
        let sales = store.fetch_sales()?;
        Ok(Self { sales, selected: 0 })
    }

    pub(crate) fn move_selection(&mut self, delta: i64) {
        if self.sales.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.sales.len() as i64 - 1;
        let next = (self.selected as i64 + delta).clamp(0, last);
        self.selected = next as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.sales.len().saturating_sub(1);
    }
}

/// State for the stats screen: overall ledger totals plus the per-book
/// breakdown, both computed fresh when the screen opens.
pub(crate) struct StatsScreen {
    pub(crate) stats: LedgerStats,
    pub(crate) summaries: Vec<BookSummary>,
    pub(crate) selected: usize,
}

impl StatsScreen {
    pub(crate) fn load(store: &Store) -> Result<Self> {
        let stats = store.ledger_stats()?;
        let summaries = store.aggregate()?;
        Ok(Self {
            stats,
            summaries,
            selected: 0,
        })
    }

    pub(crate) fn move_selection(&mut self, delta: i64) {
        if self.summaries.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.summaries.len() as i64 - 1;
        let next = (self.selected as i64 + delta).clamp(0, last);
        self.selected = next as usize;
    }
}
