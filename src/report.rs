//! Spreadsheet export of the sales ledger. The files are plain CSV with a
//! header row: one row per sale for the raw export, one row per book for the
//! summary export. Styling is left to whatever opens the file.

use std::path::Path;

use anyhow::{Context, Result};

use crate::db::Store;
use crate::models::format_money;

/// Column headers for the raw ledger export.
const SALES_HEADER: [&str; 5] = ["Title", "Sold At", "Quantity", "Unit Price", "Total"];
/// Column headers for the per-book summary export.
const SUMMARY_HEADER: [&str; 5] = ["Title", "Sales", "Units Sold", "Revenue", "Average Order"];

/// Write every ledger row to `path` as CSV, newest first, and return the
/// number of data rows written. An unwritable target surfaces as an I/O error
/// with the path in the message; nothing is written for an empty ledger
/// beyond the header.
pub fn export_sales(store: &Store, path: &Path) -> Result<usize> {
    let sales = store.fetch_sales()?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create export file {}", path.display()))?;
    writer
        .write_record(SALES_HEADER)
        .context("failed to write export header")?;

    for sale in &sales {
        writer
            .write_record([
                sale.book_title.clone(),
                sale.sold_at.clone(),
                sale.quantity.to_string(),
                format_money(sale.unit_price),
                format_money(sale.total),
            ])
            .context("failed to write sale row")?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush export file {}", path.display()))?;
    log::info!("exported {} sales to {}", sales.len(), path.display());

    Ok(sales.len())
}

/// Write the per-book aggregate to `path` as CSV and return the number of
/// data rows written.
pub fn export_summary(store: &Store, path: &Path) -> Result<usize> {
    let summaries = store.aggregate()?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create export file {}", path.display()))?;
    writer
        .write_record(SUMMARY_HEADER)
        .context("failed to write export header")?;

    for summary in &summaries {
        writer
            .write_record([
                summary.title.clone(),
                summary.sale_count.to_string(),
                summary.units_sold.to_string(),
                format_money(summary.revenue),
                format_money(summary.average_order),
            ])
            .context("failed to write summary row")?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush export file {}", path.display()))?;
    log::info!(
        "exported {} summary rows to {}",
        summaries.len(),
        path.display()
    );

    Ok(summaries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_book, store};

    #[test]
    fn exported_ledger_reimports_with_same_rows_and_totals() {
        let (tmp, mut store) = store();
        let dune = seed_book(&store, "Dune", 10.0, 10);
        let trial = seed_book(&store, "The Trial", 5.5, 10);
        store.sell(dune.id, 2).unwrap();
        store.sell(trial.id, 3).unwrap();
        store.sell(dune.id, 1).unwrap();

        let path = tmp.path().join("ledger.csv");
        let written = export_sales(&store, &path).unwrap();
        assert_eq!(written, 3);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let mut rows = 0usize;
        let mut total = 0.0f64;
        for record in reader.records() {
            let record = record.unwrap();
            rows += 1;
            total += record[4].parse::<f64>().unwrap();
        }

        let stats = store.ledger_stats().unwrap();
        assert_eq!(rows, stats.sale_count as usize);
        assert!((total - stats.revenue).abs() < 1e-6);
    }

    #[test]
    fn empty_ledger_exports_header_only() {
        let (tmp, store) = store();
        let path = tmp.path().join("empty.csv");

        assert_eq!(export_sales(&store, &path).unwrap(), 0);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(SALES_HEADER.to_vec())
        );
        assert_eq!(reader.records().count(), 0);
    }

    #[test]
    fn summary_export_matches_aggregate() {
        let (tmp, mut store) = store();
        let book = seed_book(&store, "Solaris", 8.0, 6);
        store.sell(book.id, 2).unwrap();
        store.sell(book.id, 1).unwrap();

        let path = tmp.path().join("summary.csv");
        assert_eq!(export_summary(&store, &path).unwrap(), 1);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "Solaris");
        assert_eq!(&record[1], "2");
        assert_eq!(&record[2], "3");
        assert_eq!(&record[3], "24.00");
        assert_eq!(&record[4], "12.00");
    }

    #[test]
    fn unwritable_target_surfaces_io_error() {
        let (tmp, store) = store();
        let path = tmp.path().join("no-such-dir").join("ledger.csv");

        let err = export_sales(&store, &path).expect_err("must fail");
        assert!(err.to_string().contains("failed to create export file"));
    }
}
