use super::model::{FilteredSeries, Identifier, SalesTable};

// ---------------------------------------------------------------------------
// (store, dept) selection
// ---------------------------------------------------------------------------

/// Return the rows of `table` whose store and department both equal the
/// selection, ordered by date ascending.
///
/// The sort is stable, so rows sharing a date keep their source order.
/// An unknown store or department simply yields an empty series.
pub fn filter_series(table: &SalesTable, store: &Identifier, dept: &Identifier) -> FilteredSeries {
    let mut records: Vec<_> = table
        .records
        .iter()
        .filter(|rec| rec.store == *store && rec.dept == *dept)
        .cloned()
        .collect();
    records.sort_by_key(|rec| rec.date);

    log::debug!(
        "store {store} / dept {dept}: {} of {} rows selected",
        records.len(),
        table.len()
    );

    FilteredSeries {
        store: store.clone(),
        dept: dept.clone(),
        records,
    }
}
