use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifier – a store or department key
// ---------------------------------------------------------------------------

/// A categorical key as found in the source table. Numeric keys are kept as
/// integers so they sort numerically (2 before 10).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Integer(i64),
    Text(String),
}

// -- Integers sort before text, then by natural order within each kind --

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Identifier::*;
        match (self, other) {
            (Integer(a), Integer(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (Integer(_), Text(_)) => std::cmp::Ordering::Less,
            (Text(_), Integer(_)) => std::cmp::Ordering::Greater,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Integer(i) => write!(f, "{i}"),
            Identifier::Text(s) => write!(f, "{s}"),
        }
    }
}

impl Identifier {
    /// Interpret a raw cell. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(i) => Identifier::Integer(i),
            Err(_) => Identifier::Text(raw.to_string()),
        }
    }
}

impl FromStr for Identifier {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Identifier::parse(s))
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Identifier::Integer(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::parse(value)
    }
}

// ---------------------------------------------------------------------------
// SalesRecord – one row of the source table
// ---------------------------------------------------------------------------

/// One week of sales for a (store, department) pair.
///
/// `weekly_sales` may be negative (returns, markdowns) and is never clamped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub store: Identifier,
    pub dept: Identifier,
    pub date: NaiveDate,
    pub weekly_sales: f64,
}

// ---------------------------------------------------------------------------
// SalesTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed identifier indices.
///
/// Rows keep their source order; duplicate (store, dept, date) rows are
/// kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesTable {
    /// All records (rows).
    pub records: Vec<SalesRecord>,
    /// Sorted unique store identifiers.
    pub stores: BTreeSet<Identifier>,
    /// Sorted unique department identifiers.
    pub depts: BTreeSet<Identifier>,
}

impl SalesTable {
    /// Build identifier indices from the loaded records.
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        let mut stores = BTreeSet::new();
        let mut depts = BTreeSet::new();

        for rec in &records {
            stores.insert(rec.store.clone());
            depts.insert(rec.dept.clone());
        }

        SalesTable {
            records,
            stores,
            depts,
        }
    }

    /// Sorted unique store identifiers, for a selection list.
    pub fn store_ids(&self) -> Vec<Identifier> {
        self.stores.iter().cloned().collect()
    }

    /// Sorted unique department identifiers, for a selection list.
    pub fn dept_ids(&self) -> Vec<Identifier> {
        self.depts.iter().cloned().collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FilteredSeries – one (store, dept) slice, date ascending
// ---------------------------------------------------------------------------

/// The rows of one (store, department) selection, sorted by date.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSeries {
    pub store: Identifier,
    pub dept: Identifier,
    pub records: Vec<SalesRecord>,
}

impl FilteredSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dates in row order (may repeat).
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    /// Sales values in row order.
    pub fn values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.weekly_sales).collect()
    }

    /// Sorted unique dates.
    pub fn distinct_dates(&self) -> Vec<NaiveDate> {
        let mut dates = self.dates();
        dates.dedup();
        dates
    }
}
