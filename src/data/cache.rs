use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::loader::load_file;
use super::model::SalesTable;
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Single-entry table cache
// ---------------------------------------------------------------------------

/// Memoised loader for one source file.
///
/// The first [`get`](Self::get) reads the file; later calls hand out the same
/// `Arc` until [`invalidate`](Self::invalidate) or [`reload`](Self::reload).
/// Failed loads are not cached.
#[derive(Debug)]
pub struct SalesCache {
    path: PathBuf,
    table: Option<Arc<SalesTable>>,
    loads: usize,
}

impl SalesCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: None,
            loads: 0,
        }
    }

    /// Source file this cache reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached table, loading it on first use.
    pub fn get(&mut self) -> Result<Arc<SalesTable>, LoadError> {
        if let Some(table) = &self.table {
            return Ok(Arc::clone(table));
        }

        let started = Instant::now();
        let table = Arc::new(load_file(&self.path)?);
        self.loads += 1;
        log::info!(
            "sales table cached after {:.1?} (load #{})",
            started.elapsed(),
            self.loads
        );

        self.table = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Whether a table is currently cached.
    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    /// Number of times the source has been read.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    /// Drop the cached table; the next [`get`](Self::get) re-reads the source.
    pub fn invalidate(&mut self) {
        if self.table.take().is_some() {
            log::debug!("sales table cache invalidated");
        }
    }

    /// Re-read the source unconditionally.
    pub fn reload(&mut self) -> Result<Arc<SalesTable>, LoadError> {
        self.invalidate();
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file(rows: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Store,Dept,Date,Weekly_Sales").unwrap();
        write!(file, "{rows}").unwrap();
        file
    }

    #[test]
    fn test_get_is_memoised() {
        let file = csv_file("1,1,2024-01-01,100\n1,1,2024-01-08,150\n");
        let mut cache = SalesCache::new(file.path());

        let first = cache.get().unwrap();
        let second = cache.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
        assert_eq!(cache.load_count(), 1);
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let mut file = csv_file("1,1,2024-01-01,100\n");
        let mut cache = SalesCache::new(file.path());
        assert_eq!(cache.get().unwrap().len(), 1);

        writeln!(file, "1,1,2024-01-08,150").unwrap();
        file.flush().unwrap();
        // Still served from the cache.
        assert_eq!(cache.get().unwrap().len(), 1);

        assert_eq!(cache.reload().unwrap().len(), 2);
        assert_eq!(cache.load_count(), 2);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let mut cache = SalesCache::new("/nonexistent/train.csv");
        assert_eq!(cache.path(), Path::new("/nonexistent/train.csv"));
        assert!(cache.get().is_err());
        assert!(!cache.is_loaded());
        assert_eq!(cache.load_count(), 0);
    }
}
