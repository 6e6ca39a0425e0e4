//! Filename lookups against the persisted index.

use super::{CoreError, IndexEntry, IndexStore};
use std::path::Path;

/// Answers substring queries from its own store connection.
///
/// Queries run synchronously on the caller's thread. They may overlap an
/// indexing session on another connection and see every batch committed so
/// far.
pub struct SearchEngine {
    store: IndexStore,
    max_results: usize,
}

impl SearchEngine {
    pub fn new(store: IndexStore, max_results: usize) -> Self {
        Self { store, max_results }
    }

    /// Opens a dedicated read handle on the store file at `path`.
    pub fn open(path: &Path, max_results: usize) -> Result<Self, CoreError> {
        Ok(Self::new(IndexStore::open(path)?, max_results))
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Entries whose name contains `fragment`, case-insensitively, sorted by
    /// name and capped at `max_results`.
    ///
    /// The caller trims input. An empty fragment is "no query": it returns no
    /// rows and does not touch the store.
    pub fn search(&self, fragment: &str) -> Result<Vec<IndexEntry>, CoreError> {
        if fragment.is_empty() {
            return Ok(Vec::new());
        }
        let results = self.store.query(fragment, self.max_results)?;
        tracing::debug!("Query {:?} returned {} rows", fragment, results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_RESULTS;
    use chrono::NaiveDate;

    fn entry(name: &str) -> IndexEntry {
        IndexEntry {
            name: name.to_string(),
            path: format!("/files/{name}"),
            file_type: super::super::file_type_of(Path::new(name)),
            size: 1,
            modified_at: NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn engine_with(names: &[&str]) -> SearchEngine {
        let mut store = IndexStore::open_in_memory().unwrap();
        let entries: Vec<_> = names.iter().map(|n| entry(n)).collect();
        store.upsert_batch(&entries).unwrap();
        SearchEngine::new(store, DEFAULT_MAX_RESULTS)
    }

    #[test]
    fn test_invoice_example() {
        let engine = engine_with(&["Invoice2023.pdf", "invoice_old.txt", "README.md"]);
        let names: Vec<_> = engine
            .search("invoice")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Invoice2023.pdf", "invoice_old.txt"]);
    }

    #[test]
    fn test_empty_fragment_returns_nothing() {
        let engine = engine_with(&["a.txt", "b.txt"]);
        assert!(engine.search("").unwrap().is_empty());
    }

    #[test]
    fn test_result_bound() {
        let names: Vec<String> = (0..250).map(|i| format!("report-{i}.csv")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let engine = engine_with(&refs);

        assert_eq!(engine.search("report").unwrap().len(), 100);
    }

    #[test]
    fn test_custom_bound() {
        let engine = {
            let mut store = IndexStore::open_in_memory().unwrap();
            store
                .upsert_batch(&[entry("x1"), entry("x2"), entry("x3")])
                .unwrap();
            SearchEngine::new(store, 2)
        };
        assert_eq!(engine.max_results(), 2);
        assert_eq!(engine.search("x").unwrap().len(), 2);
    }
}
