//! SQLite persistence for the filename index.
//!
//! One table, `files`, keyed uniquely by `path`. The file is opened in WAL
//! mode so the indexing worker and any number of query handles can use
//! separate connections at the same time. Writers commit in batches; readers
//! see whole batches or nothing of them.

use super::{CoreError, IndexEntry};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Statement};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Format of the `modified_date` column, local time.
pub const MODIFIED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS files (
        id            INTEGER PRIMARY KEY,
        name          TEXT    NOT NULL,
        path          TEXT    NOT NULL,
        type          TEXT    NOT NULL DEFAULT '',
        size          INTEGER NOT NULL DEFAULT 0,
        modified_date TEXT    NOT NULL,
        UNIQUE(path)
    );

    CREATE INDEX IF NOT EXISTS idx_files_name ON files (name);
";

const UPSERT_SQL: &str = "
    INSERT INTO files (name, path, type, size, modified_date)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(path) DO UPDATE SET
        name = excluded.name,
        type = excluded.type,
        size = excluded.size,
        modified_date = excluded.modified_date
";

const SELECT_COLUMNS: &str = "SELECT name, path, type, size, modified_date FROM files";

/// A handle to the index database. Each handle owns one connection.
pub struct IndexStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl IndexStore {
    /// Opens (creating if needed) the store file and ensures the schema.
    ///
    /// Every failure here is reported as [`CoreError::StoreOpen`], except a
    /// failure to create the parent directory, which is [`CoreError::Io`].
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::Io(e, parent.to_path_buf()))?;
                tracing::info!("Created index directory: {:?}", parent);
            }
        }

        let open_err = |source| CoreError::StoreOpen {
            path: path.to_path_buf(),
            source,
        };

        let conn = Connection::open(path).map_err(open_err)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(open_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(open_err)?;

        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.ensure_schema().map_err(|e| match e {
            CoreError::Store(source) => open_err(source),
            other => other,
        })?;

        tracing::debug!("Opened index store at {:?}", path);
        Ok(store)
    }

    /// A private, throwaway store. Mostly useful in tests.
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let open_err = |source| CoreError::StoreOpen {
            path: PathBuf::from(":memory:"),
            source,
        };
        let conn = Connection::open_in_memory().map_err(open_err)?;
        let store = Self { conn, path: None };
        store.ensure_schema()?;
        Ok(store)
    }

    /// The backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Idempotently creates the `files` table and its name index.
    pub fn ensure_schema(&self) -> Result<(), CoreError> {
        self.conn.execute_batch(CREATE_SCHEMA_SQL)?;
        Ok(())
    }

    /// Inserts or replaces a single row in its own implicit transaction.
    pub fn upsert(&self, entry: &IndexEntry) -> Result<(), CoreError> {
        let mut stmt = self.conn.prepare_cached(UPSERT_SQL)?;
        execute_upsert(&mut stmt, entry)?;
        Ok(())
    }

    /// Upserts all `entries` inside one transaction.
    pub fn upsert_batch(&mut self, entries: &[IndexEntry]) -> Result<(), CoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for entry in entries {
                execute_upsert(&mut stmt, entry)?;
            }
        }
        tx.commit()?;
        tracing::debug!("Committed batch of {} entries", entries.len());
        Ok(())
    }

    /// Rows whose `name` contains `fragment`, ASCII case-insensitively,
    /// ordered by `name` and truncated to `limit`.
    ///
    /// `%`, `_` and `\` in `fragment` match literally.
    pub fn query(&self, fragment: &str, limit: usize) -> Result<Vec<IndexEntry>, CoreError> {
        let pattern = format!("%{}%", escape_like_pattern(fragment));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare_cached(&format!(
            "{SELECT_COLUMNS}
             WHERE name LIKE ?1 ESCAPE '\\'
             ORDER BY name, id
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![pattern, limit], row_to_entry)?;
        let entries = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn get_by_path(&self, path: &str) -> Result<Option<IndexEntry>, CoreError> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{SELECT_COLUMNS} WHERE path = ?1"))?;
        Ok(stmt.query_row(params![path], row_to_entry).optional()?)
    }

    pub fn count(&self) -> Result<u64, CoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

fn execute_upsert(stmt: &mut Statement<'_>, entry: &IndexEntry) -> rusqlite::Result<usize> {
    stmt.execute(params![
        entry.name,
        entry.path,
        entry.file_type,
        i64::try_from(entry.size).unwrap_or(i64::MAX),
        entry.modified_at.format(MODIFIED_DATE_FORMAT).to_string(),
    ])
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<IndexEntry> {
    let size: i64 = row.get(3)?;
    let modified: String = row.get(4)?;
    let modified_at = NaiveDateTime::parse_from_str(&modified, MODIFIED_DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(IndexEntry {
        name: row.get(0)?,
        path: row.get(1)?,
        file_type: row.get(2)?,
        size: size.max(0) as u64,
        modified_at,
    })
}

/// Escapes SQL `LIKE` metacharacters so the fragment matches literally.
fn escape_like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(name: &str, dir: &str) -> IndexEntry {
        let path = format!("{dir}/{name}");
        IndexEntry {
            name: name.to_string(),
            file_type: super::super::file_type_of(Path::new(&path)),
            path,
            size: 42,
            modified_at: NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(14, 5, 30)
                .unwrap(),
        }
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let store = IndexStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_upsert_overwrites_by_path() {
        let store = IndexStore::open_in_memory().unwrap();
        let mut e = entry("a.txt", "/data");
        store.upsert(&e).unwrap();

        e.size = 99;
        store.upsert(&e).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let stored = store.get_by_path("/data/a.txt").unwrap().unwrap();
        assert_eq!(stored.size, 99);
        assert_eq!(stored, e);
    }

    #[test]
    fn test_same_name_different_paths_are_distinct_rows() {
        let mut store = IndexStore::open_in_memory().unwrap();
        store
            .upsert_batch(&[entry("a.txt", "/one"), entry("a.txt", "/two")])
            .unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_query_is_case_insensitive_and_ordered_by_name() {
        let mut store = IndexStore::open_in_memory().unwrap();
        store
            .upsert_batch(&[
                entry("invoice_old.txt", "/docs"),
                entry("README.md", "/docs"),
                entry("Invoice2023.pdf", "/docs"),
            ])
            .unwrap();

        let names: Vec<_> = store
            .query("invoice", 100)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Invoice2023.pdf", "invoice_old.txt"]);
    }

    #[test]
    fn test_query_matches_name_not_path() {
        let store = IndexStore::open_in_memory().unwrap();
        store.upsert(&entry("notes.txt", "/invoices")).unwrap();
        assert!(store.query("invoice", 100).unwrap().is_empty());
    }

    #[test]
    fn test_query_treats_like_wildcards_literally() {
        let mut store = IndexStore::open_in_memory().unwrap();
        store
            .upsert_batch(&[entry("a_b.txt", "/x"), entry("axb.txt", "/x"), entry("100%.txt", "/x")])
            .unwrap();

        let underscore = store.query("a_b", 100).unwrap();
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].name, "a_b.txt");

        let percent = store.query("%", 100).unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].name, "100%.txt");
    }

    #[test]
    fn test_query_respects_limit() {
        let mut store = IndexStore::open_in_memory().unwrap();
        let batch: Vec<_> = (0..250)
            .map(|i| entry(&format!("match_{i:03}.log"), "/logs"))
            .collect();
        store.upsert_batch(&batch).unwrap();

        let rows = store.query("match", 100).unwrap();
        assert_eq!(rows.len(), 100);
        assert_eq!(rows[0].name, "match_000.log");
        assert_eq!(rows[99].name, "match_099.log");
    }

    #[test]
    fn test_modified_date_round_trips_at_second_resolution() {
        let store = IndexStore::open_in_memory().unwrap();
        let e = entry("clock.txt", "/t");
        store.upsert(&e).unwrap();
        let stored = store.get_by_path("/t/clock.txt").unwrap().unwrap();
        assert_eq!(
            stored.modified_at.format(MODIFIED_DATE_FORMAT).to_string(),
            "2024-03-09 14:05:30"
        );
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("search_index.db");
        let store = IndexStore::open(&db_path).unwrap();
        assert!(db_path.exists());
        assert_eq!(store.path(), Some(db_path.as_path()));
    }

    #[test]
    fn test_open_on_directory_is_a_store_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = IndexStore::open(dir.path());
        assert!(matches!(result, Err(CoreError::StoreOpen { .. })));
    }

    #[test]
    fn test_second_connection_sees_committed_batches() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("index.db");
        let mut writer = IndexStore::open(&db_path).unwrap();
        let reader = IndexStore::open(&db_path).unwrap();

        writer.upsert_batch(&[entry("shared.txt", "/s")]).unwrap();
        assert_eq!(reader.query("shared", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_reader_sees_only_committed_rows_while_batch_is_open() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("index.db");
        let mut writer = IndexStore::open(&db_path).unwrap();
        writer.upsert_batch(&[entry("first.txt", "/w")]).unwrap();

        let tx = writer.conn.transaction().unwrap();
        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL).unwrap();
            execute_upsert(&mut stmt, &entry("second.txt", "/w")).unwrap();
        }

        let reader = IndexStore::open(&db_path).unwrap();
        assert_eq!(reader.count().unwrap(), 1);
        let visible = reader.query(".txt", 10).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "first.txt");

        tx.commit().unwrap();
        assert_eq!(reader.count().unwrap(), 2);
        assert_eq!(reader.query("second", 10).unwrap().len(), 1);
    }
}
