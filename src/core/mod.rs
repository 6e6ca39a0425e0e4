pub mod cancel;
pub mod error;
pub mod estimator;
pub mod ignore;
pub mod scanner;
pub mod search;
pub mod store;

use camino::Utf8Path;
use chrono::{DateTime, Datelike, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// One indexed file. `path` is the identity key of the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Base name, display case preserved.
    pub name: String,
    /// Absolute path. Only UTF-8 paths are indexed, so this is lossless.
    pub path: String,
    /// Lowercase extension with its leading dot, or empty.
    pub file_type: String,
    pub size: u64,
    /// Local modification time, truncated to whole seconds.
    pub modified_at: NaiveDateTime,
}

impl IndexEntry {
    /// Builds an entry from a path and the metadata already read for it.
    ///
    /// Returns `None` when the path is not valid UTF-8, or when the
    /// modification time is missing or outside years 1 to 9999.
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Option<Self> {
        let utf8_path = Utf8Path::from_path(path)?;
        let name = utf8_path.file_name()?.to_string();
        let modified_at = local_modified_time(metadata.modified().ok()?)?;

        Some(Self {
            file_type: file_type_of(path),
            name,
            path: utf8_path.as_str().to_string(),
            size: metadata.len(),
            modified_at,
        })
    }
}

/// Converts a file time to local wall-clock time in whole seconds.
///
/// Filesystems accept timestamps far outside what the store's date format
/// can hold; those yield `None`.
pub fn local_modified_time(modified: SystemTime) -> Option<NaiveDateTime> {
    let secs = match modified.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).ok()?,
        Err(before) => i64::try_from(before.duration().as_secs()).ok()?.checked_neg()?,
    };
    let utc = DateTime::<Utc>::from_timestamp(secs, 0)?;
    if !(1..=9999).contains(&utc.year()) {
        return None;
    }
    let local = utc.with_timezone(&Local).naive_local();
    (1..=9999).contains(&local.year()).then_some(local)
}

/// A progress update from a running indexing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexProgress {
    pub message: String,
    /// 0..=99 while the session runs, 100 only on completion.
    pub percentage: u8,
    pub processed_files: usize,
}

/// `"Report.PDF"` -> `".pdf"`, `"Makefile"` -> `""`.
pub fn file_type_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

pub use cancel::CancellationToken;
pub use error::CoreError;
pub use estimator::FileEstimator;
pub use ignore::IgnoreRules;
pub use scanner::{IndexScanner, IndexingSession, SessionOutcome, SessionState};
pub use search::SearchEngine;
pub use store::IndexStore;
