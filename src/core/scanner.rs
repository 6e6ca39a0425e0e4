//! The indexing walk: estimate, traverse, upsert in batches, report progress.

use super::{
    CancellationToken, CoreError, FileEstimator, IgnoreRules, IndexEntry, IndexProgress,
    IndexStore,
};
use crate::config::{AppConfig, EstimatorSettings, ScanSettings};
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Estimating,
    Walking,
    Completed,
    Cancelled,
}

/// How a session that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    Completed { processed_files: usize },
    Cancelled { processed_files: usize },
}

impl SessionOutcome {
    pub fn processed_files(&self) -> usize {
        match *self {
            Self::Completed { processed_files } | Self::Cancelled { processed_files } => {
                processed_files
            }
        }
    }
}

/// The bookkeeping for one indexing run.
#[derive(Debug, Clone)]
pub struct IndexingSession {
    roots: Vec<PathBuf>,
    state: SessionState,
    processed_files: usize,
    estimated_total_files: usize,
}

impl IndexingSession {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            state: SessionState::Idle,
            processed_files: 0,
            estimated_total_files: 0,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn processed_files(&self) -> usize {
        self.processed_files
    }

    pub fn estimated_total_files(&self) -> usize {
        self.estimated_total_files
    }

    /// Walk progress, capped at 99 until the session completes.
    pub fn percentage(&self) -> u8 {
        if self.state == SessionState::Completed {
            return 100;
        }
        progress_percentage(self.processed_files, self.estimated_total_files)
    }

    fn progress(&self, message: String) -> IndexProgress {
        IndexProgress {
            message,
            percentage: self.percentage(),
            processed_files: self.processed_files,
        }
    }
}

/// `min(99, processed / estimated * 100)`, or 0 without an estimate.
pub fn progress_percentage(processed: usize, estimated: usize) -> u8 {
    if estimated == 0 {
        return 0;
    }
    let pct = (processed as u128 * 100) / estimated as u128;
    pct.min(99) as u8
}

enum WalkStatus {
    Finished,
    Cancelled,
}

pub struct IndexScanner {
    batch_size: usize,
    follow_links: bool,
    rules: IgnoreRules,
    estimator: FileEstimator,
}

impl IndexScanner {
    pub fn new(scan: &ScanSettings, estimator: &EstimatorSettings) -> Self {
        let rules = IgnoreRules::from_settings(scan);
        Self {
            batch_size: scan.batch_size.max(1),
            follow_links: scan.follow_links,
            estimator: FileEstimator::new(estimator.clone(), rules.clone()),
            rules,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.scan, &config.estimator)
    }

    /// Runs `session` to completion or cancellation, writing into `store`.
    ///
    /// Progress goes to `progress_callback`; the final `100` update is sent
    /// only when every root was walked. Per-entry I/O failures are skipped.
    /// A failed batch commit aborts the run with [`CoreError::Store`].
    pub fn run<F>(
        &self,
        session: &mut IndexingSession,
        store: &mut IndexStore,
        token: &CancellationToken,
        mut progress_callback: F,
    ) -> Result<SessionOutcome, CoreError>
    where
        F: FnMut(IndexProgress),
    {
        tracing::info!("Indexing session started for {} root(s)", session.roots.len());

        session.state = SessionState::Estimating;
        progress_callback(session.progress("Estimating total files...".to_string()));
        session.estimated_total_files = self.estimator.estimate(&session.roots, token);

        if token.is_cancelled() {
            return Ok(Self::cancelled(session));
        }
        progress_callback(session.progress(format!(
            "Estimated approx. {} files to index",
            session.estimated_total_files
        )));

        session.state = SessionState::Walking;
        let mut batch = Vec::with_capacity(self.batch_size);
        let mut status = WalkStatus::Finished;
        let roots = session.roots.clone();

        for root in &roots {
            if token.is_cancelled() {
                status = WalkStatus::Cancelled;
                break;
            }
            progress_callback(session.progress(format!("Indexing {}...", root.display())));

            status = self.walk_root(
                root,
                session,
                store,
                token,
                &mut batch,
                &mut progress_callback,
            )?;
            if matches!(status, WalkStatus::Cancelled) {
                break;
            }
        }

        store.upsert_batch(&batch)?;

        match status {
            WalkStatus::Cancelled => Ok(Self::cancelled(session)),
            WalkStatus::Finished => {
                session.state = SessionState::Completed;
                tracing::info!(
                    "Indexing completed: {} files processed",
                    session.processed_files
                );
                progress_callback(session.progress(format!(
                    "Completed indexing {} files.",
                    session.processed_files
                )));
                Ok(SessionOutcome::Completed {
                    processed_files: session.processed_files,
                })
            }
        }
    }

    fn cancelled(session: &mut IndexingSession) -> SessionOutcome {
        session.state = SessionState::Cancelled;
        tracing::info!(
            "Indexing cancelled after {} files",
            session.processed_files
        );
        SessionOutcome::Cancelled {
            processed_files: session.processed_files,
        }
    }

    fn walk_root<F>(
        &self,
        root: &Path,
        session: &mut IndexingSession,
        store: &mut IndexStore,
        token: &CancellationToken,
        batch: &mut Vec<IndexEntry>,
        progress_callback: &mut F,
    ) -> Result<WalkStatus, CoreError>
    where
        F: FnMut(IndexProgress),
    {
        let rules = &self.rules;
        let walker = WalkDir::new(root)
            .follow_links(self.follow_links)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !rules.is_hidden_dir(&e.file_name().to_string_lossy())
            });

        for result in walker {
            if token.is_cancelled() {
                return Ok(WalkStatus::Cancelled);
            }

            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            if rules.is_hidden_file(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let Some(metadata) = Self::read_metadata(&entry) else {
                continue;
            };
            if metadata.is_dir() {
                continue;
            }
            let Some(index_entry) = IndexEntry::from_metadata(entry.path(), &metadata) else {
                tracing::trace!(
                    "Skipping {:?}: non-UTF-8 path or unusable modification time",
                    entry.path()
                );
                continue;
            };

            batch.push(index_entry);
            session.processed_files += 1;

            if batch.len() >= self.batch_size {
                store.upsert_batch(batch)?;
                batch.clear();
                let pct = session.percentage();
                progress_callback(session.progress(format!(
                    "Indexed {} files ({}% complete)...",
                    session.processed_files, pct
                )));
            }
        }

        Ok(WalkStatus::Finished)
    }

    /// Symlinks are resolved so a link to a file is indexed with the
    /// target's size and time; dangling links yield `None`.
    fn read_metadata(entry: &DirEntry) -> Option<Metadata> {
        let result = if entry.path_is_symlink() {
            std::fs::metadata(entry.path())
        } else {
            entry.metadata().map_err(std::io::Error::from)
        };
        match result {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::debug!("Skipping {:?}: {}", entry.path(), e);
                None
            }
        }
    }
}
