//! Owns the single active indexing session and the store location.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use tokio::sync::mpsc;

use super::events::IndexEventStream;
use super::tasks::spawn_indexing_worker;
use crate::config::AppConfig;
use crate::core::{
    CancellationToken, CoreError, IndexScanner, IndexStore, SearchEngine, SessionOutcome,
};
use crate::platform::{FixedRoots, RootProvider};

/// What `start` does when a session is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPolicy {
    /// Fail with [`CoreError::AlreadyRunning`].
    Reject,
    /// Cancel the running session, wait for it to unwind, then start.
    Supersede,
}

struct ActiveSession {
    token: CancellationToken,
    handle: JoinHandle<Result<SessionOutcome, CoreError>>,
}

impl ActiveSession {
    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    fn join(self) -> Result<SessionOutcome, CoreError> {
        self.handle
            .join()
            .unwrap_or_else(|_| Err(CoreError::WorkerPanicked))
    }
}

/// Decides whether indexing may start and keeps at most one session alive.
///
/// Queries do not go through the coordinator's lock: each
/// [`SearchEngine`] holds its own connection to the same store file.
pub struct IndexCoordinator {
    db_path: PathBuf,
    roots: Arc<dyn RootProvider>,
    config: AppConfig,
    active: Mutex<Option<ActiveSession>>,
}

impl IndexCoordinator {
    pub fn new(db_path: PathBuf, roots: Arc<dyn RootProvider>, config: AppConfig) -> Self {
        Self {
            db_path,
            roots,
            config,
            active: Mutex::new(None),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// `true` until the first session has created the store file. Callers
    /// use it to hold back query input until that session finishes.
    pub fn needs_initial_index(&self) -> bool {
        !self.db_path.exists()
    }

    /// Starts a session over the injected root provider's roots.
    pub fn start(&self, policy: StartPolicy) -> Result<IndexEventStream, CoreError> {
        self.start_session(self.roots.clone(), policy)
    }

    /// Starts a session over an explicit set of roots.
    pub fn start_with_roots(
        &self,
        roots: Vec<PathBuf>,
        policy: StartPolicy,
    ) -> Result<IndexEventStream, CoreError> {
        self.start_session(Arc::new(FixedRoots(roots)), policy)
    }

    fn start_session(
        &self,
        roots: Arc<dyn RootProvider>,
        policy: StartPolicy,
    ) -> Result<IndexEventStream, CoreError> {
        let mut active = self.lock_active();

        if let Some(previous) = active.take() {
            if previous.is_running() {
                if policy == StartPolicy::Reject {
                    *active = Some(previous);
                    return Err(CoreError::AlreadyRunning);
                }
                tracing::info!("Superseding running indexing session");
                previous.token.cancel();
            }
            match previous.join() {
                Ok(outcome) => tracing::debug!("Previous session ended: {:?}", outcome),
                Err(e) => tracing::warn!("Previous session ended with error: {}", e),
            }
        }

        let store = IndexStore::open(&self.db_path)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let handle = spawn_indexing_worker(
            IndexScanner::from_config(&self.config),
            store,
            roots,
            token.clone(),
            tx,
        )?;

        *active = Some(ActiveSession { token, handle });
        Ok(rx)
    }

    /// Requests cancellation of the running session. Returns whether one was
    /// running. Does not wait; see [`IndexCoordinator::wait`].
    pub fn stop(&self) -> bool {
        match self.lock_active().as_ref() {
            Some(session) if session.is_running() => {
                tracing::info!("Stop requested for running indexing session");
                session.token.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_active()
            .as_ref()
            .is_some_and(ActiveSession::is_running)
    }

    /// Blocks until the most recent session's worker exits and returns its
    /// result. `None` if no session was started since the last `wait`.
    pub fn wait(&self) -> Option<Result<SessionOutcome, CoreError>> {
        let session = self.lock_active().take()?;
        Some(session.join())
    }

    /// Opens a query engine on this coordinator's store.
    pub fn search_engine(&self) -> Result<SearchEngine, CoreError> {
        SearchEngine::open(&self.db_path, self.config.max_results)
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for IndexCoordinator {
    fn drop(&mut self) {
        if let Some(session) = self.lock_active().take() {
            session.token.cancel();
            if let Err(e) = session.join() {
                tracing::warn!("Indexing session ended with error during shutdown: {}", e);
            }
        }
    }
}
