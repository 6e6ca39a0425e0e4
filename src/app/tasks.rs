use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::events::IndexEvent;
use super::proxy::EventProxy;

use crate::core::{
    CancellationToken, CoreError, IndexScanner, IndexStore, IndexingSession, SessionOutcome,
};
use crate::platform::RootProvider;

const WORKER_THREAD_NAME: &str = "locate-indexer";

/// Starts an indexing session on a dedicated thread.
///
/// The worker owns `store` for the session's lifetime. It forwards every
/// progress update to `proxy` and always finishes with exactly one terminal
/// event, including when the session panics.
pub fn spawn_indexing_worker<P: EventProxy>(
    scanner: IndexScanner,
    store: IndexStore,
    roots: Arc<dyn RootProvider>,
    token: CancellationToken,
    proxy: P,
) -> Result<JoinHandle<Result<SessionOutcome, CoreError>>, CoreError> {
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                let session = IndexingSession::new(roots.list_roots());
                run_session(&scanner, session, store, &token, &proxy)
            }));
            result.unwrap_or_else(|_| {
                tracing::error!("Indexing worker panicked");
                proxy.send_event(IndexEvent::Failed(CoreError::WorkerPanicked.to_string()));
                Err(CoreError::WorkerPanicked)
            })
        })
        .map_err(CoreError::WorkerSpawn)
}

/// Drives one session and reports its terminal event.
fn run_session<P: EventProxy>(
    scanner: &IndexScanner,
    mut session: IndexingSession,
    mut store: IndexStore,
    token: &CancellationToken,
    proxy: &P,
) -> Result<SessionOutcome, CoreError> {
    tracing::info!("Indexer worker started with roots {:?}", session.roots());

    let result = scanner.run(&mut session, &mut store, token, |progress| {
        proxy.send_event(IndexEvent::Progress(progress));
    });

    match &result {
        Ok(outcome) => proxy.send_event(IndexEvent::Finished(*outcome)),
        Err(e) => {
            tracing::error!("Indexing session failed: {}", e);
            proxy.send_event(IndexEvent::Failed(e.to_string()));
        }
    }
    result
}
