use anyhow::{Context, Result};
use locate_index::app::{IndexCoordinator, IndexEvent, StartPolicy};
use locate_index::config::AppConfig;
use locate_index::platform::{FixedRoots, RootProvider, SystemRoots};
use std::sync::Arc;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config ({}), using defaults", e);
        AppConfig::default()
    });
    let db_path = config
        .resolved_database_path()
        .context("Could not determine a location for the index store")?;

    let roots: Arc<dyn RootProvider> = if config.roots.is_empty() {
        Arc::new(SystemRoots)
    } else {
        Arc::new(FixedRoots(config.roots.clone()))
    };

    let coordinator = IndexCoordinator::new(db_path, roots, config);
    if coordinator.needs_initial_index() {
        tracing::info!("No index found at {:?}, building it first", coordinator.db_path());
    }

    let mut events = coordinator
        .start(StartPolicy::Reject)
        .context("Failed to start indexing")?;
    while let Some(event) = events.blocking_recv() {
        match event {
            IndexEvent::Progress(progress) => {
                tracing::info!("[{:>3}%] {}", progress.percentage, progress.message);
            }
            IndexEvent::Finished(outcome) => {
                tracing::info!("Indexing finished: {:?}", outcome);
            }
            IndexEvent::Failed(message) => {
                tracing::error!("Indexing failed: {}", message);
            }
        }
    }
    if let Some(result) = coordinator.wait() {
        result.context("Indexing session failed")?;
    }

    let engine = coordinator
        .search_engine()
        .context("Failed to open the index for querying")?;
    for fragment in std::env::args().skip(1) {
        let fragment = fragment.trim();
        for entry in engine.search(fragment)? {
            println!("{}\t{}", entry.name, entry.path);
        }
    }

    Ok(())
}
