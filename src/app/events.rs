//! Defines the events an indexing session sends to whoever started it.

use crate::core::{IndexProgress, SessionOutcome};
use tokio::sync::mpsc;

/// One message on a session's event stream.
///
/// Every stream carries zero or more `Progress` events followed by exactly
/// one terminal event, `Finished` or `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexEvent {
    /// A periodic update while the session is running.
    Progress(IndexProgress),
    /// The session ended normally, either completed or cancelled.
    Finished(SessionOutcome),
    /// The session hit a store error and stopped.
    Failed(String),
}

impl IndexEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// The receiving half handed back by `IndexCoordinator::start`.
pub type IndexEventStream = mpsc::UnboundedReceiver<IndexEvent>;
