//! Defines an abstraction over the event sending mechanism.

use super::events::IndexEvent;
use tokio::sync::mpsc::UnboundedSender;

/// A trait that abstracts the sending of index events.
/// This is "fire-and-forget" and doesn't return a result, simplifying its use.
pub trait EventProxy: Send + Sync + Clone + 'static {
    fn send_event(&self, event: IndexEvent);
}

/// Implement the trait for the channel behind an `IndexEventStream`.
impl EventProxy for UnboundedSender<IndexEvent> {
    fn send_event(&self, event: IndexEvent) {
        // A dropped receiver only means nobody is listening any more; the
        // session keeps running and still writes to the store.
        if let Err(e) = self.send(event) {
            tracing::trace!("Index event dropped, receiver gone: {:?}", e.0);
        }
    }
}
