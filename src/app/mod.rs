//! Session lifecycle around the core: who may start indexing, where its
//! events go, and how a front end reaches the query engine.

pub mod events;
pub mod proxy;
pub mod state;
pub mod tasks;

pub use events::{IndexEvent, IndexEventStream};
pub use proxy::EventProxy;
pub use state::{IndexCoordinator, StartPolicy};
