//! The feed pagination engine.
//!
//! - [`item`] - feed items and their authors
//! - [`window`] - the time window each fetch asks for
//! - [`state`] - the synchronized list every page is merged into
//! - [`coordinator`] - runs at most one fetch at a time and applies results
//! - [`events`] - FIFO notifications to the single display consumer
//!
//! # Example
//!
//! ```ignore
//! let (coordinator, events) = FetchCoordinator::new(source, CoordinatorOptions::default())?;
//! coordinator.trigger(FetchMode::Initial)?;
//!
//! // On the consumer task:
//! events.run(&mut display_list).await;
//! ```

mod coordinator;
mod events;
mod item;
mod state;
mod window;

pub use coordinator::{CoordinatorOptions, FetchCoordinator, FetchStatus, TriggerOutcome};
pub use events::{DisplayConsumer, FeedEvent, FeedEvents};
pub use item::{Author, FeedItem};
pub use state::FeedState;
pub use window::{FetchMode, FetchWindow, DEFAULT_WINDOW_SPAN};

use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Contract violations by the caller of the engine.
///
/// Unlike fetch failures these are returned immediately and never swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The operation needs a loaded feed (or an idle coordinator) and there is none.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// `reset` was called while a fetch is still in flight.
    #[error("Cannot reset the feed while a fetch is in progress")]
    ConcurrentReset,

    /// A fetch window must span at least one second.
    #[error("Invalid fetch window span: {0:?} (must be at least 1s)")]
    InvalidWindowSpan(Duration),

    /// The coordinator was created outside a Tokio runtime.
    #[error("No Tokio runtime available to run background fetches")]
    NoRuntime,
}
