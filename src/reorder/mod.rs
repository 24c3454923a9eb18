// Client-side optimistic reordering: board view, pending-write state machine
// and the coordinator tying them to the repository and the hub

// Public API - what other modules can use
pub use board::{BoardView, RemoteOutcome};
pub use coordinator::{IntentSink, Notifier, ReorderCoordinator, SocketIntentSink};
pub use state::{PendingReorder, ReorderState};

use thiserror::Error;
use uuid::Uuid;

use crate::shared::AppError;

// Internal modules
mod board;
mod coordinator;
mod state;

#[derive(Debug, Error)]
pub enum ReorderError {
    #[error("Invalid reorder transition from {from} to {to}")]
    InvalidTransition {
        from: ReorderState,
        to: ReorderState,
    },

    #[error("Task {0} is not on the board")]
    UnknownTask(Uuid),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Intent channel closed")]
    ChannelClosed,

    #[error("Persistence failed: {0}")]
    Persistence(#[from] AppError),
}
