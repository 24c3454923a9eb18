// Library crate for the task board sync server
// This file exposes the public API for the binary and integration tests

pub mod app;
pub mod auth;
pub mod config;
pub mod hub;
pub mod reorder;
pub mod shared;
pub mod task;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use app::build_router;
pub use config::{AuthMode, ServerConfig};
pub use hub::{ConnectionId, InMemoryRoomHub, RoomHub, RoomKey};
pub use reorder::{BoardView, ReorderCoordinator, ReorderError};
pub use shared::{AppError, AppState};
pub use task::repository::TaskRepository;
pub use websockets::{MessageHandler, MessageType, WebSocketMessage, WebsocketReceiveHandler};
