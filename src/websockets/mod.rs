// Public API
pub use handler::{websocket_handler, WebsocketReceiveHandler};
pub use messages::{
    CommentPayload, MessageType, TaskUpdatePayload, TypingPayload, UserTypingPayload,
    WebSocketMessage, WebSocketMessageMeta,
};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
mod handler;
mod messages;
mod socket;
