// Public API - what other modules can use
pub use handlers::{list_tasks, move_task};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod types;
