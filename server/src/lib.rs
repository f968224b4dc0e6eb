//! Development backend for the kanban boards: an in-memory CRM with the
//! board, status-update and change-feed endpoints the UI talks to.

pub mod config;
pub mod error;
pub mod store;
pub mod web;

pub use config::ServerConfig;
pub use error::ApiError;
pub use store::Store;
pub use web::{build_router, AppState};
