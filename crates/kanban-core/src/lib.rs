//! Board model and optimistic status-transition engine for the CRM kanban
//! boards (leads, opportunities, project tasks, generic items).
//!
//! Everything here is UI-agnostic: the Leptos frontend renders a
//! [`Board`] and feeds drag events into a [`KanbanSession`], and the dev
//! server reuses the entity types for its payloads.

pub mod board;
pub mod config;
pub mod controller;
pub mod entities;
pub mod error;
pub mod events;
pub mod filter;
pub mod model;
pub mod permissions;
pub mod session;

#[cfg(test)]
mod testing;

pub use board::{Board, BoardSnapshot, ColumnView, DropEvent};
pub use config::{BoardConfig, BoardEntity};
pub use controller::{
    BoardController, DropDecision, IgnoreReason, MoveState, OpId, Outcome, Settlement, StatusUpdate,
};
pub use entities::{GenericItem, Lead, Opportunity, ProjectTask};
pub use error::{MoveError, UpdateError, GENERIC_FAILURE};
pub use events::BoardChanged;
pub use filter::SearchFilter;
pub use model::{BoardItem, Column, ColumnId, ItemId, Status};
pub use permissions::Permissions;
pub use session::{DropOutcome, KanbanSession, Notifier, SessionEvent, StatusUpdater, UpdateAck};
