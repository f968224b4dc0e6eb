pub mod board;
pub mod column;
pub mod header;
pub mod item_card;

pub use board::KanbanBoard;
pub use column::KanbanColumn;
pub use header::BoardHeader;
pub use item_card::{CardEntity, ItemCard};
