use crate::filter::SearchFilter;
use crate::model::BoardItem;

/// Per-entity strategy for the generic board.
///
/// Routes are names resolved by the UI's route table, not literal URLs.
pub struct BoardConfig<T> {
    /// Singular label used in notifications ("Lead").
    pub label: &'static str,
    /// Plural slug, matches the server's board and event names ("leads").
    pub entity: &'static str,
    /// Request field carrying the destination column id.
    pub status_field: &'static str,
    /// Key of the authoritative record in a success payload.
    pub response_key: &'static str,
    pub board_route: &'static str,
    pub update_route: &'static str,
    pub edit_capability: &'static str,
    pub filter: fn(&T, &SearchFilter) -> bool,
}

impl<T> Clone for BoardConfig<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BoardConfig<T> {}

impl<T> std::fmt::Debug for BoardConfig<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardConfig")
            .field("entity", &self.entity)
            .field("status_field", &self.status_field)
            .field("update_route", &self.update_route)
            .field("edit_capability", &self.edit_capability)
            .finish()
    }
}

/// Records that have a board of their own.
pub trait BoardEntity: BoardItem + Sized + 'static {
    fn config() -> BoardConfig<Self>;
}
