use crate::model::BoardItem;

/// Case-insensitive substring filter over an item's display fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    needle: Option<String>,
}

impl SearchFilter {
    pub fn new(term: &str) -> Self {
        let trimmed = term.trim();
        Self {
            needle: (!trimmed.is_empty()).then(|| trimmed.to_lowercase()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.needle.is_some()
    }

    pub fn matches_text(&self, text: &str) -> bool {
        match &self.needle {
            Some(needle) => text.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }

    /// Default predicate: any search field containing the term.
    pub fn matches_item<T: BoardItem>(item: &T, filter: &SearchFilter) -> bool {
        !filter.is_active() || item.search_fields().into_iter().any(|f| filter.matches_text(f))
    }
}
