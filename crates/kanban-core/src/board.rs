use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::MoveError;
use crate::filter::SearchFilter;
use crate::model::{BoardItem, Column, ColumnId, ItemId, Status};
use crate::permissions::Permissions;

/// Board payload as the backend renders it for a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot<T> {
    #[serde(alias = "stages")]
    pub statuses: Vec<Status>,
    #[serde(default = "HashMap::new")]
    pub initial_data: HashMap<ColumnId, Column<T>>,
    #[serde(default)]
    pub permissions: Permissions,
}

/// A single drag-end: item `item_id` dropped from `source[source_index]`
/// onto `destination[destination_index]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEvent {
    pub source: ColumnId,
    pub destination: ColumnId,
    pub source_index: usize,
    pub destination_index: usize,
    pub item_id: ItemId,
}

impl DropEvent {
    pub fn is_no_move(&self) -> bool {
        self.source == self.destination && self.source_index == self.destination_index
    }
}

/// What one column shows after filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView<T> {
    pub status: Status,
    pub items: Vec<T>,
    /// Filtered count while a filter is active, total otherwise.
    pub count: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Board<T> {
    statuses: Vec<Status>,
    columns: HashMap<ColumnId, Column<T>>,
}

impl<T: BoardItem> Board<T> {
    /// Builds a board with one column per status, in status order.
    ///
    /// Statuses absent from `initial` get an empty column. Snapshot columns
    /// without a status are dropped, an item seen twice keeps its first
    /// position, and every item's embedded status is rewritten from the
    /// column that holds it.
    pub fn new(statuses: Vec<Status>, mut initial: HashMap<ColumnId, Column<T>>) -> Self {
        let mut ordered = Vec::with_capacity(statuses.len());
        let mut columns = HashMap::with_capacity(statuses.len());
        let mut seen = HashSet::new();

        for status in statuses {
            if columns.contains_key(&status.id) {
                warn!("status {} listed twice, keeping the first", status.id);
                continue;
            }
            let items = initial.remove(&status.id).map(|c| c.items).unwrap_or_default();
            let mut kept = Vec::with_capacity(items.len());
            for mut item in items {
                if !seen.insert(item.id()) {
                    warn!("item {} appears in more than one column, dropping copy in {}", item.id(), status.id);
                    continue;
                }
                item.relocate(&status);
                kept.push(item);
            }
            columns.insert(status.id.clone(), Column { status: status.clone(), items: kept });
            ordered.push(status);
        }

        for (id, column) in initial {
            warn!("snapshot column {} has no status, dropping {} items", id, column.items.len());
        }

        Self { statuses: ordered, columns }
    }

    pub fn from_snapshot(snapshot: BoardSnapshot<T>) -> Self {
        Self::new(snapshot.statuses, snapshot.initial_data)
    }

    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    pub fn column(&self, id: &ColumnId) -> Option<&Column<T>> {
        self.columns.get(id)
    }

    /// Columns in status order.
    pub fn columns(&self) -> impl Iterator<Item = &Column<T>> {
        self.statuses.iter().filter_map(|s| self.columns.get(&s.id))
    }

    pub fn locate(&self, item_id: ItemId) -> Option<(&ColumnId, usize)> {
        self.columns().find_map(|column| {
            column
                .items
                .iter()
                .position(|i| i.id() == item_id)
                .map(|pos| (&column.status.id, pos))
        })
    }

    pub fn item(&self, item_id: ItemId) -> Option<&T> {
        self.locate(item_id)
            .and_then(|(column, pos)| self.columns.get(column).map(|c| &c.items[pos]))
    }

    pub fn item_count(&self) -> usize {
        self.columns.values().map(|c| c.items.len()).sum()
    }

    /// Translates "drop `item_id` onto `destination`, just before `before`"
    /// (or at the end when `before` is `None`) into a [`DropEvent`] whose
    /// indices refer to the unfiltered board. `destination_index` is the
    /// item's final position.
    pub fn drop_event(
        &self,
        item_id: ItemId,
        destination: &ColumnId,
        before: Option<ItemId>,
    ) -> Option<DropEvent> {
        let (source, source_index) = self.locate(item_id).map(|(c, i)| (c.clone(), i))?;
        let column = self.columns.get(destination)?;
        let same_column = source == *destination;

        let anchor = before
            .filter(|id| *id != item_id)
            .and_then(|id| column.items.iter().position(|i| i.id() == id));
        let destination_index = match (anchor, before) {
            (Some(at), _) if same_column && source_index < at => at - 1,
            (Some(at), _) => at,
            // dropped onto itself
            (None, Some(id)) if id == item_id => source_index,
            (None, _) if same_column => column.items.len() - 1,
            (None, _) => column.items.len(),
        };

        Some(DropEvent {
            source,
            destination: destination.clone(),
            source_index,
            destination_index,
            item_id,
        })
    }

    /// The board after `event`, leaving `self` untouched.
    ///
    /// The item is looked up by id in the source column; the indices on the
    /// event are only trusted for the insertion point, which is clamped to
    /// the destination length.
    pub fn apply_move(&self, event: &DropEvent) -> Result<Board<T>, MoveError> {
        let destination = self
            .columns
            .get(&event.destination)
            .ok_or_else(|| MoveError::UnknownColumn(event.destination.clone()))?
            .status
            .clone();
        let not_found = || MoveError::ItemNotFound {
            item: event.item_id,
            column: event.source.clone(),
        };
        let from = self
            .columns
            .get(&event.source)
            .and_then(|c| c.items.iter().position(|i| i.id() == event.item_id))
            .ok_or_else(not_found)?;

        let mut next = self.clone();
        let mut item = next
            .columns
            .get_mut(&event.source)
            .ok_or_else(not_found)?
            .items
            .remove(from);
        item.relocate(&destination);

        let column = next
            .columns
            .get_mut(&destination.id)
            .ok_or_else(|| MoveError::UnknownColumn(destination.id.clone()))?;
        let at = event.destination_index.min(column.items.len());
        column.items.insert(at, item);

        debug!(
            "moved item {} from {}[{}] to {}[{}]",
            event.item_id, event.source, from, destination.id, at
        );
        Ok(next)
    }

    /// Swaps in the server's copy of an item.
    ///
    /// Every existing copy is removed first. The authoritative item lands in
    /// the column named by its own status id, at the position the previous
    /// copy held when the column is unchanged and at the end otherwise.
    /// Returns `false` and leaves the board alone when that status is not on
    /// the board.
    pub fn reconcile(&mut self, mut item: T) -> bool {
        let Some(status) = self.columns.get(item.status_id()).map(|c| c.status.clone()) else {
            warn!(
                "authoritative item {} names unknown status {}, keeping optimistic copy",
                item.id(),
                item.status_id()
            );
            return false;
        };

        let id = item.id();
        let previous = self.locate(id).map(|(column, pos)| (column.clone(), pos));
        for column in self.columns.values_mut() {
            column.items.retain(|i| i.id() != id);
        }

        item.relocate(&status);
        let Some(column) = self.columns.get_mut(&status.id) else {
            return false;
        };
        let at = match previous {
            Some((column_id, pos)) if column_id == status.id => pos.min(column.items.len()),
            _ => column.items.len(),
        };
        column.items.insert(at, item);
        true
    }

    /// Per-column view under `filter`. Never touches the board itself.
    pub fn filtered(
        &self,
        filter: &SearchFilter,
        matches: fn(&T, &SearchFilter) -> bool,
    ) -> Vec<ColumnView<T>> {
        self.columns()
            .map(|column| {
                let items: Vec<T> = column
                    .items
                    .iter()
                    .filter(|item| !filter.is_active() || matches(item, filter))
                    .cloned()
                    .collect();
                ColumnView {
                    status: column.status.clone(),
                    count: items.len(),
                    total: column.items.len(),
                    items,
                }
            })
            .collect()
    }
}
