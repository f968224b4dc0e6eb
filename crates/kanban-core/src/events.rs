use serde::{Deserialize, Serialize};

use crate::model::{ColumnId, ItemId};

/// Broadcast by the backend after a record changes column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardChanged {
    /// Board slug, e.g. `leads` or `project-tasks`.
    pub entity: String,
    pub item_id: ItemId,
    pub status_id: ColumnId,
    #[serde(default)]
    pub project_id: Option<u64>,
    /// `X-Request-Id` of the update that caused the change, if any.
    #[serde(default)]
    pub request_id: Option<String>,
}

impl BoardChanged {
    /// SSE event name.
    pub const EVENT: &'static str = "board-changed";

    pub fn concerns(&self, entity: &str, project_id: Option<u64>) -> bool {
        self.entity == entity && (project_id.is_none() || self.project_id == project_id)
    }
}
