//! The four record types that get a kanban board.
//!
//! Field names follow the backend payloads, so each type carries its own
//! status id field and denormalized status object.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{BoardConfig, BoardEntity};
use crate::filter::SearchFilter;
use crate::model::{BoardItem, ColumnId, ItemId, Status};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    pub lead_status_id: ColumnId,
    #[serde(default)]
    pub lead_status: Option<Status>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl BoardItem for Lead {
    fn id(&self) -> ItemId {
        self.id
    }

    fn status_id(&self) -> &ColumnId {
        &self.lead_status_id
    }

    fn status(&self) -> Option<&Status> {
        self.lead_status.as_ref()
    }

    fn relocate(&mut self, status: &Status) {
        self.lead_status_id = status.id.clone();
        self.lead_status = Some(status.clone());
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(
            [&self.email, &self.phone, &self.company]
                .into_iter()
                .filter_map(|f| f.as_deref()),
        );
        fields
    }
}

impl BoardEntity for Lead {
    fn config() -> BoardConfig<Self> {
        BoardConfig {
            label: "Lead",
            entity: "leads",
            status_field: "lead_status_id",
            response_key: "lead",
            board_route: "leads.board",
            update_route: "leads.status.update",
            edit_capability: "edit-leads",
            filter: SearchFilter::matches_item::<Lead>,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub expected_close_date: Option<NaiveDate>,
    pub opportunity_stage_id: ColumnId,
    #[serde(default)]
    pub stage: Option<Status>,
}

impl BoardItem for Opportunity {
    fn id(&self) -> ItemId {
        self.id
    }

    fn status_id(&self) -> &ColumnId {
        &self.opportunity_stage_id
    }

    fn status(&self) -> Option<&Status> {
        self.stage.as_ref()
    }

    fn relocate(&mut self, status: &Status) {
        self.opportunity_stage_id = status.id.clone();
        self.stage = Some(status.clone());
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(
            [&self.company, &self.contact_name]
                .into_iter()
                .filter_map(|f| f.as_deref()),
        );
        fields
    }
}

impl BoardEntity for Opportunity {
    fn config() -> BoardConfig<Self> {
        BoardConfig {
            label: "Opportunity",
            entity: "opportunities",
            status_field: "opportunity_stage_id",
            response_key: "opportunity",
            board_route: "opportunities.board",
            update_route: "opportunities.stage.update",
            edit_capability: "edit-opportunities",
            filter: SearchFilter::matches_item::<Opportunity>,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTask {
    pub id: ItemId,
    pub project_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub task_status_id: ColumnId,
    #[serde(default)]
    pub task_status: Option<Status>,
}

impl BoardItem for ProjectTask {
    fn id(&self) -> ItemId {
        self.id
    }

    fn status_id(&self) -> &ColumnId {
        &self.task_status_id
    }

    fn status(&self) -> Option<&Status> {
        self.task_status.as_ref()
    }

    fn relocate(&mut self, status: &Status) {
        self.task_status_id = status.id.clone();
        self.task_status = Some(status.clone());
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(
            [&self.description, &self.assignee]
                .into_iter()
                .filter_map(|f| f.as_deref()),
        );
        fields
    }
}

impl BoardEntity for ProjectTask {
    fn config() -> BoardConfig<Self> {
        BoardConfig {
            label: "Task",
            entity: "project-tasks",
            status_field: "task_status_id",
            response_key: "task",
            board_route: "project-tasks.board",
            update_route: "project-tasks.status.update",
            edit_capability: "edit-project-tasks",
            filter: SearchFilter::matches_item::<ProjectTask>,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericItem {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status_id: ColumnId,
    #[serde(default)]
    pub status: Option<Status>,
}

impl BoardItem for GenericItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn status_id(&self) -> &ColumnId {
        &self.status_id
    }

    fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    fn relocate(&mut self, status: &Status) {
        self.status_id = status.id.clone();
        self.status = Some(status.clone());
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }
}

impl BoardEntity for GenericItem {
    fn config() -> BoardConfig<Self> {
        BoardConfig {
            label: "Item",
            entity: "items",
            status_field: "status_id",
            response_key: "item",
            board_route: "items.board",
            update_route: "items.status.update",
            edit_capability: "edit-items",
            filter: SearchFilter::matches_item::<GenericItem>,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_parses_backend_payload() {
        let lead: Lead = serde_json::from_str(
            r##"{
                "id": 7,
                "name": "Dana Whitfield",
                "email": "dana@northwind.test",
                "lead_status_id": 2,
                "lead_status": {"id": 2, "name": "Contacted", "color": "#f59e0b"}
            }"##,
        )
        .unwrap();
        assert_eq!(lead.status_id(), &ColumnId::from(2));
        assert_eq!(lead.status().map(|s| s.name.as_str()), Some("Contacted"));
        assert_eq!(lead.search_fields(), vec!["Dana Whitfield", "dana@northwind.test"]);
    }

    #[test]
    fn relocate_keeps_id_and_embedded_status_together() {
        let mut task = ProjectTask {
            id: 1,
            project_id: 9,
            title: "Draft SOW".into(),
            description: None,
            assignee: Some("Priya".into()),
            due_date: None,
            task_status_id: ColumnId::from("todo"),
            task_status: None,
        };
        let done = Status::new("done", "Done", "#10b981");
        task.relocate(&done);
        assert_eq!(task.task_status_id, done.id);
        assert_eq!(task.task_status.as_ref(), Some(&done));
    }

    #[test]
    fn configs_name_their_capabilities() {
        assert_eq!(Lead::config().edit_capability, "edit-leads");
        assert_eq!(Opportunity::config().status_field, "opportunity_stage_id");
        assert_eq!(ProjectTask::config().status_field, "task_status_id");
        assert_eq!(GenericItem::config().response_key, "item");
    }
}
