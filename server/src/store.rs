use std::collections::HashMap;

use chrono::{NaiveDate, TimeZone, Utc};
use crm_kanban_core::{
    BoardEntity, BoardItem, BoardSnapshot, Column, ColumnId, GenericItem, ItemId, Lead, Opportunity, Permissions,
    ProjectTask, Status,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no record {0}")]
    UnknownRecord(ItemId),
    #[error("no status {0}")]
    UnknownStatus(ColumnId),
}

/// One entity's statuses and records, in display order.
#[derive(Debug, Clone)]
pub struct Table<T> {
    statuses: Vec<Status>,
    records: Vec<T>,
}

impl<T: BoardItem> Table<T> {
    pub fn new(statuses: Vec<Status>, records: Vec<T>) -> Self {
        let mut table = Self {
            statuses,
            records: Vec::with_capacity(records.len()),
        };
        for mut record in records {
            if let Some(status) = table.status(record.status_id()).cloned() {
                record.relocate(&status);
            }
            table.records.push(record);
        }
        table
    }

    pub fn status(&self, id: &ColumnId) -> Option<&Status> {
        self.statuses.iter().find(|status| status.id == *id)
    }

    pub fn record(&self, id: ItemId) -> Option<&T> {
        self.records.iter().find(|record| record.id() == id)
    }

    /// Board payload for the records `keep` accepts. Records whose status
    /// is unknown are left out.
    pub fn snapshot(&self, permissions: &Permissions, keep: impl Fn(&T) -> bool) -> BoardSnapshot<T> {
        let mut initial_data: HashMap<ColumnId, Column<T>> = self
            .statuses
            .iter()
            .map(|status| (status.id.clone(), Column::empty(status.clone())))
            .collect();
        for record in self.records.iter().filter(|record| keep(record)) {
            if let Some(column) = initial_data.get_mut(record.status_id()) {
                column.items.push(record.clone());
            }
        }
        BoardSnapshot {
            statuses: self.statuses.clone(),
            initial_data,
            permissions: permissions.clone(),
        }
    }

    /// Moves record `id` to `status_id` and returns the updated record.
    pub fn set_status(&mut self, id: ItemId, status_id: &ColumnId) -> Result<T, StoreError> {
        let status = self
            .status(status_id)
            .cloned()
            .ok_or_else(|| StoreError::UnknownStatus(status_id.clone()))?;
        let record = self
            .records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or(StoreError::UnknownRecord(id))?;
        record.relocate(&status);
        Ok(record.clone())
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    leads: Table<Lead>,
    opportunities: Table<Opportunity>,
    tasks: Table<ProjectTask>,
    items: Table<GenericItem>,
}

/// An entity the store keeps a table for.
pub trait Stored: BoardEntity + Serialize + Send + Sync {
    fn table(store: &Store) -> &Table<Self>;
    fn table_mut(store: &mut Store) -> &mut Table<Self>;

    /// Project the record belongs to, for boards scoped by project.
    fn project_id(&self) -> Option<u64> {
        None
    }
}

impl Stored for Lead {
    fn table(store: &Store) -> &Table<Self> {
        &store.leads
    }
    fn table_mut(store: &mut Store) -> &mut Table<Self> {
        &mut store.leads
    }
}

impl Stored for Opportunity {
    fn table(store: &Store) -> &Table<Self> {
        &store.opportunities
    }
    fn table_mut(store: &mut Store) -> &mut Table<Self> {
        &mut store.opportunities
    }
}

impl Stored for ProjectTask {
    fn table(store: &Store) -> &Table<Self> {
        &store.tasks
    }
    fn table_mut(store: &mut Store) -> &mut Table<Self> {
        &mut store.tasks
    }
    fn project_id(&self) -> Option<u64> {
        Some(self.project_id)
    }
}

impl Stored for GenericItem {
    fn table(store: &Store) -> &Table<Self> {
        &store.items
    }
    fn table_mut(store: &mut Store) -> &mut Table<Self> {
        &mut store.items
    }
}

fn status(id: u64, name: &str, color: &str) -> Status {
    Status::new(id, name, color)
}

fn lead(id: ItemId, name: &str, company: &str, status: u64, day: u32) -> Lead {
    Lead {
        id,
        name: name.to_string(),
        email: Some(format!("{}@{}.test", name.split(' ').next().unwrap_or(name).to_lowercase(), company.to_lowercase())),
        phone: None,
        company: Some(company.to_string()),
        lead_status_id: ColumnId::from(status),
        lead_status: None,
        created_at: Utc.with_ymd_and_hms(2024, 4, day, 9, 30, 0).single(),
    }
}

fn opportunity(id: ItemId, title: &str, company: &str, amount: f64, stage: u64) -> Opportunity {
    Opportunity {
        id,
        title: title.to_string(),
        company: Some(company.to_string()),
        contact_name: None,
        amount: Some(amount),
        expected_close_date: NaiveDate::from_ymd_opt(2024, 9, 30),
        opportunity_stage_id: ColumnId::from(stage),
        stage: None,
    }
}

fn task(id: ItemId, project_id: u64, title: &str, assignee: Option<&str>, status: u64) -> ProjectTask {
    ProjectTask {
        id,
        project_id,
        title: title.to_string(),
        description: None,
        assignee: assignee.map(str::to_string),
        due_date: None,
        task_status_id: ColumnId::from(status),
        task_status: None,
    }
}

fn item(id: ItemId, name: &str, status: u64) -> GenericItem {
    GenericItem {
        id,
        name: name.to_string(),
        description: None,
        status_id: ColumnId::from(status),
        status: None,
    }
}

impl Store {
    pub fn new(
        leads: Table<Lead>,
        opportunities: Table<Opportunity>,
        tasks: Table<ProjectTask>,
        items: Table<GenericItem>,
    ) -> Self {
        Self {
            leads,
            opportunities,
            tasks,
            items,
        }
    }

    /// A small CRM to click around in.
    pub fn demo() -> Self {
        let leads = Table::new(
            vec![
                status(1, "New", "#3b82f6"),
                status(2, "Contacted", "#f59e0b"),
                status(3, "Qualified", "#10b981"),
                status(4, "Lost", "#ef4444"),
            ],
            vec![
                lead(1, "Dana Whitfield", "Northwind", 1, 2),
                lead(2, "Marcus Bell", "Globex", 1, 3),
                lead(3, "Ines Duarte", "Initech", 2, 5),
                lead(4, "Oren Katz", "Umbrella", 3, 8),
                lead(5, "Priya Natarajan", "Hooli", 4, 11),
            ],
        );
        let opportunities = Table::new(
            vec![
                status(1, "Prospecting", "#6366f1"),
                status(2, "Proposal", "#0ea5e9"),
                status(3, "Negotiation", "#f59e0b"),
                status(4, "Won", "#10b981"),
            ],
            vec![
                opportunity(1, "Fleet renewal", "Globex", 48000.0, 1),
                opportunity(2, "Support contract", "Initech", 12500.0, 2),
                opportunity(3, "Warehouse sensors", "Northwind", 86000.0, 3),
            ],
        );
        let tasks = Table::new(
            vec![
                status(1, "To do", "#6b7280"),
                status(2, "In progress", "#3b82f6"),
                status(3, "Done", "#10b981"),
            ],
            vec![
                task(1, 1, "Draft kickoff agenda", Some("Dana"), 1),
                task(2, 1, "Collect requirements", Some("Marcus"), 2),
                task(3, 1, "Sign statement of work", None, 3),
                task(4, 2, "Migrate contacts", Some("Ines"), 1),
            ],
        );
        let items = Table::new(
            vec![status(1, "Open", "#3b82f6"), status(2, "Closed", "#6b7280")],
            vec![item(1, "Renew domain", 1), item(2, "Order badges", 2)],
        );
        Self::new(leads, opportunities, tasks, items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_carry_their_status() {
        let store = Store::demo();
        let lead = Lead::table(&store).record(4).unwrap();
        assert_eq!(lead.lead_status.as_ref().unwrap().name, "Qualified");
    }

    #[test]
    fn snapshot_groups_by_status() {
        let store = Store::demo();
        let snapshot = ProjectTask::table(&store).snapshot(&Permissions::default(), |task| task.project_id == 1);
        assert_eq!(snapshot.statuses.len(), 3);
        let todo = &snapshot.initial_data[&ColumnId::from(1)];
        assert_eq!(todo.items.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(snapshot.initial_data.values().map(|c| c.items.len()).sum::<usize>(), 3);
    }

    #[test]
    fn set_status_validates_both_ids() {
        let mut store = Store::demo();
        let table = Lead::table_mut(&mut store);
        assert_eq!(
            table.set_status(1, &ColumnId::from(9)),
            Err(StoreError::UnknownStatus(ColumnId::from(9)))
        );
        assert_eq!(table.set_status(99, &ColumnId::from(2)), Err(StoreError::UnknownRecord(99)));

        let moved = table.set_status(1, &ColumnId::from(3)).unwrap();
        assert_eq!(moved.lead_status.unwrap().name, "Qualified");
        assert_eq!(table.record(1).unwrap().lead_status_id, ColumnId::from(3));
    }
}
