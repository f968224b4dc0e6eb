//! Fixtures shared by the unit tests.

use std::collections::HashMap;

use crate::board::Board;
use crate::entities::Lead;
use crate::model::{BoardItem, Column, ColumnId, ItemId, Status};

pub const NEW: &str = "1";
pub const QUALIFIED: &str = "2";
pub const CONTACTED: &str = "3";

pub fn statuses() -> Vec<Status> {
    vec![
        Status::new(NEW, "New", "#3b82f6"),
        Status::new(QUALIFIED, "Qualified", "#10b981"),
        Status::new(CONTACTED, "Contacted", "#f59e0b"),
    ]
}

pub fn lead(id: ItemId, status: &str) -> Lead {
    let (name, company) = match id {
        1 => ("Dana Whitfield", "Northwind"),
        2 => ("Marcus Bell", "Globex"),
        3 => ("Ines Duarte", "Initech"),
        _ => ("Oren Katz", "Umbrella"),
    };
    Lead {
        id,
        name: name.to_string(),
        email: Some(format!("lead{id}@example.test")),
        phone: None,
        company: Some(company.to_string()),
        lead_status_id: ColumnId::from(status),
        lead_status: None,
        created_at: None,
    }
}

/// "New" holds leads 1, 2, 3; "Qualified" holds 4; "Contacted" is empty.
pub fn lead_board() -> Board<Lead> {
    let statuses = statuses();
    let mut initial = HashMap::new();
    initial.insert(
        ColumnId::from(NEW),
        Column {
            status: statuses[0].clone(),
            items: vec![lead(1, NEW), lead(2, NEW), lead(3, NEW)],
        },
    );
    initial.insert(
        ColumnId::from(QUALIFIED),
        Column {
            status: statuses[1].clone(),
            items: vec![lead(4, QUALIFIED)],
        },
    );
    Board::new(statuses, initial)
}

pub fn ids<T: BoardItem>(board: &Board<T>, column: &str) -> Vec<ItemId> {
    board
        .column(&ColumnId::from(column))
        .map(|c| c.items.iter().map(BoardItem::id).collect())
        .unwrap_or_default()
}
