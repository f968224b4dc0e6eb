use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Record id as issued by the backend.
pub type ItemId = u64;

/// Key of a status/stage column.
///
/// The backend sends these as JSON numbers in record payloads and as strings
/// when they are used as object keys, so both forms are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for ColumnId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for ColumnId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => ColumnId(n.to_string()),
            Raw::Text(s) => ColumnId(s),
        })
    }
}

/// Column metadata, also embedded on every item as its denormalized status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: ColumnId,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "#6b7280".to_string()
}

impl Status {
    pub fn new(id: impl Into<ColumnId>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// A record that can sit in a board column.
pub trait BoardItem: Clone + PartialEq + fmt::Debug {
    fn id(&self) -> ItemId;

    /// The `statusId`/`stageId` field.
    fn status_id(&self) -> &ColumnId;

    /// The denormalized status sub-object, if the payload carried one.
    fn status(&self) -> Option<&Status>;

    /// Points the item at `status`, updating the id field and the embedded
    /// sub-object together.
    fn relocate(&mut self, status: &Status);

    /// Display fields searched by the board filter.
    fn search_fields(&self) -> Vec<&str>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column<T> {
    pub status: Status,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Column<T> {
    pub fn empty(status: Status) -> Self {
        Self {
            status,
            items: Vec::new(),
        }
    }
}
