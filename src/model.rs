use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;

// Data model representing a Todo item as stored in the todos table
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Todo {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub payload: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Priority scale for a Todo item, stored as its integer value.
///
/// Serialized in JSON as the bare integer, so a request body like
/// `{"priority": 1}` parses to `Priority::High` and anything outside
/// 0..=4 is rejected at the serde boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type,
)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum Priority {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
    Backlog = 4,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl From<Priority> for i32 {
    fn from(priority: Priority) -> Self {
        priority as i32
    }
}

impl TryFrom<i32> for Priority {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Priority::Critical),
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            4 => Ok(Priority::Backlog),
            other => Err(format!("priority must be between 0 and 4, got {other}")),
        }
    }
}
