use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;

use crate::model::Priority;

/// Longest accepted title, in characters, after trimming.
pub const MAX_TITLE_LEN: usize = 255;

// Struct representing the request body for creating a new Todo
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CreateTodoSchema {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub payload: Option<Value>,
}

// Struct representing the request body for updating a Todo; every field
// is optional and absent fields are left unchanged
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct UpdateTodoSchema {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub payload: Option<Value>,
}

// Query-string filters for the list endpoint
#[derive(Debug, Default, serde::Deserialize)]
pub struct FilterOptions {
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
}

/// A create request that passed validation, ready for the repository.
#[derive(Debug)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub payload: Option<Json<Value>>,
}

/// An update request that passed validation. `None` means unchanged.
#[derive(Debug, Default)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub payload: Option<Json<Value>>,
}

/// Validation error for request bodies
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },
}

impl CreateTodoSchema {
    pub fn validate(self) -> Result<NewTodo, ValidationError> {
        Ok(NewTodo {
            title: validated_title(&self.title)?,
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
            payload: self.payload.map(Json),
        })
    }
}

impl UpdateTodoSchema {
    pub fn validate(self) -> Result<TodoChanges, ValidationError> {
        Ok(TodoChanges {
            title: self.title.as_deref().map(validated_title).transpose()?,
            description: self.description,
            completed: self.completed,
            priority: self.priority,
            due_date: self.due_date,
            payload: self.payload.map(Json),
        })
    }
}

// Titles are stored trimmed; an all-whitespace title counts as empty
fn validated_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::Empty { field: "title" });
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title",
            max: MAX_TITLE_LEN,
        });
    }
    Ok(title.to_owned())
}
