use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const CATEGORY_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TodoId(pub Uuid);

impl TodoId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for TodoId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl FromStr for TodoId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s).map(Self) }
}

/// Identity of the user owning a todo. Opaque: only ever compared for equality.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    /// Accepts an identity handed over by the authenticator; blank values are not identities.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() { None } else { Some(Self(raw.to_string())) }
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TodoStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TodoStatus {
    pub const ALL: [TodoStatus; 3] = [TodoStatus::Pending, TodoStatus::InProgress, TodoStatus::Completed];

    /// Wire label, also used as the stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "Pending",
            TodoStatus::InProgress => "In Progress",
            TodoStatus::Completed => "Completed",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == label)
    }

    /// Next status in the Pending -> In Progress -> Completed cycle.
    pub fn next(&self) -> Self {
        match self {
            TodoStatus::Pending => TodoStatus::InProgress,
            TodoStatus::InProgress => TodoStatus::Completed,
            TodoStatus::Completed => TodoStatus::Pending,
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub status: TodoStatus,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub owner_id: OwnerId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A create request that passed validation. Only built by `TodoInput::into_new_todo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) status: TodoStatus,
    pub(crate) category: Option<String>,
    pub(crate) due_date: Option<DateTime<Utc>>,
}

impl NewTodo {
    /// Materializes the record a store persists: fresh id, owner and timestamps.
    pub fn into_todo(self, owner_id: OwnerId, now: DateTime<Utc>) -> Todo {
        Todo {
            id: TodoId::new(),
            title: self.title,
            description: self.description,
            status: self.status,
            category: self.category,
            due_date: self.due_date,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A validated partial update. `None` leaves a field untouched; for nullable
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<Option<String>>,
    pub(crate) status: Option<TodoStatus>,
    pub(crate) category: Option<Option<String>>,
    pub(crate) due_date: Option<Option<DateTime<Utc>>>,
}

impl TodoPatch {
    pub fn title(&self) -> Option<&str> { self.title.as_deref() }
    pub fn description(&self) -> Option<Option<&str>> { self.description.as_ref().map(|d| d.as_deref()) }
    pub fn status(&self) -> Option<TodoStatus> { self.status }
    pub fn category(&self) -> Option<Option<&str>> { self.category.as_ref().map(|c| c.as_deref()) }
    pub fn due_date(&self) -> Option<Option<DateTime<Utc>>> { self.due_date }

    pub fn apply_to(&self, todo: &mut Todo, now: DateTime<Utc>) {
        if let Some(title) = &self.title { todo.title = title.clone(); }
        if let Some(description) = &self.description { todo.description = description.clone(); }
        if let Some(status) = self.status { todo.status = status; }
        if let Some(category) = &self.category { todo.category = category.clone(); }
        if let Some(due_date) = self.due_date { todo.due_date = due_date; }
        todo.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_round_trip() {
        for status in TodoStatus::ALL {
            assert_eq!(TodoStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TodoStatus::parse("in progress"), None);
        assert_eq!(serde_json::to_value(TodoStatus::InProgress).unwrap(), "In Progress");
    }

    #[test]
    fn blank_owner_is_rejected() {
        assert!(OwnerId::parse("   ").is_none());
        assert_eq!(OwnerId::parse(" u1 ").unwrap().as_str(), "u1");
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let now = Utc::now();
        let mut todo = NewTodo {
            title: "Buy groceries".into(),
            description: Some("Milk".into()),
            status: TodoStatus::Pending,
            category: Some("Personal".into()),
            due_date: Some(now),
        }
        .into_todo(OwnerId::new("u1"), now);
        let before = todo.clone();

        let patch = TodoPatch { status: Some(TodoStatus::Completed), category: Some(None), ..TodoPatch::default() };
        patch.apply_to(&mut todo, now);

        assert_eq!(todo.status, TodoStatus::Completed);
        assert_eq!(todo.category, None);
        assert_eq!(todo.title, before.title);
        assert_eq!(todo.description, before.description);
        assert_eq!(todo.due_date, before.due_date);
        assert_eq!(todo.id, before.id);
    }
}
