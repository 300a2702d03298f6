use std::cmp::Ordering;

use serde::Deserialize;

use super::todo::Todo;
use super::validation::ValidationErrors;

/// Value passed for `status`/`category` meaning "do not filter".
pub const MATCH_ALL: &str = "All";

/// Query string accepted by the list endpoint, before compilation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldFilter {
    #[default]
    Any,
    Exact(String),
    /// Case-insensitive substring; the needle is stored lowercased.
    Contains(String),
}

impl FieldFilter {
    fn exact(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") | Some(MATCH_ALL) => FieldFilter::Any,
            Some(value) => FieldFilter::Exact(value.to_string()),
        }
    }

    fn contains(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => FieldFilter::Any,
            Some(needle) => FieldFilter::Contains(needle.to_lowercase()),
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            FieldFilter::Any => true,
            FieldFilter::Exact(expected) => value == Some(expected.as_str()),
            FieldFilter::Contains(needle) => value.is_some_and(|v| v.to_lowercase().contains(needle.as_str())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Description,
    Status,
    Category,
    DueDate,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "title" => SortKey::Title,
            "description" => SortKey::Description,
            "status" => SortKey::Status,
            "category" => SortKey::Category,
            "dueDate" => SortKey::DueDate,
            // uuids are unordered; id sorting falls back to creation order
            "createdAt" | "id" | "_id" => SortKey::CreatedAt,
            "updatedAt" => SortKey::UpdatedAt,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// A compiled list request: a conjunctive predicate plus a sort comparator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQuery {
    pub status: FieldFilter,
    pub category: FieldFilter,
    pub search: FieldFilter,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

impl TodoQuery {
    pub fn compile(params: &ListParams) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let sort_key = match params.sort_by.as_deref() {
            None => SortKey::default(),
            Some(raw) => SortKey::parse(raw).unwrap_or_else(|| {
                errors.push("sortBy", "Unsupported sort field");
                SortKey::default()
            }),
        };
        let sort_order = match params.sort_order.as_deref() {
            None => SortOrder::default(),
            Some(raw) => SortOrder::parse(raw).unwrap_or_else(|| {
                errors.push("sortOrder", "Sort order must be asc or desc");
                SortOrder::default()
            }),
        };

        errors.into_result(TodoQuery {
            status: FieldFilter::exact(params.status.as_deref()),
            category: FieldFilter::exact(params.category.as_deref()),
            search: FieldFilter::contains(params.search.as_deref()),
            sort_key,
            sort_order,
        })
    }

    pub fn matches(&self, todo: &Todo) -> bool {
        self.status.matches(Some(todo.status.as_str()))
            && self.category.matches(todo.category.as_deref())
            && (self.search.matches(Some(&todo.title)) || self.search.matches(todo.description.as_deref()))
    }

    /// Orders by the sort key only; equal keys compare `Equal` so a stable
    /// sort keeps creation order for ties in both directions.
    pub fn compare(&self, a: &Todo, b: &Todo) -> Ordering {
        let ordering = match self.sort_key {
            SortKey::Title => a.title.cmp(&b.title),
            SortKey::Description => a.description.cmp(&b.description),
            SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
            SortKey::Category => a.category.cmp(&b.category),
            SortKey::DueDate => a.due_date.cmp(&b.due_date),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// Filters and sorts `todos`, which must arrive in creation order.
    pub fn apply(&self, mut todos: Vec<Todo>) -> Vec<Todo> {
        todos.retain(|todo| self.matches(todo));
        todos.sort_by(|a, b| self.compare(a, b));
        todos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::{OwnerId, TodoId, TodoStatus};
    use chrono::{Duration, TimeZone, Utc};

    fn todo(title: &str, description: Option<&str>, status: TodoStatus, category: Option<&str>, minute: i64) -> Todo {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minute);
        Todo {
            id: TodoId::new(),
            title: title.into(),
            description: description.map(Into::into),
            status,
            category: category.map(Into::into),
            due_date: None,
            owner_id: OwnerId::new("u1"),
            created_at: created,
            updated_at: created,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let mut params = ListParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "status" => params.status = value,
                "category" => params.category = value,
                "search" => params.search = value,
                "sortBy" => params.sort_by = value,
                "sortOrder" => params.sort_order = value,
                _ => unreachable!(),
            }
        }
        params
    }

    fn titles(todos: &[Todo]) -> Vec<&str> { todos.iter().map(|t| t.title.as_str()).collect() }

    fn sample() -> Vec<Todo> {
        vec![
            todo("Complete project proposal", Some("Write a detailed proposal"), TodoStatus::InProgress, Some("Work"), 0),
            todo("Buy groceries", Some("Milk, bread, eggs"), TodoStatus::Pending, Some("Personal"), 1),
            todo("Call dentist", Some("Schedule annual checkup"), TodoStatus::Pending, Some("Health"), 2),
            todo("Review code changes", None, TodoStatus::Completed, Some("Work"), 3),
        ]
    }

    #[test]
    fn defaults_are_newest_first_without_filters() {
        let query = TodoQuery::compile(&ListParams::default()).unwrap();
        assert_eq!(query, TodoQuery::default());
        assert_eq!(
            titles(&query.apply(sample())),
            vec!["Review code changes", "Call dentist", "Buy groceries", "Complete project proposal"]
        );
    }

    #[test]
    fn search_is_case_insensitive_over_title_or_description() {
        let query = TodoQuery::compile(&params(&[("search", "dent")])).unwrap();
        assert_eq!(titles(&query.apply(sample())), vec!["Call dentist"]);

        let query = TodoQuery::compile(&params(&[("search", "MILK")])).unwrap();
        assert_eq!(titles(&query.apply(sample())), vec!["Buy groceries"]);
    }

    #[test]
    fn all_disables_status_and_category_filters() {
        let query = TodoQuery::compile(&params(&[("status", "All"), ("category", "All")])).unwrap();
        assert_eq!((&query.status, &query.category), (&FieldFilter::Any, &FieldFilter::Any));
        assert_eq!(query.apply(sample()).len(), 4);
    }

    #[test]
    fn filters_compose_conjunctively() {
        let query = TodoQuery::compile(&params(&[("status", "Pending"), ("category", "Health")])).unwrap();
        assert_eq!(titles(&query.apply(sample())), vec!["Call dentist"]);

        let query = TodoQuery::compile(&params(&[("status", "Completed"), ("search", "dent")])).unwrap();
        assert!(query.apply(sample()).is_empty());
    }

    #[test]
    fn status_sorts_by_label() {
        let query = TodoQuery::compile(&params(&[("sortBy", "status"), ("sortOrder", "asc")])).unwrap();
        assert_eq!(
            titles(&query.apply(sample())),
            vec!["Review code changes", "Complete project proposal", "Buy groceries", "Call dentist"]
        );
    }

    #[test]
    fn equal_keys_keep_creation_order_in_both_directions() {
        let due = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let mut todos = sample();
        for t in &mut todos {
            t.due_date = Some(due);
        }
        let expected = vec!["Complete project proposal", "Buy groceries", "Call dentist", "Review code changes"];

        for order in ["asc", "desc"] {
            let query = TodoQuery::compile(&params(&[("sortBy", "dueDate"), ("sortOrder", order)])).unwrap();
            assert_eq!(titles(&query.apply(todos.clone())), expected);
        }
    }

    #[test]
    fn missing_values_sort_first_ascending() {
        let query = TodoQuery::compile(&params(&[("sortBy", "description"), ("sortOrder", "asc")])).unwrap();
        assert_eq!(query.apply(sample())[0].title, "Review code changes");
    }

    #[test]
    fn rejects_unknown_sort_values() {
        let err = TodoQuery::compile(&params(&[("sortBy", "password"), ("sortOrder", "up")])).unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), vec!["sortBy", "sortOrder"]);
    }

    #[test]
    fn unknown_status_filter_matches_nothing() {
        let query = TodoQuery::compile(&params(&[("status", "Done")])).unwrap();
        assert_eq!(query.status, FieldFilter::Exact("Done".into()));
        assert!(query.apply(sample()).is_empty());
    }
}
