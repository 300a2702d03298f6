use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::todo::{NewTodo, TodoPatch, TodoStatus, CATEGORY_MAX_CHARS, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};

const TITLE_MESSAGE: &str = "Title must be between 1 and 100 characters";
const DESCRIPTION_MESSAGE: &str = "Description cannot exceed 500 characters";
const STATUS_MESSAGE: &str = "Invalid status";
const CATEGORY_MESSAGE: &str = "Category cannot exceed 50 characters";
const DUE_DATE_MESSAGE: &str = "Invalid due date format";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field violation found in one request, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: &str, message: &str) {
        self.0.push(FieldError { field: field.to_string(), message: message.to_string() });
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn errors(&self) -> &[FieldError] { &self.0 }
    pub fn fields(&self) -> impl Iterator<Item = &str> { self.0.iter().map(|e| e.field.as_str()) }

    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed:")?;
        for error in &self.0 {
            write!(f, " {}: {};", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw create/update body. Outer `Option` records whether the key was sent at
/// all, so `{"category": null}` and `{}` stay distinguishable. Values stay
/// untyped until validation so a wrongly typed field is reported against
/// that field instead of failing the whole body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoInput {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub status: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Value>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl TodoInput {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: Some(Value::String(title.into())), ..Self::default() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Value::String(description.into()));
        self
    }

    pub fn with_status(mut self, status: TodoStatus) -> Self {
        self.status = Some(Value::String(status.as_str().to_string()));
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(Value::String(category.into()));
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(Value::String(due_date.to_rfc3339_opts(SecondsFormat::Millis, true)));
        self
    }

    /// Validates a create request. All violations are collected before failing.
    pub fn into_new_todo(self) -> Result<NewTodo, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = check_title(self.title.as_ref(), &mut errors).unwrap_or_default();
        let description = check_bounded(
            self.description.as_ref(),
            DESCRIPTION_MAX_CHARS,
            "description",
            DESCRIPTION_MESSAGE,
            &mut errors,
        )
        .flatten();
        let status = match &self.status {
            None => Some(TodoStatus::Pending),
            Some(raw) => check_status(raw, &mut errors),
        };
        let category =
            check_bounded(self.category.as_ref(), CATEGORY_MAX_CHARS, "category", CATEGORY_MESSAGE, &mut errors)
                .flatten();
        let due_date = match &self.due_date {
            None => None,
            Some(raw) => check_due_date(raw, &mut errors).flatten(),
        };

        errors.into_result(NewTodo {
            title,
            description,
            status: status.unwrap_or_default(),
            category,
            due_date,
        })
    }

    /// Validates an update request. Only keys present in the body are checked.
    pub fn into_patch(self) -> Result<TodoPatch, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = self.title.as_ref().and_then(|raw| check_title(Some(raw), &mut errors));
        let description = check_bounded(
            self.description.as_ref(),
            DESCRIPTION_MAX_CHARS,
            "description",
            DESCRIPTION_MESSAGE,
            &mut errors,
        );
        let status = self.status.as_ref().and_then(|raw| check_status(raw, &mut errors));
        let category =
            check_bounded(self.category.as_ref(), CATEGORY_MAX_CHARS, "category", CATEGORY_MESSAGE, &mut errors);
        let due_date = self.due_date.as_ref().and_then(|raw| check_due_date(raw, &mut errors));

        errors.into_result(TodoPatch { title, description, status, category, due_date })
    }
}

/// Reads a body value as text. Scalars are coerced (`123` reads as `"123"`);
/// `Some(None)` is an explicit null and `None` a value that is not text.
fn as_text(raw: &Value) -> Option<Option<String>> {
    match raw {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        Value::Number(n) => Some(Some(n.to_string())),
        Value::Bool(b) => Some(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn check_title(raw: Option<&Value>, errors: &mut ValidationErrors) -> Option<String> {
    let text = raw.and_then(as_text).flatten().unwrap_or_default();
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if (1..=TITLE_MAX_CHARS).contains(&len) {
        Some(trimmed.to_string())
    } else {
        errors.push("title", TITLE_MESSAGE);
        None
    }
}

/// `None` when the key is absent or invalid, `Some(None)` when it is null.
fn check_bounded(
    raw: Option<&Value>,
    max: usize,
    field: &str,
    message: &str,
    errors: &mut ValidationErrors,
) -> Option<Option<String>> {
    let text = match raw.map(as_text)? {
        None => {
            errors.push(field, message);
            return None;
        }
        Some(text) => text,
    };
    match text {
        None => Some(None),
        Some(text) if text.trim().chars().count() <= max => Some(Some(text.trim().to_string())),
        Some(_) => {
            errors.push(field, message);
            None
        }
    }
}

fn check_status(raw: &Value, errors: &mut ValidationErrors) -> Option<TodoStatus> {
    let status = as_text(raw).flatten().and_then(|label| TodoStatus::parse(&label));
    if status.is_none() {
        errors.push("status", STATUS_MESSAGE);
    }
    status
}

/// `Some(None)` means an explicit falsy value that clears the due date.
fn check_due_date(raw: &Value, errors: &mut ValidationErrors) -> Option<Option<DateTime<Utc>>> {
    if is_falsy(raw) {
        return Some(None);
    }
    match raw.as_str().and_then(parse_due_date) {
        Some(due_date) => Some(Some(due_date)),
        None => {
            errors.push("dueDate", DUE_DATE_MESSAGE);
            None
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Parses an ISO-8601 date or date-time. Values without an offset are read as UTC.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn input(body: Value) -> TodoInput { serde_json::from_value(body).unwrap() }

    #[test]
    fn create_defaults_status_and_due_date() {
        let new = input(json!({ "title": "  Call dentist  " })).into_new_todo().unwrap();
        assert_eq!(new.title, "Call dentist");
        assert_eq!(new.status, TodoStatus::Pending);
        assert_eq!(new.due_date, None);
        assert_eq!(new.description, None);
    }

    #[test]
    fn title_bounds_are_inclusive_after_trim() {
        assert!(input(json!({ "title": "a".repeat(100) })).into_new_todo().is_ok());
        assert!(input(json!({ "title": format!("  {}  ", "a".repeat(100)) })).into_new_todo().is_ok());

        let err = input(json!({ "title": "a".repeat(101) })).into_new_todo().unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), vec!["title"]);

        let err = input(json!({ "title": "   " })).into_new_todo().unwrap_err();
        assert_eq!(err.errors()[0].message, TITLE_MESSAGE);
    }

    #[test]
    fn every_violation_is_reported() {
        let err = input(json!({
            "description": "d".repeat(501),
            "status": "Done",
            "category": "c".repeat(51),
            "dueDate": "next tuesday"
        }))
        .into_new_todo()
        .unwrap_err();

        assert_eq!(
            err.fields().collect::<Vec<_>>(),
            vec!["title", "description", "status", "category", "dueDate"]
        );
    }

    #[test]
    fn falsy_due_date_is_null_on_create() {
        for falsy in [json!(null), json!(""), json!(false), json!(0)] {
            let new = input(json!({ "title": "x", "dueDate": falsy })).into_new_todo().unwrap();
            assert_eq!(new.due_date, None);
        }
    }

    #[test]
    fn patch_validates_only_present_fields() {
        let patch = input(json!({ "status": "In Progress" })).into_patch().unwrap();
        assert_eq!(patch.status, Some(TodoStatus::InProgress));
        assert_eq!(patch.title, None);
        assert_eq!(patch.description, None);
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch = input(json!({ "category": null, "dueDate": null })).into_patch().unwrap();
        assert_eq!(patch.category, Some(None));
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.description, None);

        let err = input(json!({ "title": null, "status": null })).into_patch().unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), vec!["title", "status"]);
    }

    #[test]
    fn wrongly_typed_fields_are_itemized() {
        let err = input(json!({ "title": "ok", "status": 5, "category": "c".repeat(51) }))
            .into_new_todo()
            .unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), vec!["status", "category"]);
        assert_eq!(err.errors()[0].message, STATUS_MESSAGE);

        let err = input(json!({ "description": ["x"], "category": { "a": 1 } })).into_patch().unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), vec!["description", "category"]);
    }

    #[test]
    fn scalar_text_fields_are_coerced() {
        let new = input(json!({ "title": 123, "category": true })).into_new_todo().unwrap();
        assert_eq!(new.title, "123");
        assert_eq!(new.category.as_deref(), Some("true"));
    }

    #[test]
    fn due_date_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_due_date("2025-03-01"), Some(expected));
        assert_eq!(parse_due_date("2025-03-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_due_date("2025-03-01T02:00:00+02:00"), Some(expected));
        assert_eq!(parse_due_date("2025-03-01T00:00:00.000"), Some(expected));
        assert_eq!(parse_due_date("03/01/2025"), None);
    }
}
