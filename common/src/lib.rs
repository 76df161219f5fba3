// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Represents a category (topic) used to group todos.
///
/// `sort_order` drives display ordering; ties are broken by `name` so the
/// category list always comes back in a deterministic order.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Represents a single todo item.
///
/// We use `NaiveDate` for `scheduled_date` because we are only interested in
/// the day, without a timezone. `None` means the todo lives in the undated
/// "someday" bucket.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub completed: bool,

    /// Weak reference to a category; cleared when the category goes away.
    pub category_id: Option<i64>,

    /// Name of the referenced category, joined in by read queries.
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,

    /// Color of the referenced category, joined in by read queries.
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_color: Option<String>,

    pub scheduled_date: Option<NaiveDate>,
    pub sort_order: i64,

    /// Per-todo color override; falls back to the category color in the UI.
    pub color: Option<String>,

    /// Reserved for recurrence ('daily', 'weekly', ...). Nothing acts on it.
    pub recurring_pattern: Option<String>,

    /// Weak reference to the originating todo of a recurrence chain;
    /// cleared when that todo is deleted.
    pub parent_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One date transition of one todo, recorded by the migration engine.
///
/// Rows are append-only: the core never updates or deletes them. They only
/// disappear together with their todo.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct TodoMigration {
    pub id: i64,
    pub todo_id: i64,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub migrated_at: DateTime<Utc>,
}

/// Structure used to receive todo creation data from the API.
/// `scheduled_date` is optional: absent means a "someday" todo.
#[derive(Deserialize, Debug)]
pub struct CreateTodoPayload {
    pub title: String,
    pub category_id: Option<i64>,
    pub scheduled_date: Option<NaiveDate>,
    pub color: Option<String>,
    pub recurring_pattern: Option<String>,
}

/// Partial update for a todo.
///
/// An outer `None` means "leave the field untouched". For the nullable
/// columns (`category_id`, `scheduled_date`, `color`) an explicit JSON
/// `null` deserializes to `Some(None)` and clears the column.
#[derive(Deserialize, Debug, Default)]
pub struct UpdateTodoPayload {
    pub title: Option<String>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub scheduled_date: Option<Option<NaiveDate>>,
    pub sort_order: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
}

impl UpdateTodoPayload {
    /// True when the request supplied no fields at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.completed.is_none()
            && self.category_id.is_none()
            && self.scheduled_date.is_none()
            && self.sort_order.is_none()
            && self.color.is_none()
    }
}

/// Structure used to receive category creation data from the API.
/// The color is optional; the store falls back to a fixed default.
#[derive(Deserialize, Debug)]
pub struct CreateCategoryPayload {
    pub name: String,
    pub color: Option<String>,
}

/// Partial update for a category; only supplied fields change.
#[derive(Deserialize, Debug, Default)]
pub struct UpdateCategoryPayload {
    pub name: Option<String>,
    pub color: Option<String>,
    pub sort_order: Option<i64>,
}

impl UpdateCategoryPayload {
    /// True when the request supplied no fields at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none() && self.sort_order.is_none()
    }
}

/// Todos of one calendar day within the 7-day dashboard window.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DayTodos {
    pub date: NaiveDate,
    /// English weekday name ("Monday", ...).
    pub day: String,
    pub todos: Vec<Todo>,
}

/// Complete dashboard payload: the 7-day window, the someday bucket and the
/// category list, anchored at `week_start_date`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DashboardData {
    pub weekly_todos: Vec<DayTodos>,
    pub someday_todos: Vec<Todo>,
    pub categories: Vec<Category>,
    pub today_date: NaiveDate,
    pub week_start_date: NaiveDate,
}

/// Distinguishes an absent PATCH field from an explicit `null`: the outer
/// `Option` carries presence, the inner one the value.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_todo_payload_distinguishes_null_from_absent() {
        let payload: UpdateTodoPayload =
            serde_json::from_str(r#"{ "scheduled_date": null }"#).unwrap();
        assert_eq!(payload.scheduled_date, Some(None));
        assert!(payload.category_id.is_none());
        assert!(payload.title.is_none());

        let payload: UpdateTodoPayload =
            serde_json::from_str(r#"{ "scheduled_date": "2024-06-10" }"#).unwrap();
        assert_eq!(
            payload.scheduled_date,
            Some(Some(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()))
        );
    }

    #[test]
    fn empty_update_payloads_report_empty() {
        let payload: UpdateTodoPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.is_empty());

        let payload: UpdateCategoryPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.is_empty());

        let payload: UpdateTodoPayload = serde_json::from_str(r#"{ "completed": true }"#).unwrap();
        assert!(!payload.is_empty());
    }
}
