// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{NaiveDate, Utc};
use common::{CreateTodoPayload, Todo, UpdateTodoPayload};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::categories::category_exists;
use crate::error::{StoreError, StoreResult};

/// Columns selected whenever todos are read back, with the referenced
/// category's name and color joined in.
const SELECT_TODOS: &str = "SELECT t.id, t.title, t.completed, t.category_id,
       c.name AS category_name, c.color AS category_color,
       t.scheduled_date, t.sort_order, t.color, t.recurring_pattern,
       t.parent_id, t.created_at, t.updated_at
    FROM todos t
    LEFT JOIN categories c ON t.category_id = c.id";

/// Inserts a new todo and returns its id.
pub async fn create_todo(pool: &SqlitePool, payload: CreateTodoPayload) -> StoreResult<i64> {
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(StoreError::Validation(
            "Todo title cannot be empty.".to_string(),
        ));
    }
    if let Some(category_id) = payload.category_id {
        ensure_category_resolves(pool, category_id).await?;
    }

    let now = Utc::now();
    let id = sqlx::query(
        "INSERT INTO todos (title, completed, category_id, scheduled_date, sort_order,
                            color, recurring_pattern, created_at, updated_at)
         VALUES (?, FALSE, ?, ?, 0, ?, ?, ?, ?)",
    )
    .bind(&title)
    .bind(payload.category_id)
    .bind(payload.scheduled_date)
    .bind(&payload.color)
    .bind(&payload.recurring_pattern)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!("Todo '{}' created with ID: {}", title, id);
    Ok(id)
}

/// Applies the supplied fields to an existing todo.
///
/// Fields left out of the payload keep their current value; `category_id`,
/// `scheduled_date` and `color` can be cleared with an explicit `null`. The
/// whole change lands in a single UPDATE statement.
pub async fn update_todo(pool: &SqlitePool, id: i64, payload: UpdateTodoPayload) -> StoreResult<()> {
    if payload.is_empty() {
        return Err(StoreError::Validation("No fields to update.".to_string()));
    }
    if !todo_exists(pool, id).await? {
        return Err(StoreError::NotFound(format!(
            "Todo with ID {} not found.",
            id
        )));
    }

    let title = match &payload.title {
        Some(raw) => {
            let title = raw.trim().to_string();
            if title.is_empty() {
                return Err(StoreError::Validation(
                    "Todo title cannot be empty.".to_string(),
                ));
            }
            Some(title)
        }
        None => None,
    };
    if let Some(Some(category_id)) = payload.category_id {
        ensure_category_resolves(pool, category_id).await?;
    }

    let mut query: sqlx::QueryBuilder<sqlx::Sqlite> = sqlx::QueryBuilder::new("UPDATE todos SET ");
    let mut set = query.separated(", ");
    if let Some(title) = title {
        set.push("title = ").push_bind_unseparated(title);
    }
    if let Some(completed) = payload.completed {
        set.push("completed = ").push_bind_unseparated(completed);
    }
    if let Some(category_id) = payload.category_id {
        set.push("category_id = ").push_bind_unseparated(category_id);
    }
    if let Some(scheduled_date) = payload.scheduled_date {
        set.push("scheduled_date = ")
            .push_bind_unseparated(scheduled_date);
    }
    if let Some(sort_order) = payload.sort_order {
        set.push("sort_order = ").push_bind_unseparated(sort_order);
    }
    if let Some(color) = payload.color {
        set.push("color = ").push_bind_unseparated(color);
    }
    set.push("updated_at = ").push_bind_unseparated(Utc::now());
    query.push(" WHERE id = ").push_bind(id);

    query.build().execute(pool).await?;

    debug!("Todo {} updated", id);
    Ok(())
}

/// Deletes a todo. Todos pointing at it through `parent_id` get that
/// reference cleared by the schema; its migration records go with it.
pub async fn delete_todo(pool: &SqlitePool, id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM todos WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!(
            "Todo with ID {} not found.",
            id
        )));
    }

    info!("Todo {} deleted", id);
    Ok(())
}

/// Returns the todos scheduled on exactly `date`, ordered by `sort_order`,
/// then creation time.
pub async fn todos_for_date(pool: &SqlitePool, date: NaiveDate) -> StoreResult<Vec<Todo>> {
    let todos = sqlx::query_as::<_, Todo>(&format!(
        "{} WHERE t.scheduled_date = ? ORDER BY t.sort_order ASC, t.created_at ASC",
        SELECT_TODOS
    ))
    .bind(date)
    .fetch_all(pool)
    .await?;
    Ok(todos)
}

/// Returns the undated "someday" todos grouped by category.
/// SQLite sorts NULL `category_id` first, so uncategorized todos lead the list.
pub async fn someday_todos(pool: &SqlitePool) -> StoreResult<Vec<Todo>> {
    let todos = sqlx::query_as::<_, Todo>(&format!(
        "{} WHERE t.scheduled_date IS NULL
         ORDER BY t.category_id ASC, t.sort_order ASC, t.created_at ASC",
        SELECT_TODOS
    ))
    .fetch_all(pool)
    .await?;
    Ok(todos)
}

async fn todo_exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

async fn ensure_category_resolves(pool: &SqlitePool, category_id: i64) -> StoreResult<()> {
    if !category_exists(pool, category_id).await? {
        return Err(StoreError::Validation(format!(
            "Category with ID {} does not exist.",
            category_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories;
    use crate::database::init_schema;
    use common::CreateCategoryPayload;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Fresh in-memory database per test, pinned to a single connection so
    /// every query sees the same in-memory file.
    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory SQLite");
        init_schema(&pool).await.expect("Failed to create schema");
        pool
    }

    fn todo_payload(title: &str, date: Option<NaiveDate>) -> CreateTodoPayload {
        CreateTodoPayload {
            title: title.to_string(),
            category_id: None,
            scheduled_date: date,
            color: None,
            recurring_pattern: None,
        }
    }

    async fn create_test_category(pool: &SqlitePool, name: &str) -> i64 {
        categories::create_category(
            pool,
            CreateCategoryPayload {
                name: name.to_string(),
                color: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_todo_validation() {
        let pool = setup_test_db().await;

        let err = create_todo(&pool, todo_payload("  ", None)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        // A category reference must resolve at write time.
        let mut payload = todo_payload("Orphan", None);
        payload.category_id = Some(777);
        let err = create_todo(&pool, payload).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_todos_for_date_exact_match_and_order() {
        let pool = setup_test_db().await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let other_date = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();

        let second = create_todo(&pool, todo_payload("Second by order", Some(date)))
            .await
            .unwrap();
        let first = create_todo(&pool, todo_payload("First by order", Some(date)))
            .await
            .unwrap();
        create_todo(&pool, todo_payload("Wrong day", Some(other_date)))
            .await
            .unwrap();
        create_todo(&pool, todo_payload("Someday", None)).await.unwrap();

        update_todo(
            &pool,
            second,
            UpdateTodoPayload {
                sort_order: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        update_todo(
            &pool,
            first,
            UpdateTodoPayload {
                sort_order: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let todos = todos_for_date(&pool, date).await.unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].title, "First by order");
        assert_eq!(todos[1].title, "Second by order");
    }

    #[tokio::test]
    async fn test_todos_for_date_created_at_tiebreak() {
        let pool = setup_test_db().await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        // Same sort_order (0): creation time decides.
        create_todo(&pool, todo_payload("Older", Some(date))).await.unwrap();
        create_todo(&pool, todo_payload("Newer", Some(date))).await.unwrap();

        let todos = todos_for_date(&pool, date).await.unwrap();
        assert_eq!(todos[0].title, "Older");
        assert_eq!(todos[1].title, "Newer");
    }

    #[tokio::test]
    async fn test_todos_for_date_enriched_with_category() {
        let pool = setup_test_db().await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let category_id = create_test_category(&pool, "Work").await;

        let mut payload = todo_payload("Ship release", Some(date));
        payload.category_id = Some(category_id);
        create_todo(&pool, payload).await.unwrap();
        create_todo(&pool, todo_payload("Uncategorized", Some(date)))
            .await
            .unwrap();

        let todos = todos_for_date(&pool, date).await.unwrap();
        let ship = todos.iter().find(|t| t.title == "Ship release").unwrap();
        assert_eq!(ship.category_name.as_deref(), Some("Work"));
        assert_eq!(
            ship.category_color.as_deref(),
            Some(categories::DEFAULT_CATEGORY_COLOR)
        );
        let bare = todos.iter().find(|t| t.title == "Uncategorized").unwrap();
        assert!(bare.category_name.is_none());
        assert!(bare.category_color.is_none());
    }

    #[tokio::test]
    async fn test_someday_todos_nulls_first() {
        let pool = setup_test_db().await;
        let category_id = create_test_category(&pool, "Work").await;

        let mut categorized = todo_payload("Categorized someday", None);
        categorized.category_id = Some(category_id);
        create_todo(&pool, categorized).await.unwrap();
        create_todo(&pool, todo_payload("Uncategorized someday", None))
            .await
            .unwrap();
        create_todo(
            &pool,
            todo_payload("Dated", NaiveDate::from_ymd_opt(2024, 6, 10)),
        )
        .await
        .unwrap();

        let todos = someday_todos(&pool).await.unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].title, "Uncategorized someday");
        assert_eq!(todos[1].title, "Categorized someday");
    }

    #[tokio::test]
    async fn test_update_todo_leaves_unreferenced_fields() {
        let pool = setup_test_db().await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let category_id = create_test_category(&pool, "Work").await;

        let mut payload = todo_payload("Ship release", Some(date));
        payload.category_id = Some(category_id);
        let id = create_todo(&pool, payload).await.unwrap();

        update_todo(
            &pool,
            id,
            UpdateTodoPayload {
                completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let todos = todos_for_date(&pool, date).await.unwrap();
        assert_eq!(todos.len(), 1);
        assert!(todos[0].completed);
        assert_eq!(todos[0].title, "Ship release");
        assert_eq!(todos[0].scheduled_date, Some(date));
        assert_eq!(todos[0].category_id, Some(category_id));
    }

    #[tokio::test]
    async fn test_update_todo_explicit_null_clears_date() {
        let pool = setup_test_db().await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let id = create_todo(&pool, todo_payload("Back to someday", Some(date)))
            .await
            .unwrap();

        update_todo(
            &pool,
            id,
            UpdateTodoPayload {
                scheduled_date: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(todos_for_date(&pool, date).await.unwrap().is_empty());
        let someday = someday_todos(&pool).await.unwrap();
        assert_eq!(someday.len(), 1);
        assert_eq!(someday[0].id, id);
    }

    #[tokio::test]
    async fn test_update_todo_errors() {
        let pool = setup_test_db().await;

        let err = update_todo(
            &pool,
            123,
            UpdateTodoPayload {
                completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let id = create_todo(&pool, todo_payload("Ship release", None))
            .await
            .unwrap();
        let err = update_todo(&pool, id, UpdateTodoPayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = update_todo(
            &pool,
            id,
            UpdateTodoPayload {
                category_id: Some(Some(777)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_todo_clears_children_parent_id() {
        let pool = setup_test_db().await;
        let parent = create_todo(&pool, todo_payload("Parent", None)).await.unwrap();
        let child = create_todo(&pool, todo_payload("Child", None)).await.unwrap();

        // parent_id is only ever set by recurrence tooling; wire it directly.
        sqlx::query("UPDATE todos SET parent_id = ? WHERE id = ?")
            .bind(parent)
            .bind(child)
            .execute(&pool)
            .await
            .unwrap();

        delete_todo(&pool, parent).await.unwrap();

        let todos = someday_todos(&pool).await.unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].id, child);
        assert_eq!(todos[0].parent_id, None);
    }

    #[tokio::test]
    async fn test_delete_todo_missing() {
        let pool = setup_test_db().await;
        let err = delete_todo(&pool, 42).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
