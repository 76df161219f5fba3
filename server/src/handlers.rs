// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::error::StoreError;
use crate::{categories, database, migration, todos};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use common::{
    Category, CreateCategoryPayload, CreateTodoPayload, DashboardData, DayTodos,
    UpdateCategoryPayload, UpdateTodoPayload,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, error, info};

/// Query parameters of the dashboard endpoint.
#[derive(Deserialize, Debug, Default)]
pub struct DashboardQuery {
    /// Signed day offset of the 7-day window; 0 anchors the window at today.
    #[serde(rename = "weekOffset", default)]
    pub week_offset: i64,
}

/// Handler for the dashboard: the 7-day window starting at
/// `today + weekOffset`, the someday bucket and the category list.
pub async fn get_dashboard(
    State(pool): State<SqlitePool>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<DashboardData>, AppError> {
    let today = Utc::now().date_naive();
    let week_start = today + Duration::days(params.week_offset);

    let mut weekly_todos = Vec::with_capacity(7);
    for day in 0..7 {
        let date = week_start + Duration::days(day);
        weekly_todos.push(DayTodos {
            date,
            day: date.format("%A").to_string(),
            todos: todos::todos_for_date(&pool, date).await?,
        });
    }

    let someday_todos = todos::someday_todos(&pool).await?;
    let categories = categories::list_categories(&pool).await?;

    debug!(
        "Dashboard built for week starting {} ({} someday todos)",
        week_start,
        someday_todos.len()
    );

    Ok(Json(DashboardData {
        weekly_todos,
        someday_todos,
        categories,
        today_date: today,
        week_start_date: week_start,
    }))
}

/// Handler for creating a new todo.
pub async fn create_todo(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateTodoPayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let id = todos::create_todo(&pool, payload).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Handler for partially updating a todo.
pub async fn update_todo(
    State(pool): State<SqlitePool>,
    Path(todo_id): Path<i64>,
    Json(payload): Json<UpdateTodoPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    todos::update_todo(&pool, todo_id, payload).await?;
    Ok(Json(
        serde_json::json!({ "message": "Todo updated successfully." }),
    ))
}

/// Handler for deleting a todo by ID.
pub async fn delete_todo(
    State(pool): State<SqlitePool>,
    Path(todo_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    todos::delete_todo(&pool, todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for the on-demand migration pass: stale todos move to today.
pub async fn migrate_todos(
    State(pool): State<SqlitePool>,
) -> Result<Json<serde_json::Value>, AppError> {
    let today = Utc::now().date_naive();
    let migrated = migration::migrate_past_todos(&pool, today).await?;

    info!("On-demand migration moved {} todos", migrated);

    Ok(Json(serde_json::json!({
        "message": format!("Migrated {} todos to today.", migrated),
        "migrated_count": migrated,
    })))
}

/// Handler for listing all categories.
pub async fn list_categories(
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = categories::list_categories(&pool).await?;
    Ok(Json(categories))
}

/// Handler for creating a new category.
pub async fn create_category(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let id = categories::create_category(&pool, payload).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Handler for partially updating a category.
pub async fn update_category(
    State(pool): State<SqlitePool>,
    Path(category_id): Path<i64>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    categories::update_category(&pool, category_id, payload).await?;
    Ok(Json(
        serde_json::json!({ "message": "Category updated successfully." }),
    ))
}

/// Handler for deleting a category. Blocked while todos reference it.
pub async fn delete_category(
    State(pool): State<SqlitePool>,
    Path(category_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    categories::delete_category(&pool, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for the health probe: answers once the store does.
pub async fn health(State(pool): State<SqlitePool>) -> Result<Json<serde_json::Value>, AppError> {
    database::health_check(&pool)
        .await
        .map_err(StoreError::from)?;
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now(),
    })))
}

// --- Custom Error Handling ---

/// Our custom error type for the application: a status code plus a
/// human-readable message.
#[derive(Debug)]
pub struct AppError {
    code: StatusCode,
    message: String,
}

/// Maps the store's error taxonomy onto HTTP status codes. Storage errors
/// are logged in full and replaced with a generic message.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let (code, message) = match &err {
            StoreError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            StoreError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            StoreError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            StoreError::Storage(_) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred.".to_string(),
                )
            }
        };
        Self { code, message }
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        (
            self.code,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
