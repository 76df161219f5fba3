// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::Utc;
use common::{Category, CreateCategoryPayload, UpdateCategoryPayload};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// Color given to a category created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#6b7280";

/// Inserts a new category and returns its id.
///
/// The name must be non-empty and unique store-wide; the color falls back to
/// [`DEFAULT_CATEGORY_COLOR`] when absent or blank.
pub async fn create_category(
    pool: &SqlitePool,
    payload: CreateCategoryPayload,
) -> StoreResult<i64> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(StoreError::Validation(
            "Category name cannot be empty.".to_string(),
        ));
    }
    if name_taken(pool, &name, None).await? {
        return Err(StoreError::Validation(format!(
            "A category named '{}' already exists.",
            name
        )));
    }

    let color = payload
        .color
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string());
    let now = Utc::now();

    let id = sqlx::query(
        "INSERT INTO categories (name, color, sort_order, created_at, updated_at)
         VALUES (?, ?, 0, ?, ?)",
    )
    .bind(&name)
    .bind(&color)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!("Category '{}' created with ID: {}", name, id);
    Ok(id)
}

/// Applies the supplied fields to an existing category; everything else is
/// left untouched.
pub async fn update_category(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateCategoryPayload,
) -> StoreResult<()> {
    if payload.is_empty() {
        return Err(StoreError::Validation("No fields to update.".to_string()));
    }
    if !category_exists(pool, id).await? {
        return Err(StoreError::NotFound(format!(
            "Category with ID {} not found.",
            id
        )));
    }

    let name = match &payload.name {
        Some(raw) => {
            let name = raw.trim().to_string();
            if name.is_empty() {
                return Err(StoreError::Validation(
                    "Category name cannot be empty.".to_string(),
                ));
            }
            if name_taken(pool, &name, Some(id)).await? {
                return Err(StoreError::Validation(format!(
                    "A category named '{}' already exists.",
                    name
                )));
            }
            Some(name)
        }
        None => None,
    };

    let mut query: sqlx::QueryBuilder<sqlx::Sqlite> =
        sqlx::QueryBuilder::new("UPDATE categories SET ");
    let mut set = query.separated(", ");
    if let Some(name) = name {
        set.push("name = ").push_bind_unseparated(name);
    }
    if let Some(color) = payload.color {
        set.push("color = ").push_bind_unseparated(color);
    }
    if let Some(sort_order) = payload.sort_order {
        set.push("sort_order = ").push_bind_unseparated(sort_order);
    }
    set.push("updated_at = ").push_bind_unseparated(Utc::now());
    query.push(" WHERE id = ").push_bind(id);

    query.build().execute(pool).await?;

    debug!("Category {} updated", id);
    Ok(())
}

/// Deletes a category. Rejected while any todo still references it; the
/// blocking count is reported back to the caller.
pub async fn delete_category(pool: &SqlitePool, id: i64) -> StoreResult<()> {
    let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE category_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if in_use > 0 {
        return Err(StoreError::Conflict(format!(
            "Cannot delete category: {} todos are using this category.",
            in_use
        )));
    }

    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!(
            "Category with ID {} not found.",
            id
        )));
    }

    info!("Category {} deleted", id);
    Ok(())
}

/// Returns all categories ordered by `sort_order`, then `name`.
pub async fn list_categories(pool: &SqlitePool) -> StoreResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT * FROM categories ORDER BY sort_order ASC, name ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

/// True when the category id resolves to a row.
pub(crate) async fn category_exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// True when another category (excluding `exclude_id`) already uses `name`.
async fn name_taken(
    pool: &SqlitePool,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let count: i64 = match exclude_id {
        Some(id) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE name = ? AND id != ?")
                .bind(name)
                .bind(id)
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE name = ?")
                .bind(name)
                .fetch_one(pool)
                .await?
        }
    };
    Ok(count > 0)
}
