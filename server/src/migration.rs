// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::StoreResult;

/// Moves every stale todo (incomplete, scheduled strictly before `today`)
/// to `today`, appending one migration record per move.
///
/// `today` is computed once by the caller, so a pass that runs across
/// midnight keeps a single consistent `to_date`.
///
/// The log row is written before the todo itself. When the todo update then
/// fails, the audit row stays behind and the unchanged `scheduled_date`
/// means the next pass picks the todo up again. Per-todo failures are
/// skipped; only the initial SELECT failing aborts the pass.
///
/// Returns the number of todos actually moved.
pub async fn migrate_past_todos(pool: &SqlitePool, today: NaiveDate) -> StoreResult<usize> {
    let stale: Vec<(i64, NaiveDate)> = sqlx::query_as(
        "SELECT id, scheduled_date FROM todos
         WHERE completed = FALSE AND scheduled_date IS NOT NULL AND scheduled_date < ?",
    )
    .bind(today)
    .fetch_all(pool)
    .await?;

    let mut migrated = 0;
    for (todo_id, from_date) in stale {
        let logged = sqlx::query(
            "INSERT INTO todo_migrations (todo_id, from_date, to_date, migrated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(todo_id)
        .bind(from_date)
        .bind(today)
        .bind(Utc::now())
        .execute(pool)
        .await;
        if let Err(e) = logged {
            warn!("Skipping todo {}: failed to write migration record: {}", todo_id, e);
            continue;
        }

        let moved = sqlx::query("UPDATE todos SET scheduled_date = ?, updated_at = ? WHERE id = ?")
            .bind(today)
            .bind(Utc::now())
            .bind(todo_id)
            .execute(pool)
            .await;
        if let Err(e) = moved {
            warn!("Skipping todo {}: failed to reschedule: {}", todo_id, e);
            continue;
        }

        migrated += 1;
    }

    info!("Migrated {} todos to {}", migrated, today);
    Ok(migrated)
}
