// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::SqlitePool;

/// Creates and configures the application router.
/// All endpoints live under the `/api/v1` prefix.
pub fn create_router(pool: SqlitePool) -> Router {
    Router::new()
        // Dashboard: 7-day window plus the someday bucket and categories.
        .route("/api/v1/dashboard", get(handlers::get_dashboard))
        // Todos
        .route("/api/v1/todos", post(handlers::create_todo))
        .route("/api/v1/todos/{id}", put(handlers::update_todo))
        .route("/api/v1/todos/{id}", delete(handlers::delete_todo))
        // On-demand migration of stale todos to today.
        .route("/api/v1/todos/migrate", post(handlers::migrate_todos))
        // Categories
        .route("/api/v1/categories", get(handlers::list_categories))
        .route("/api/v1/categories", post(handlers::create_category))
        .route("/api/v1/categories/{id}", put(handlers::update_category))
        .route("/api/v1/categories/{id}", delete(handlers::delete_category))
        // Health check
        .route("/api/v1/health", get(handlers::health))
        // Adds the database pool to the application state
        .with_state(pool)
}
