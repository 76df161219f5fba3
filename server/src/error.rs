// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use thiserror::Error;

/// Error taxonomy of the scheduling store and the migration engine.
///
/// The HTTP layer maps each kind to a status code; inside the core the kinds
/// separate caller mistakes from storage trouble.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed or missing input: empty title, unresolvable category, ...
    #[error("{0}")]
    Validation(String),

    /// The operation targets an id that does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The operation is blocked by existing references.
    #[error("{0}")]
    Conflict(String),

    /// The underlying engine is unreachable or a query failed.
    #[error("database error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
