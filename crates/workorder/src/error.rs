/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Error types for the work-order subsystem.
//!
//! Three layers of errors exist:
//!
//! - [`StorageError`]: anything that went wrong talking to the store. Raised by
//!   the DAL, always aborts the enclosing transaction.
//! - [`ValidationError`]: the caller's input breaks an invariant. Raised before
//!   any write is attempted.
//! - [`WorkOrderError`]: what the services return. Wraps the two above and adds
//!   a not-found case callers can map to a 404.

use thiserror::Error;

use crate::models::work_order::WorkOrderType;

/// Failures raised by the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The pool could not hand out a connection, or the blocking task failed.
    #[error("Connection pool error: {0}")]
    ConnectionPool(String),

    /// A Diesel query failed.
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// A stored value could not be converted into its domain type.
    #[error("Failed to decode stored value: {0}")]
    Decode(String),

    /// A row that the operation needed to modify does not exist.
    #[error("{table} row not found: {id}")]
    MissingRow { table: &'static str, id: String },

    /// Migrations failed to apply.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// The caller cancelled the operation before it committed.
    #[error("Operation cancelled")]
    Cancelled,

    /// The operation's deadline passed before it committed.
    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

/// Input that violates a domain invariant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "Task detail does not match work order type: expected {expected} detail, found {found}"
    )]
    DetailMismatch {
        expected: WorkOrderType,
        found: WorkOrderType,
    },

    #[error("Task is missing its {expected} detail")]
    MissingDetail { expected: WorkOrderType },

    #[error(
        "Resource for view '{view_id}' cannot belong to both inventory {inventory_id} and work order {work_order_id}"
    )]
    ExclusiveOwnership {
        view_id: String,
        inventory_id: String,
        work_order_id: String,
    },

    #[error("Resource for view '{view_id}' declares owner {declared} but is reconciled under {scope}")]
    OwnerMismatch {
        view_id: String,
        declared: String,
        scope: String,
    },

    #[error("View '{view_id}' appears more than once in the desired resource set")]
    DuplicateView { view_id: String },

    #[error("Audit detail for table '{data_table}' belongs to work order {declared}, expected {expected}")]
    AuditWorkOrderMismatch {
        data_table: String,
        declared: String,
        expected: String,
    },

    #[error("Task {task_id} belongs to work order {stored} and cannot be moved to {requested}")]
    WorkOrderChanged {
        task_id: String,
        stored: String,
        requested: String,
    },

    #[error("Field '{field}' must not be empty")]
    EmptyField { field: &'static str },
}

/// Errors returned by the service layer.
#[derive(Debug, Error)]
pub enum WorkOrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Storage failure, tagged with the operation and the owner it ran for.
    #[error("Storage failure during {operation} for {scope}: {source}")]
    Storage {
        operation: &'static str,
        scope: String,
        #[source]
        source: StorageError,
    },

    /// A collaborating service failed on a path that cannot degrade.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl WorkOrderError {
    /// Wraps a storage error with the operation and scope it occurred in.
    ///
    /// Missing rows surface as [`WorkOrderError::NotFound`] so callers do not
    /// need to inspect storage internals.
    pub fn storage(operation: &'static str, scope: impl Into<String>, source: StorageError) -> Self {
        match source {
            StorageError::MissingRow { table, id } => WorkOrderError::NotFound {
                entity: table,
                id,
            },
            source => WorkOrderError::Storage {
                operation,
                scope: scope.into(),
                source,
            },
        }
    }

    /// Returns true for not-found errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkOrderError::NotFound { .. })
    }

    /// Returns true for validation errors.
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkOrderError::Validation(_))
    }
}

/// Failure reported by an external collaborator (lookup service, notifier).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{service} call failed: {message}")]
pub struct CollaboratorError {
    pub service: &'static str,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }
}
