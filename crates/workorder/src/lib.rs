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

//! # workorder
//!
//! Work-order task management for a data-governance platform.
//!
//! A work order is one business process (aggregate data, audit data quality,
//! fuse datasources, ...). It is broken into tasks, and each task carries
//! exactly one typed detail chosen by the work order's type. This crate
//! provides:
//!
//! - **Typed tasks**: [`models::task::WorkOrderTask`] with a
//!   [`models::task_detail::TaskDetail`] enum, validated against the owning
//!   work order before anything is written.
//! - **Resource reconciliation**: [`services::ResourceService`] makes the
//!   resources bound to an inventory or a work order equal a desired set,
//!   keyed by view id, in one transaction.
//! - **Status aggregation**: [`status::aggregate_status`] collapses many
//!   statuses with `Failed > Running > Completed > Unset`, and
//!   [`services::CatalogStatusService`] applies it per task family and across
//!   families for a catalog table.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use workorder::{CallContext, Database, DAL, LoggingNotifier, ResourceService};
//! use workorder::models::resource::ResourceOwner;
//!
//! workorder::init_logging(None);
//!
//! let database = Database::try_new("sqlite://./workorder.db", 4)?;
//! database.run_migrations().await?;
//! let dal = DAL::new(database);
//!
//! let resources = ResourceService::new(dal.clone(), Arc::new(LoggingNotifier));
//! let outcome = resources
//!     .reconcile_resources(&CallContext::background(), ResourceOwner::Inventory(id), desired)
//!     .await?;
//! ```
//!
//! Storage is SQLite through Diesel and a deadpool connection pool. Every
//! write is one transaction and honours the caller's [`CallContext`].

pub mod call_context;
pub mod dal;
pub mod database;
pub mod error;
pub mod external;
pub mod models;
pub mod reconciler;
pub mod services;
pub mod status;

pub use call_context::CallContext;
pub use dal::DAL;
pub use database::{Database, UniversalTimestamp, UniversalUuid};
pub use error::{CollaboratorError, StorageError, ValidationError, WorkOrderError};
pub use external::{
    BroadcastNotifier, ComprehensionPlanLookup, DatasourceLookup, DepartmentLookup,
    LoggingNotifier, NoComprehensionPlans, ResourceChangeNotifier, StaticDirectory,
    WorkOrderLookup,
};
pub use services::{CatalogStatusService, ResourceService, TaskService};
pub use status::{
    aggregate_status, aggregate_task_statuses, combine_family_statuses, ProcessingStatus,
};

/// Initializes the logging system.
///
/// Installs a `tracing-subscriber` formatter filtered by `RUST_LOG`, falling
/// back to `level` (or `info`) when `RUST_LOG` is unset. Calling it more than
/// once is harmless; later calls leave the first subscriber in place.
///
/// # Arguments
///
/// * `level` - Default filter directive, e.g. `"debug"` or `"workorder=trace"`
pub fn init_logging(level: Option<&str>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init();
}
