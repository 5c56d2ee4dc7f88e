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

//! Data Access Layer
//!
//! The [`DAL`] owns the connection pool and hands out short-lived, per-entity
//! views (`dal.work_order()`, `dal.resource()`, ...). Each view method borrows
//! a pooled connection and runs its Diesel work inside `interact`.
//!
//! Multi-statement writes go through [`DAL::transaction`], which checks the
//! caller's [`CallContext`] before taking a connection and hands it to the
//! closure so it can be re-checked between steps. Any error returned from the
//! closure rolls the transaction back.
//!
//! # Example
//!
//! ```rust,ignore
//! use workorder::dal::DAL;
//! use workorder::database::Database;
//!
//! let db = Database::try_new("sqlite://./workorder.db", 4)?;
//! let dal = DAL::new(db);
//!
//! let work_order = dal.work_order().get(work_order_id).await?;
//! ```

use diesel::connection::Connection;
use diesel::sqlite::SqliteConnection;

use crate::call_context::CallContext;
use crate::database::Database;
use crate::error::StorageError;

pub mod inventory;
pub mod models;
pub mod resource;
pub mod work_order;
pub mod work_order_task;

pub use inventory::InventoryDAL;
pub use resource::{ReconcileError, ReconcileOutcome, ResourceDAL};
pub use work_order::WorkOrderDAL;
pub use work_order_task::WorkOrderTaskDAL;

/// The main Data Access Layer struct.
#[derive(Clone, Debug)]
pub struct DAL {
    /// The database connection pool
    pub database: Database,
}

impl DAL {
    /// Creates a new DAL instance.
    pub fn new(database: Database) -> Self {
        DAL { database }
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn work_order(&self) -> WorkOrderDAL<'_> {
        WorkOrderDAL::new(self)
    }

    pub fn work_order_task(&self) -> WorkOrderTaskDAL<'_> {
        WorkOrderTaskDAL::new(self)
    }

    pub fn inventory(&self) -> InventoryDAL<'_> {
        InventoryDAL::new(self)
    }

    pub fn resource(&self) -> ResourceDAL<'_> {
        ResourceDAL::new(self)
    }

    /// Runs a read on a pooled connection.
    pub(crate) async fn interact<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.database.get_connection().await?;
        conn.interact(f)
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?
    }

    /// Runs `f` inside one transaction.
    ///
    /// The context is checked before a connection is taken and passed to `f`
    /// for checks between steps. An error from `f` rolls everything back.
    pub(crate) async fn transaction<T, E, F>(&self, ctx: &CallContext, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut SqliteConnection, &CallContext) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<diesel::result::Error> + From<StorageError> + Send + 'static,
    {
        ctx.check()?;
        let conn = self.database.get_connection().await?;
        let ctx = ctx.clone();
        conn.interact(move |conn| conn.transaction::<T, E, _>(|conn| f(conn, &ctx)))
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?
    }
}
