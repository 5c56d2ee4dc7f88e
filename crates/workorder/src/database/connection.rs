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

//! Database connection management.
//!
//! This module provides an async connection pool built on `deadpool-diesel` for
//! SQLite. Every DAL operation borrows a pooled connection and runs its Diesel
//! work inside `interact`, which moves the blocking call onto the runtime's
//! blocking thread pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use workorder::database::Database;
//!
//! let db = Database::try_new("sqlite://./workorder.db", 4)?;
//! db.run_migrations().await?;
//! ```

use deadpool_diesel::sqlite::{
    Manager as SqliteManager, Pool as SqlitePool, Runtime as SqliteRuntime,
};
use tracing::info;

use crate::error::StorageError;

/// Pooled SQLite connection handed out by [`Database::get_connection`].
pub type PooledConnection = deadpool::managed::Object<SqliteManager>;

/// Represents a pool of database connections.
///
/// # Thread Safety
///
/// The `Database` struct is `Clone` and can be safely shared between threads.
/// Each clone references the same underlying connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    url: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("url", &self.url).finish()
    }
}

impl Database {
    /// Creates a new connection pool.
    ///
    /// Accepts a `sqlite://` URL, a file path, a `file:` URI, or `:memory:`.
    ///
    /// # Arguments
    ///
    /// * `connection_string` - The database URL or path
    /// * `max_size` - Maximum number of pooled connections
    pub fn try_new(connection_string: &str, max_size: u32) -> Result<Self, StorageError> {
        let url = Self::build_sqlite_url(connection_string);
        let manager = SqliteManager::new(url.clone(), SqliteRuntime::Tokio1);
        let pool = SqlitePool::builder(manager)
            .max_size(max_size.max(1) as usize)
            .build()
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?;

        info!(url = %url, max_size, "SQLite connection pool initialized");

        Ok(Self { pool, url })
    }

    /// Returns the normalized connection URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Gets a pooled connection.
    pub async fn get_connection(&self) -> Result<PooledConnection, StorageError> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))
    }

    /// Strips the `sqlite://` prefix if present.
    fn build_sqlite_url(connection_string: &str) -> String {
        if let Some(path) = connection_string.strip_prefix("sqlite://") {
            path.to_string()
        } else {
            connection_string.to_string()
        }
    }

    /// Runs pending migrations.
    ///
    /// WAL mode and a busy timeout are set first so concurrent readers are not
    /// rejected while a reconciliation transaction holds the write lock.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        use diesel::prelude::*;
        use diesel_migrations::MigrationHarness;

        let conn = self.get_connection().await?;
        conn.interact(|conn| -> Result<(), StorageError> {
            diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
            diesel::sql_query("PRAGMA busy_timeout=30000;").execute(conn)?;

            conn.run_pending_migrations(crate::database::SQLITE_MIGRATIONS)
                .map_err(|e| StorageError::Migration(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        info!(url = %self.url, "Database migrations applied");
        Ok(())
    }
}
