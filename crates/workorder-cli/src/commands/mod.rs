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

pub mod catalog;
pub mod migrate;
pub mod reconcile;
pub mod tasks;

use anyhow::{Context, Result};
use serde::Serialize;
use workorder::{Database, DAL};

use crate::config::WorkOrderConfig;

/// Opened store plus the configuration every command reads from.
pub struct AppContext {
    pub config: WorkOrderConfig,
    pub dal: DAL,
}

impl AppContext {
    /// Opens the configured database and applies pending migrations.
    pub async fn open(config: WorkOrderConfig) -> Result<Self> {
        let database = Database::try_new(&config.database.url, config.database.pool_size)
            .with_context(|| format!("Failed to open database at {}", config.database.url))?;
        database
            .run_migrations()
            .await
            .context("Failed to apply migrations")?;
        Ok(Self {
            config,
            dal: DAL::new(database),
        })
    }
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
