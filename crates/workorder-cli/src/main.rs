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

mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use workorder::models::task::TaskFilter;

use cli::{Cli, Commands};
use commands::{catalog, migrate, reconcile, tasks, AppContext};
use config::{ConfigError, ConfigLoader, WorkOrderConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    workorder::init_logging(Some(cli.log_level()));

    let loader = ConfigLoader::new();
    let mut config = match loader.load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(ConfigError::ConfigNotFound) => {
            debug!(searched = ?loader.get_search_paths(), "No configuration file found; using defaults");
            WorkOrderConfig::default()
        }
        Err(e) => return Err(e.into()),
    };
    if let Some(url) = cli.database_url.clone() {
        config.database.url = url;
    }

    let app = AppContext::open(config).await?;

    match cli.command {
        Commands::Migrate => migrate::migrate(&app)?,
        Commands::Reconcile {
            inventory,
            work_order,
            ref file,
        } => {
            let owner = reconcile::owner_from_flags(inventory, work_order)?;
            reconcile::reconcile(&app, owner, file).await?;
        }
        Commands::Tasks {
            work_order,
            ref statuses,
            ref keyword,
            offset,
            limit,
        } => {
            let filter = TaskFilter {
                work_order_id: Some(work_order),
                keyword: keyword.clone(),
                statuses: statuses.clone(),
                work_order_type: None,
                offset,
                limit,
            };
            tasks::list_tasks(&app, filter).await?;
        }
        Commands::CatalogStatus { ref table, details } => {
            catalog::catalog_status(&app, table, details).await?;
        }
        Commands::RefreshStatus { work_order_id } => {
            tasks::refresh_status(&app, work_order_id).await?;
        }
    }

    Ok(())
}
