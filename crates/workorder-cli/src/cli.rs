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

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use workorder::UniversalUuid;

#[derive(Parser, Debug)]
#[command(
    name = "workorder",
    version,
    about = "Manage work-order tasks, aggregation resources and catalog status",
    long_about = "Reconcile aggregation resources, inspect work-order tasks and report catalog processing status against a SQLite store"
)]
pub struct Cli {
    /// Configuration file (defaults to WORKORDER_CONFIG, then the search paths)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured database URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Make an owner's resources equal the descriptors in a JSON file
    Reconcile {
        /// Reconcile the resources of this inventory
        #[arg(long, conflicts_with = "work_order", required_unless_present = "work_order")]
        inventory: Option<UniversalUuid>,

        /// Reconcile the resources of this work order
        #[arg(long)]
        work_order: Option<UniversalUuid>,

        /// JSON array of resource descriptors; an empty array removes everything
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List the tasks of a work order
    Tasks {
        #[arg(long)]
        work_order: UniversalUuid,

        /// Only tasks with one of these statuses (repeatable)
        #[arg(long = "status")]
        statuses: Vec<String>,

        /// Substring match on the task name
        #[arg(long)]
        keyword: Option<String>,

        #[arg(long, default_value_t = 0)]
        offset: i64,

        /// Page size; 0 returns every task
        #[arg(long, default_value_t = 0)]
        limit: i64,
    },

    /// Report the processing status of a catalog table
    CatalogStatus {
        table: String,

        /// Print the full aggregation report instead of the status summary
        #[arg(long)]
        details: bool,
    },

    /// Recompute and store a work order's processing status
    RefreshStatus { work_order_id: UniversalUuid },
}

impl Cli {
    /// Default log filter derived from the verbosity flags.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
