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

use std::time::Duration;

use serde::{Deserialize, Serialize};
use workorder::external::{DatasourceInfo, DepartmentInfo};
use workorder::{CallContext, StaticDirectory};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkOrderConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub operations: OperationsConfig,
    #[serde(default)]
    pub datasources: Vec<DatasourceEntry>,
    #[serde(default)]
    pub departments: Vec<DepartmentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationsConfig {
    /// Deadline applied to every write issued by the CLI
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// A datasource known to the local directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasourceEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentEntry {
    pub id: String,
    pub name: String,
}

fn default_pool_size() -> u32 {
    4
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./workorder.db".to_string(),
            pool_size: default_pool_size(),
        }
    }
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl WorkOrderConfig {
    /// Builds the in-memory directory used to enrich catalog reports.
    pub fn directory(&self) -> StaticDirectory {
        let directory = self
            .datasources
            .iter()
            .fold(StaticDirectory::new(), |dir, ds| {
                dir.with_datasource(DatasourceInfo {
                    id: ds.id.clone(),
                    name: ds.name.clone(),
                    kind: ds.kind.clone(),
                })
            });
        self.departments.iter().fold(directory, |dir, dept| {
            dir.with_department(DepartmentInfo {
                id: dept.id.clone(),
                name: dept.name.clone(),
            })
        })
    }

    /// A call context carrying the configured deadline.
    pub fn call_context(&self) -> CallContext {
        CallContext::with_timeout(Duration::from_millis(self.operations.timeout_ms))
    }
}
