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

//! Collaborator interfaces.
//!
//! Services take these as `Arc<dyn Trait>` in their constructors so tests can
//! substitute fakes:
//!
//! - [`WorkOrderLookup`]: resolves a task's owning work order. The [`DAL`]
//!   implements it against the local `work_orders` table.
//! - [`ResourceChangeNotifier`]: announces committed resource changes.
//! - [`DatasourceLookup`], [`DepartmentLookup`], [`ComprehensionPlanLookup`]:
//!   display enrichment for the aggregation info report.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::info;

use crate::dal::DAL;
use crate::database::universal_types::UniversalUuid;
use crate::error::CollaboratorError;
use crate::models::resource::ResourceChangeEvent;
use crate::models::work_order::WorkOrder;

/// Resolves work orders by id.
#[async_trait]
pub trait WorkOrderLookup: Send + Sync {
    /// Returns `Ok(None)` when the work order does not exist.
    async fn get_work_order(&self, id: UniversalUuid) -> Result<Option<WorkOrder>, CollaboratorError>;
}

#[async_trait]
impl WorkOrderLookup for DAL {
    async fn get_work_order(&self, id: UniversalUuid) -> Result<Option<WorkOrder>, CollaboratorError> {
        self.work_order()
            .find(id)
            .await
            .map_err(|e| CollaboratorError::new("work_order_lookup", e.to_string()))
    }
}

/// Announces resource changes to other modules.
#[async_trait]
pub trait ResourceChangeNotifier: Send + Sync {
    async fn publish(&self, event: ResourceChangeEvent) -> Result<(), CollaboratorError>;
}

/// Publishes events on a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<ResourceChangeEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResourceChangeEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl ResourceChangeNotifier for BroadcastNotifier {
    async fn publish(&self, event: ResourceChangeEvent) -> Result<(), CollaboratorError> {
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|_| CollaboratorError::new("resource_notifier", "no active subscribers"))
    }
}

/// Writes events to the log instead of a channel.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl ResourceChangeNotifier for LoggingNotifier {
    async fn publish(&self, event: ResourceChangeEvent) -> Result<(), CollaboratorError> {
        info!(
            owner = %event.owner,
            inserted = event.inserted.len(),
            updated = event.updated.len(),
            deleted = event.deleted.len(),
            "Resources changed"
        );
        Ok(())
    }
}

/// Descriptive data about an external datasource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceInfo {
    pub id: String,
    pub name: String,
    /// Engine kind, e.g. "mysql" or "hive"
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentInfo {
    pub id: String,
    pub name: String,
}

/// A comprehension plan covering a catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComprehensionPlan {
    pub id: String,
    pub name: String,
    pub status: String,
}

#[async_trait]
pub trait DatasourceLookup: Send + Sync {
    async fn get_datasource(&self, id: &str) -> Result<Option<DatasourceInfo>, CollaboratorError>;
}

#[async_trait]
pub trait DepartmentLookup: Send + Sync {
    async fn get_department(&self, id: &str) -> Result<Option<DepartmentInfo>, CollaboratorError>;
}

#[async_trait]
pub trait ComprehensionPlanLookup: Send + Sync {
    async fn get_plan_for_table(
        &self,
        table_name: &str,
    ) -> Result<Option<ComprehensionPlan>, CollaboratorError>;
}

/// In-memory datasource and department directory, usually built from config.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    datasources: HashMap<String, DatasourceInfo>,
    departments: HashMap<String, DepartmentInfo>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_datasource(mut self, info: DatasourceInfo) -> Self {
        self.datasources.insert(info.id.clone(), info);
        self
    }

    pub fn with_department(mut self, info: DepartmentInfo) -> Self {
        self.departments.insert(info.id.clone(), info);
        self
    }
}

#[async_trait]
impl DatasourceLookup for StaticDirectory {
    async fn get_datasource(&self, id: &str) -> Result<Option<DatasourceInfo>, CollaboratorError> {
        Ok(self.datasources.get(id).cloned())
    }
}

#[async_trait]
impl DepartmentLookup for StaticDirectory {
    async fn get_department(&self, id: &str) -> Result<Option<DepartmentInfo>, CollaboratorError> {
        Ok(self.departments.get(id).cloned())
    }
}

/// Lookup for deployments without a comprehension module.
#[derive(Debug, Clone, Default)]
pub struct NoComprehensionPlans;

#[async_trait]
impl ComprehensionPlanLookup for NoComprehensionPlans {
    async fn get_plan_for_table(
        &self,
        _table_name: &str,
    ) -> Result<Option<ComprehensionPlan>, CollaboratorError> {
        Ok(None)
    }
}
