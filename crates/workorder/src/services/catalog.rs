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

//! Catalog status and aggregation info.
//!
//! A catalog entry is identified by its table name. Tasks are matched to it
//! through their detail rows: aggregation details by target table, quality
//! audit and fusion details by data table.
//!
//! The processing status combines the quality audit family and the fusion
//! family. The audit family is reduced over the matching audit items, since
//! each item tracks one table; the fusion family over its tasks.
//!
//! Fetching any task family is fail-fast. Enrichment lookups (departments,
//! datasources, comprehension plans) only ever log a warning and leave the
//! field empty.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::database::universal_types::UniversalUuid;
use crate::error::WorkOrderError;
use crate::external::{
    ComprehensionPlan, ComprehensionPlanLookup, DatasourceInfo, DatasourceLookup,
    DepartmentLookup,
};
use crate::models::task::{TableMatch, TaskStatus, WorkOrderTask};
use crate::services::tasks::TaskService;
use crate::status::{aggregate_status, combine_family_statuses, ProcessingStatus};

/// Per-family and combined status of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProcessingStatus {
    pub quality_audit: ProcessingStatus,
    pub fusion: ProcessingStatus,
    pub combined: ProcessingStatus,
}

/// Status and counts for one task family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyProgress {
    pub status: ProcessingStatus,
    pub total_count: u64,
    pub running_count: u64,
    pub completed_count: u64,
    pub failed_count: u64,
}

impl FamilyProgress {
    /// Counts statuses in one pass. Unknown statuses count toward the total only.
    pub fn from_statuses<'s>(statuses: impl IntoIterator<Item = &'s str>) -> Self {
        let mut progress = FamilyProgress::default();
        let mut seen = Vec::new();
        for status in statuses {
            progress.total_count += 1;
            match TaskStatus::from_str(status) {
                Some(TaskStatus::Running) => progress.running_count += 1,
                Some(TaskStatus::Completed) => progress.completed_count += 1,
                Some(TaskStatus::Failed) => progress.failed_count += 1,
                None => {}
            }
            seen.push(ProcessingStatus::from_str(status));
        }
        progress.status = aggregate_status(seen);
        progress
    }
}

/// One aggregated unit feeding the catalog table, with display names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSource {
    pub task_id: Option<UniversalUuid>,
    pub task_name: String,
    pub status: String,
    pub department_id: String,
    pub department_name: String,
    pub source_datasource_id: String,
    pub source_datasource_name: String,
    pub source_datasource_kind: String,
    pub source_table_name: String,
    pub target_datasource_id: String,
    pub target_datasource_name: String,
    pub target_datasource_kind: String,
    pub count: i64,
}

/// Cross-family progress report for one catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationInfo {
    pub table_name: String,
    pub aggregation: FamilyProgress,
    pub quality_audit: FamilyProgress,
    pub fusion: FamilyProgress,
    pub sources: Vec<AggregationSource>,
    pub comprehension_plan: Option<ComprehensionPlan>,
    pub processing_status: ProcessingStatus,
}

pub struct CatalogStatusService {
    tasks: Arc<TaskService>,
    datasources: Arc<dyn DatasourceLookup>,
    departments: Arc<dyn DepartmentLookup>,
    plans: Arc<dyn ComprehensionPlanLookup>,
}

impl CatalogStatusService {
    pub fn new(
        tasks: Arc<TaskService>,
        datasources: Arc<dyn DatasourceLookup>,
        departments: Arc<dyn DepartmentLookup>,
        plans: Arc<dyn ComprehensionPlanLookup>,
    ) -> Self {
        Self {
            tasks,
            datasources,
            departments,
            plans,
        }
    }

    /// Returns the quality audit, fusion and combined status of a table.
    pub async fn get_catalog_processing_status(
        &self,
        table_name: &str,
    ) -> Result<CatalogProcessingStatus, WorkOrderError> {
        let audit_tasks = self.fetch(TableMatch::QualityAuditTable(table_name.to_string())).await?;
        let fusion_tasks = self.fetch(TableMatch::FusionTable(table_name.to_string())).await?;

        let quality_audit = audit_progress(&audit_tasks).status;
        let fusion = task_progress(&fusion_tasks).status;
        Ok(CatalogProcessingStatus {
            quality_audit,
            fusion,
            combined: combine_family_statuses([quality_audit, fusion]),
        })
    }

    /// Builds the progress report for a table.
    pub async fn get_aggregation_info(
        &self,
        table_name: &str,
    ) -> Result<AggregationInfo, WorkOrderError> {
        let aggregation_tasks = self
            .fetch(TableMatch::AggregationTarget(table_name.to_string()))
            .await?;
        let audit_tasks = self.fetch(TableMatch::QualityAuditTable(table_name.to_string())).await?;
        let fusion_tasks = self.fetch(TableMatch::FusionTable(table_name.to_string())).await?;

        let aggregation = task_progress(&aggregation_tasks);
        let quality_audit = audit_progress(&audit_tasks);
        let fusion = task_progress(&fusion_tasks);
        let processing_status = combine_family_statuses([quality_audit.status, fusion.status]);

        let sources = self.describe_sources(&aggregation_tasks).await;

        let comprehension_plan = match self.plans.get_plan_for_table(table_name).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(table = table_name, error = %e, "Comprehension plan lookup failed");
                None
            }
        };

        debug!(
            table = table_name,
            aggregation_tasks = aggregation.total_count,
            audit_items = quality_audit.total_count,
            fusion_tasks = fusion.total_count,
            status = %processing_status,
            "Composed aggregation info"
        );

        Ok(AggregationInfo {
            table_name: table_name.to_string(),
            aggregation,
            quality_audit,
            fusion,
            sources,
            comprehension_plan,
            processing_status,
        })
    }

    async fn fetch(&self, table: TableMatch) -> Result<Vec<WorkOrderTask>, WorkOrderError> {
        self.tasks.list_tasks_by_table(table).await
    }

    async fn describe_sources(&self, tasks: &[WorkOrderTask]) -> Vec<AggregationSource> {
        let mut departments: HashMap<String, String> = HashMap::new();
        let mut datasources: HashMap<String, Option<DatasourceInfo>> = HashMap::new();
        let mut sources = Vec::new();

        for task in tasks {
            let items = task
                .detail
                .as_ref()
                .and_then(|d| d.as_aggregation())
                .unwrap_or(&[]);
            for item in items {
                let department_name = self.department_name(&mut departments, &item.department_id).await;
                let source = self
                    .datasource(&mut datasources, &item.source.datasource_id)
                    .await;
                let target = self
                    .datasource(&mut datasources, &item.target.datasource_id)
                    .await;

                sources.push(AggregationSource {
                    task_id: Some(task.id),
                    task_name: task.name.clone(),
                    status: task.status.clone(),
                    department_id: item.department_id.clone(),
                    department_name,
                    source_datasource_id: item.source.datasource_id.clone(),
                    source_datasource_name: source.as_ref().map(|d| d.name.clone()).unwrap_or_default(),
                    source_datasource_kind: source.as_ref().map(|d| d.kind.clone()).unwrap_or_default(),
                    source_table_name: item.source.table_name.clone(),
                    target_datasource_id: item.target.datasource_id.clone(),
                    target_datasource_name: target.as_ref().map(|d| d.name.clone()).unwrap_or_default(),
                    target_datasource_kind: target.as_ref().map(|d| d.kind.clone()).unwrap_or_default(),
                    count: item.count,
                });
            }
        }
        sources
    }

    async fn department_name(&self, seen: &mut HashMap<String, String>, id: &str) -> String {
        if id.is_empty() {
            return String::new();
        }
        if let Some(name) = seen.get(id) {
            return name.clone();
        }
        let name = match self.departments.get_department(id).await {
            Ok(Some(department)) => department.name,
            Ok(None) => {
                warn!(department_id = id, "Department not found");
                String::new()
            }
            Err(e) => {
                warn!(department_id = id, error = %e, "Department lookup failed");
                String::new()
            }
        };
        seen.insert(id.to_string(), name.clone());
        name
    }

    async fn datasource(
        &self,
        seen: &mut HashMap<String, Option<DatasourceInfo>>,
        id: &str,
    ) -> Option<DatasourceInfo> {
        if id.is_empty() {
            return None;
        }
        if let Some(info) = seen.get(id) {
            return info.clone();
        }
        let info = match self.datasources.get_datasource(id).await {
            Ok(Some(info)) => Some(info),
            Ok(None) => {
                warn!(datasource_id = id, "Datasource not found");
                None
            }
            Err(e) => {
                warn!(datasource_id = id, error = %e, "Datasource lookup failed");
                None
            }
        };
        seen.insert(id.to_string(), info.clone());
        info
    }
}

fn task_progress(tasks: &[WorkOrderTask]) -> FamilyProgress {
    FamilyProgress::from_statuses(tasks.iter().map(|t| t.status.as_str()))
}

/// Progress over the audit items that matched, not over their tasks.
fn audit_progress(tasks: &[WorkOrderTask]) -> FamilyProgress {
    FamilyProgress::from_statuses(
        tasks
            .iter()
            .filter_map(|t| t.detail.as_ref().and_then(|d| d.as_quality_audit()))
            .flatten()
            .map(|item| item.status.as_str()),
    )
}
