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

//! Work Order Task Model
//!
//! Domain structures for tasks. A task's common fields live on
//! [`WorkOrderTask`]; its type-specific payload is a [`TaskDetail`].

use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::ValidationError;
use crate::models::task_detail::TaskDetail;
use crate::models::work_order::WorkOrderType;
use serde::{Deserialize, Serialize};

/// Known task status values.
///
/// Tasks store their status as free text; this enum names the values that
/// take part in status aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Running => "Running",
            TaskStatus::Completed => "Completed",
            TaskStatus::Failed => "Failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Running" => Some(TaskStatus::Running),
            "Completed" => Some(TaskStatus::Completed),
            "Failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a stored task (domain type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrderTask {
    pub id: UniversalUuid,
    pub created_at: UniversalTimestamp,
    pub updated_at: UniversalTimestamp,
    pub name: String,
    /// Correlation id in an external system
    pub third_party_id: Option<String>,
    pub work_order_id: UniversalUuid,
    /// Stored verbatim; see [`TaskStatus`] for the values that aggregate
    pub status: String,
    /// Explanation for the current status, typically set on failure
    pub reason: String,
    /// Remediation UI link, empty when not applicable
    pub link: String,
    /// `None` only when the owning work order could not be resolved on read
    pub detail: Option<TaskDetail>,
}

impl WorkOrderTask {
    /// Parses the stored status.
    pub fn known_status(&self) -> Option<TaskStatus> {
        TaskStatus::from_str(&self.status)
    }
}

/// Structure for creating new task records (domain type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkOrderTask {
    pub work_order_id: UniversalUuid,
    pub name: String,
    #[serde(default)]
    pub third_party_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub link: String,
    pub detail: TaskDetail,
}

impl NewWorkOrderTask {
    /// A running task with no reason or link.
    pub fn running(work_order_id: UniversalUuid, name: impl Into<String>, detail: TaskDetail) -> Self {
        Self {
            work_order_id,
            name: name.into(),
            third_party_id: None,
            status: TaskStatus::Running.as_str().to_string(),
            reason: String::new(),
            link: String::new(),
            detail,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status.as_str().to_string();
        self
    }
}

/// Full replacement of a stored task's mutable fields.
///
/// `created_at` is never taken from the caller; the stored value is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub id: UniversalUuid,
    /// Must equal the stored owner; tasks cannot move between work orders
    pub work_order_id: UniversalUuid,
    pub name: String,
    #[serde(default)]
    pub third_party_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub link: String,
    pub detail: TaskDetail,
}

impl TaskUpdate {
    /// Starts an update from the stored task, keeping its detail when present.
    pub fn from_task(task: &WorkOrderTask, fallback_detail: TaskDetail) -> Self {
        Self {
            id: task.id,
            work_order_id: task.work_order_id,
            name: task.name.clone(),
            third_party_id: task.third_party_id.clone(),
            status: task.status.clone(),
            reason: task.reason.clone(),
            link: task.link.clone(),
            detail: task.detail.clone().unwrap_or(fallback_detail),
        }
    }
}

/// Filter for listing tasks. Empty fields do not constrain the result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    pub work_order_id: Option<UniversalUuid>,
    /// Substring match on the task name
    pub keyword: Option<String>,
    pub statuses: Vec<String>,
    /// Matches the redundant type tag stored on the task row
    pub work_order_type: Option<WorkOrderType>,
    pub offset: i64,
    /// Zero means no limit
    pub limit: i64,
}

impl TaskFilter {
    pub fn for_work_order(work_order_id: UniversalUuid) -> Self {
        Self {
            work_order_id: Some(work_order_id),
            ..Default::default()
        }
    }
}

/// Which detail column to match when looking up tasks by table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableMatch {
    /// Aggregation details whose target table has this name
    AggregationTarget(String),
    /// Audit details whose data table has this name
    QualityAuditTable(String),
    /// Fusion details whose data table has this name
    FusionTable(String),
}

impl TableMatch {
    pub fn table_name(&self) -> &str {
        match self {
            TableMatch::AggregationTarget(name)
            | TableMatch::QualityAuditTable(name)
            | TableMatch::FusionTable(name) => name,
        }
    }
}

pub mod validation {
    //! Checks applied to a task before anything is written.

    use super::*;

    /// Verifies that `detail` is the variant implied by `expected`.
    ///
    /// List-shaped details must carry at least one entry. Audit entries that
    /// declare a work order must declare the owning one.
    pub fn validate_detail(
        expected: WorkOrderType,
        work_order_id: UniversalUuid,
        detail: &TaskDetail,
    ) -> Result<(), ValidationError> {
        let found = detail.kind();
        if found != expected {
            return Err(ValidationError::DetailMismatch { expected, found });
        }
        if detail.is_empty_list() {
            return Err(ValidationError::MissingDetail { expected });
        }
        if let TaskDetail::DataQualityAudit(items) = detail {
            for item in items {
                if let Some(declared) = item.work_order_id {
                    if declared != work_order_id {
                        return Err(ValidationError::AuditWorkOrderMismatch {
                            data_table: item.data_table.clone(),
                            declared: declared.to_string(),
                            expected: work_order_id.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Rejects empty task names.
    pub fn validate_name(name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "name" });
        }
        Ok(())
    }
}
