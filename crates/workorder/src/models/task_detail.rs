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

//! Typed task detail payloads.
//!
//! Every task carries exactly one [`TaskDetail`] variant, and the variant must
//! be the one implied by the owning work order's [`WorkOrderType`]. Being an
//! enum, "exactly one slot populated" holds by construction; the remaining
//! check (variant matches type) lives in `task::validation`.

use crate::database::universal_types::UniversalUuid;
use crate::models::work_order::WorkOrderType;
use serde::{Deserialize, Serialize};

/// Reference to a table in an external datasource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub datasource_id: String,
    pub table_name: String,
}

/// One aggregated unit of a data aggregation task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAggregationDetail {
    /// Assigned by the store; ignored on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UniversalUuid>,
    pub department_id: String,
    pub source: TableRef,
    /// The target table name is the cross-system join key for catalog roll-ups.
    pub target: TableRef,
    pub count: i64,
}

/// Marker detail for data comprehension tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataComprehensionDetail {}

/// Detail for data fusion tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFusionDetail {
    pub datasource_id: String,
    pub datasource_name: String,
    pub data_table: String,
}

/// Marker detail for data quality tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityDetail {}

/// One audited table of a data quality audit task.
///
/// Each audited table progresses independently, so status, reason and link
/// are tracked per item as well as on the task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityAuditDetail {
    /// Assigned by the store; ignored on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UniversalUuid>,
    /// Filled from the owning task on write; must match it when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_order_id: Option<UniversalUuid>,
    pub datasource_id: String,
    pub datasource_name: String,
    pub data_table: String,
    pub detection_scheme: String,
    pub status: String,
    pub reason: String,
    pub link: String,
}

/// The type-specific payload of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum TaskDetail {
    DataAggregation(Vec<DataAggregationDetail>),
    DataComprehension(DataComprehensionDetail),
    DataFusion(DataFusionDetail),
    DataQuality(DataQualityDetail),
    DataQualityAudit(Vec<DataQualityAuditDetail>),
}

impl TaskDetail {
    /// The work order type this detail belongs to.
    pub fn kind(&self) -> WorkOrderType {
        match self {
            TaskDetail::DataAggregation(_) => WorkOrderType::DataAggregation,
            TaskDetail::DataComprehension(_) => WorkOrderType::DataComprehension,
            TaskDetail::DataFusion(_) => WorkOrderType::DataFusion,
            TaskDetail::DataQuality(_) => WorkOrderType::DataQuality,
            TaskDetail::DataQualityAudit(_) => WorkOrderType::DataQualityAudit,
        }
    }

    /// An empty detail of the given kind.
    ///
    /// Returned by reads when a task's detail rows are missing.
    pub fn empty(kind: WorkOrderType) -> Self {
        match kind {
            WorkOrderType::DataAggregation => TaskDetail::DataAggregation(Vec::new()),
            WorkOrderType::DataComprehension => {
                TaskDetail::DataComprehension(DataComprehensionDetail::default())
            }
            WorkOrderType::DataFusion => TaskDetail::DataFusion(DataFusionDetail::default()),
            WorkOrderType::DataQuality => TaskDetail::DataQuality(DataQualityDetail::default()),
            WorkOrderType::DataQualityAudit => TaskDetail::DataQualityAudit(Vec::new()),
        }
    }

    /// True when a list-shaped detail has no entries.
    pub fn is_empty_list(&self) -> bool {
        match self {
            TaskDetail::DataAggregation(items) => items.is_empty(),
            TaskDetail::DataQualityAudit(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_aggregation(&self) -> Option<&[DataAggregationDetail]> {
        match self {
            TaskDetail::DataAggregation(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_fusion(&self) -> Option<&DataFusionDetail> {
        match self {
            TaskDetail::DataFusion(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn as_quality_audit(&self) -> Option<&[DataQualityAuditDetail]> {
        match self {
            TaskDetail::DataQualityAudit(items) => Some(items),
            _ => None,
        }
    }
}
