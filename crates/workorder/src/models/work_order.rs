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

//! Work Order Model
//!
//! A work order is one instance of a business process. Work orders are created
//! by the upstream workflow module; this subsystem only reads them, apart from
//! writing back the rolled-up `process_status`.

use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::status::ProcessingStatus;
use serde::{Deserialize, Serialize};

/// The business process a work order runs. Determines which task detail
/// variant its tasks carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkOrderType {
    DataComprehension,
    DataAggregation,
    DataFusion,
    DataQuality,
    DataQualityAudit,
}

impl WorkOrderType {
    /// All work order types, in declaration order.
    pub const ALL: [WorkOrderType; 5] = [
        WorkOrderType::DataComprehension,
        WorkOrderType::DataAggregation,
        WorkOrderType::DataFusion,
        WorkOrderType::DataQuality,
        WorkOrderType::DataQualityAudit,
    ];

    /// Returns the string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderType::DataComprehension => "DataComprehension",
            WorkOrderType::DataAggregation => "DataAggregation",
            WorkOrderType::DataFusion => "DataFusion",
            WorkOrderType::DataQuality => "DataQuality",
            WorkOrderType::DataQualityAudit => "DataQualityAudit",
        }
    }

    /// Parses a stored work order type.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DataComprehension" => Some(WorkOrderType::DataComprehension),
            "DataAggregation" => Some(WorkOrderType::DataAggregation),
            "DataFusion" => Some(WorkOrderType::DataFusion),
            "DataQuality" => Some(WorkOrderType::DataQuality),
            "DataQualityAudit" => Some(WorkOrderType::DataQualityAudit),
            _ => None,
        }
    }

    /// Returns true when tasks of this type carry a list of detail rows
    /// rather than a single one.
    pub fn has_detail_list(&self) -> bool {
        matches!(
            self,
            WorkOrderType::DataAggregation | WorkOrderType::DataQualityAudit
        )
    }
}

impl std::fmt::Display for WorkOrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a work order record (domain type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: UniversalUuid,
    pub work_order_type: WorkOrderType,
    pub name: String,
    /// User responsible for the work order
    pub responsible_uid: String,
    pub deadline: Option<UniversalTimestamp>,
    /// Roll-up of the work order's task statuses, written by this subsystem
    pub process_status: ProcessingStatus,
    pub created_at: UniversalTimestamp,
    pub updated_at: UniversalTimestamp,
}

/// Structure for creating new work order records (domain type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkOrder {
    pub work_order_type: WorkOrderType,
    pub name: String,
    pub responsible_uid: String,
    pub deadline: Option<UniversalTimestamp>,
}
