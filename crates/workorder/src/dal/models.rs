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

//! SQLite database models
//!
//! Diesel model definitions using SQLite-compatible types. UUIDs are stored as
//! BLOB (`Vec<u8>`) and timestamps as TEXT (RFC3339 strings).
//!
//! These models are used internally by the DAL and converted to/from domain
//! types at the DAL boundary. Conversions are fallible because a stored value
//! may not decode (bad blob length, unknown enum string).

use crate::database::schema::*;
use crate::database::universal_types::{
    timestamp_from_optional_text, uuid_from_optional_bytes, UniversalTimestamp, UniversalUuid,
};
use crate::error::StorageError;
use crate::models::inventory::DataAggregationInventory;
use crate::models::resource::{
    CollectionMethod, DataAggregationResource, ResourceOwner, SyncFrequency,
};
use crate::models::task::WorkOrderTask;
use crate::models::task_detail::{
    DataAggregationDetail, DataFusionDetail, DataQualityAuditDetail, TableRef,
};
use crate::models::work_order::{WorkOrder, WorkOrderType};
use crate::status::ProcessingStatus;
use diesel::prelude::*;

// ============================================================================
// Work Order Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = work_orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteWorkOrder {
    pub id: Vec<u8>,
    pub work_order_type: String,
    pub name: String,
    pub responsible_uid: String,
    pub deadline: Option<String>,
    pub process_status: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = work_orders)]
pub struct NewSqliteWorkOrder {
    pub id: Vec<u8>,
    pub work_order_type: String,
    pub name: String,
    pub responsible_uid: String,
    pub deadline: Option<String>,
    pub process_status: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// ============================================================================
// Task Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = work_order_tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteWorkOrderTask {
    pub id: Vec<u8>,
    pub work_order_id: Vec<u8>,
    pub task_type: String,
    pub name: String,
    pub third_party_id: Option<String>,
    pub status: String,
    pub reason: String,
    pub link: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = work_order_tasks)]
pub struct NewSqliteWorkOrderTask {
    pub id: Vec<u8>,
    pub work_order_id: Vec<u8>,
    pub task_type: String,
    pub name: String,
    pub third_party_id: Option<String>,
    pub status: String,
    pub reason: String,
    pub link: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Overwrites every mutable column of a task. `created_at` is not touched.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = work_order_tasks)]
#[diesel(treat_none_as_null = true)]
pub struct SqliteWorkOrderTaskChanges {
    pub task_type: String,
    pub name: String,
    pub third_party_id: Option<String>,
    pub status: String,
    pub reason: String,
    pub link: String,
    pub updated_at: String,
}

// ============================================================================
// Task Detail Models
// ============================================================================

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = data_aggregation_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteDataAggregationDetail {
    pub id: Vec<u8>,
    pub task_id: Vec<u8>,
    pub department_id: String,
    pub source_datasource_id: String,
    pub source_table_name: String,
    pub target_datasource_id: String,
    pub target_table_name: String,
    pub item_count: i64,
    pub created_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = data_comprehension_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteDataComprehensionDetail {
    pub task_id: Vec<u8>,
    pub created_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = data_fusion_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteDataFusionDetail {
    pub task_id: Vec<u8>,
    pub datasource_id: String,
    pub datasource_name: String,
    pub data_table: String,
    pub created_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = data_quality_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteDataQualityDetail {
    pub task_id: Vec<u8>,
    pub created_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = data_quality_audit_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteDataQualityAuditDetail {
    pub id: Vec<u8>,
    pub task_id: Vec<u8>,
    pub work_order_id: Vec<u8>,
    pub datasource_id: String,
    pub datasource_name: String,
    pub data_table: String,
    pub detection_scheme: String,
    pub status: String,
    pub reason: String,
    pub link: String,
    pub created_at: String,
    pub deleted_at: Option<String>,
}

// ============================================================================
// Inventory & Resource Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = data_aggregation_inventories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteInventory {
    pub id: Vec<u8>,
    pub name: String,
    pub department_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = data_aggregation_inventories)]
pub struct NewSqliteInventory {
    pub id: Vec<u8>,
    pub name: String,
    pub department_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = data_aggregation_resources)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteResource {
    pub id: Vec<u8>,
    pub view_id: String,
    pub inventory_id: Option<Vec<u8>>,
    pub work_order_id: Option<Vec<u8>>,
    pub collection_method: String,
    pub sync_frequency: String,
    pub business_form_id: String,
    pub target_datasource_id: String,
    pub target_table_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = data_aggregation_resources)]
pub struct NewSqliteResource {
    pub id: Vec<u8>,
    pub view_id: String,
    pub inventory_id: Option<Vec<u8>>,
    pub work_order_id: Option<Vec<u8>>,
    pub collection_method: String,
    pub sync_frequency: String,
    pub business_form_id: String,
    pub target_datasource_id: String,
    pub target_table_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Overwrites the descriptor columns of a resource. Owner and view stay fixed.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = data_aggregation_resources)]
#[diesel(treat_none_as_null = true)]
pub struct SqliteResourceChanges {
    pub collection_method: String,
    pub sync_frequency: String,
    pub business_form_id: String,
    pub target_datasource_id: String,
    pub target_table_name: Option<String>,
    pub updated_at: String,
}

// ============================================================================
// Conversion Implementations
// ============================================================================

fn decode_error(column: &str, value: &str) -> StorageError {
    StorageError::Decode(format!("unknown {} value '{}'", column, value))
}

impl TryFrom<SqliteWorkOrder> for WorkOrder {
    type Error = StorageError;

    fn try_from(s: SqliteWorkOrder) -> Result<Self, Self::Error> {
        let work_order_type = WorkOrderType::from_str(&s.work_order_type)
            .ok_or_else(|| decode_error("work_order_type", &s.work_order_type))?;
        Ok(WorkOrder {
            id: UniversalUuid::from_bytes(&s.id)?,
            work_order_type,
            name: s.name,
            responsible_uid: s.responsible_uid,
            deadline: timestamp_from_optional_text(s.deadline.as_deref())?,
            process_status: s
                .process_status
                .as_deref()
                .map(ProcessingStatus::from_str)
                .unwrap_or_default(),
            created_at: UniversalTimestamp::from_rfc3339(&s.created_at)?,
            updated_at: UniversalTimestamp::from_rfc3339(&s.updated_at)?,
        })
    }
}

impl TryFrom<SqliteWorkOrderTask> for WorkOrderTask {
    type Error = StorageError;

    /// Converts the common row. The detail is resolved separately.
    fn try_from(s: SqliteWorkOrderTask) -> Result<Self, Self::Error> {
        Ok(WorkOrderTask {
            id: UniversalUuid::from_bytes(&s.id)?,
            created_at: UniversalTimestamp::from_rfc3339(&s.created_at)?,
            updated_at: UniversalTimestamp::from_rfc3339(&s.updated_at)?,
            name: s.name,
            third_party_id: s.third_party_id,
            work_order_id: UniversalUuid::from_bytes(&s.work_order_id)?,
            status: s.status,
            reason: s.reason,
            link: s.link,
            detail: None,
        })
    }
}

impl TryFrom<SqliteDataAggregationDetail> for DataAggregationDetail {
    type Error = StorageError;

    fn try_from(s: SqliteDataAggregationDetail) -> Result<Self, Self::Error> {
        Ok(DataAggregationDetail {
            id: Some(UniversalUuid::from_bytes(&s.id)?),
            department_id: s.department_id,
            source: TableRef {
                datasource_id: s.source_datasource_id,
                table_name: s.source_table_name,
            },
            target: TableRef {
                datasource_id: s.target_datasource_id,
                table_name: s.target_table_name,
            },
            count: s.item_count,
        })
    }
}

impl From<SqliteDataFusionDetail> for DataFusionDetail {
    fn from(s: SqliteDataFusionDetail) -> Self {
        DataFusionDetail {
            datasource_id: s.datasource_id,
            datasource_name: s.datasource_name,
            data_table: s.data_table,
        }
    }
}

impl TryFrom<SqliteDataQualityAuditDetail> for DataQualityAuditDetail {
    type Error = StorageError;

    fn try_from(s: SqliteDataQualityAuditDetail) -> Result<Self, Self::Error> {
        Ok(DataQualityAuditDetail {
            id: Some(UniversalUuid::from_bytes(&s.id)?),
            work_order_id: Some(UniversalUuid::from_bytes(&s.work_order_id)?),
            datasource_id: s.datasource_id,
            datasource_name: s.datasource_name,
            data_table: s.data_table,
            detection_scheme: s.detection_scheme,
            status: s.status,
            reason: s.reason,
            link: s.link,
        })
    }
}

impl TryFrom<SqliteInventory> for DataAggregationInventory {
    type Error = StorageError;

    fn try_from(s: SqliteInventory) -> Result<Self, Self::Error> {
        Ok(DataAggregationInventory {
            id: UniversalUuid::from_bytes(&s.id)?,
            name: s.name,
            department_id: s.department_id,
            created_at: UniversalTimestamp::from_rfc3339(&s.created_at)?,
            updated_at: UniversalTimestamp::from_rfc3339(&s.updated_at)?,
        })
    }
}

impl TryFrom<SqliteResource> for DataAggregationResource {
    type Error = StorageError;

    fn try_from(s: SqliteResource) -> Result<Self, Self::Error> {
        let inventory_id = uuid_from_optional_bytes(s.inventory_id.as_deref())?;
        let work_order_id = uuid_from_optional_bytes(s.work_order_id.as_deref())?;
        let owner = match (inventory_id, work_order_id) {
            (Some(id), None) => ResourceOwner::Inventory(id),
            (None, Some(id)) => ResourceOwner::WorkOrder(id),
            _ => {
                return Err(StorageError::Decode(format!(
                    "resource for view '{}' must have exactly one owner",
                    s.view_id
                )))
            }
        };
        let collection_method = CollectionMethod::from_str(&s.collection_method)
            .ok_or_else(|| decode_error("collection_method", &s.collection_method))?;
        let sync_frequency = SyncFrequency::from_str(&s.sync_frequency)
            .ok_or_else(|| decode_error("sync_frequency", &s.sync_frequency))?;

        Ok(DataAggregationResource {
            id: UniversalUuid::from_bytes(&s.id)?,
            view_id: s.view_id,
            owner,
            collection_method,
            sync_frequency,
            business_form_id: s.business_form_id,
            target_datasource_id: s.target_datasource_id,
            target_table_name: s.target_table_name,
            created_at: UniversalTimestamp::from_rfc3339(&s.created_at)?,
            updated_at: UniversalTimestamp::from_rfc3339(&s.updated_at)?,
        })
    }
}
