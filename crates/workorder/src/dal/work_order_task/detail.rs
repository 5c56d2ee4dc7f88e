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

//! Detail-table operations for tasks.
//!
//! These run on a connection the caller already holds, so they compose into
//! the task DAL's transactions. Each task has rows in exactly one of the five
//! detail tables; the table is picked by [`WorkOrderType`].
//!
//! One-to-many details (aggregation, quality audit) are replaced wholesale on
//! update: live rows are tombstoned and the new list inserted. Single-row
//! details are updated in place and inserted if missing.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::dal::models::{
    SqliteDataAggregationDetail, SqliteDataComprehensionDetail, SqliteDataFusionDetail,
    SqliteDataQualityAuditDetail, SqliteDataQualityDetail,
};
use crate::database::schema::{
    data_aggregation_details, data_comprehension_details, data_fusion_details,
    data_quality_audit_details, data_quality_details,
};
use crate::database::universal_types::UniversalUuid;
use crate::error::StorageError;
use crate::models::task::TableMatch;
use crate::models::task_detail::{
    DataAggregationDetail, DataComprehensionDetail, DataFusionDetail, DataQualityAuditDetail,
    DataQualityDetail, TaskDetail,
};
use crate::models::work_order::WorkOrderType;

/// Inserts the detail rows of a new task.
pub(crate) fn insert_detail(
    conn: &mut SqliteConnection,
    task_id: UniversalUuid,
    work_order_id: UniversalUuid,
    detail: &TaskDetail,
    now: &str,
) -> QueryResult<()> {
    let task_bytes = task_id.to_bytes();
    match detail {
        TaskDetail::DataAggregation(items) => {
            let rows: Vec<SqliteDataAggregationDetail> = items
                .iter()
                .map(|item| SqliteDataAggregationDetail {
                    id: UniversalUuid::new_v7().to_bytes(),
                    task_id: task_bytes.clone(),
                    department_id: item.department_id.clone(),
                    source_datasource_id: item.source.datasource_id.clone(),
                    source_table_name: item.source.table_name.clone(),
                    target_datasource_id: item.target.datasource_id.clone(),
                    target_table_name: item.target.table_name.clone(),
                    item_count: item.count,
                    created_at: now.to_string(),
                    deleted_at: None,
                })
                .collect();
            diesel::insert_into(data_aggregation_details::table)
                .values(&rows)
                .execute(conn)?;
        }
        TaskDetail::DataComprehension(_) => {
            diesel::insert_into(data_comprehension_details::table)
                .values(&SqliteDataComprehensionDetail {
                    task_id: task_bytes,
                    created_at: now.to_string(),
                    deleted_at: None,
                })
                .execute(conn)?;
        }
        TaskDetail::DataFusion(fusion) => {
            diesel::insert_into(data_fusion_details::table)
                .values(&SqliteDataFusionDetail {
                    task_id: task_bytes,
                    datasource_id: fusion.datasource_id.clone(),
                    datasource_name: fusion.datasource_name.clone(),
                    data_table: fusion.data_table.clone(),
                    created_at: now.to_string(),
                    deleted_at: None,
                })
                .execute(conn)?;
        }
        TaskDetail::DataQuality(_) => {
            diesel::insert_into(data_quality_details::table)
                .values(&SqliteDataQualityDetail {
                    task_id: task_bytes,
                    created_at: now.to_string(),
                    deleted_at: None,
                })
                .execute(conn)?;
        }
        TaskDetail::DataQualityAudit(items) => {
            let rows: Vec<SqliteDataQualityAuditDetail> = items
                .iter()
                .map(|item| SqliteDataQualityAuditDetail {
                    id: UniversalUuid::new_v7().to_bytes(),
                    task_id: task_bytes.clone(),
                    work_order_id: item.work_order_id.unwrap_or(work_order_id).to_bytes(),
                    datasource_id: item.datasource_id.clone(),
                    datasource_name: item.datasource_name.clone(),
                    data_table: item.data_table.clone(),
                    detection_scheme: item.detection_scheme.clone(),
                    status: item.status.clone(),
                    reason: item.reason.clone(),
                    link: item.link.clone(),
                    created_at: now.to_string(),
                    deleted_at: None,
                })
                .collect();
            diesel::insert_into(data_quality_audit_details::table)
                .values(&rows)
                .execute(conn)?;
        }
    }
    Ok(())
}

/// Overwrites the detail of an existing task.
///
/// Live rows in the other four detail tables are tombstoned so the task keeps
/// exactly one detail even if its recorded type drifted.
pub(crate) fn replace_detail(
    conn: &mut SqliteConnection,
    task_id: UniversalUuid,
    work_order_id: UniversalUuid,
    detail: &TaskDetail,
    now: &str,
) -> QueryResult<()> {
    let kind = detail.kind();
    tombstone_details(conn, task_id, now, Some(kind))?;

    let task_bytes = task_id.to_bytes();
    let updated = match detail {
        TaskDetail::DataAggregation(_) => {
            diesel::update(
                data_aggregation_details::table
                    .filter(data_aggregation_details::task_id.eq(&task_bytes))
                    .filter(data_aggregation_details::deleted_at.is_null()),
            )
            .set(data_aggregation_details::deleted_at.eq(Some(now)))
            .execute(conn)?;
            0
        }
        TaskDetail::DataQualityAudit(_) => {
            diesel::update(
                data_quality_audit_details::table
                    .filter(data_quality_audit_details::task_id.eq(&task_bytes))
                    .filter(data_quality_audit_details::deleted_at.is_null()),
            )
            .set(data_quality_audit_details::deleted_at.eq(Some(now)))
            .execute(conn)?;
            0
        }
        TaskDetail::DataComprehension(_) => diesel::update(
            data_comprehension_details::table
                .filter(data_comprehension_details::task_id.eq(&task_bytes)),
        )
        .set(data_comprehension_details::deleted_at.eq(None::<String>))
        .execute(conn)?,
        TaskDetail::DataQuality(_) => diesel::update(
            data_quality_details::table.filter(data_quality_details::task_id.eq(&task_bytes)),
        )
        .set(data_quality_details::deleted_at.eq(None::<String>))
        .execute(conn)?,
        TaskDetail::DataFusion(fusion) => diesel::update(
            data_fusion_details::table.filter(data_fusion_details::task_id.eq(&task_bytes)),
        )
        .set((
            data_fusion_details::datasource_id.eq(&fusion.datasource_id),
            data_fusion_details::datasource_name.eq(&fusion.datasource_name),
            data_fusion_details::data_table.eq(&fusion.data_table),
            data_fusion_details::deleted_at.eq(None::<String>),
        ))
        .execute(conn)?,
    };

    if updated == 0 {
        insert_detail(conn, task_id, work_order_id, detail, now)?;
    }
    Ok(())
}

/// Tombstones a task's live detail rows, optionally sparing one table.
pub(crate) fn tombstone_details(
    conn: &mut SqliteConnection,
    task_id: UniversalUuid,
    now: &str,
    except: Option<WorkOrderType>,
) -> QueryResult<()> {
    let task_bytes = task_id.to_bytes();
    for kind in WorkOrderType::ALL {
        if Some(kind) == except {
            continue;
        }
        match kind {
            WorkOrderType::DataAggregation => diesel::update(
                data_aggregation_details::table
                    .filter(data_aggregation_details::task_id.eq(&task_bytes))
                    .filter(data_aggregation_details::deleted_at.is_null()),
            )
            .set(data_aggregation_details::deleted_at.eq(Some(now)))
            .execute(conn)?,
            WorkOrderType::DataComprehension => diesel::update(
                data_comprehension_details::table
                    .filter(data_comprehension_details::task_id.eq(&task_bytes))
                    .filter(data_comprehension_details::deleted_at.is_null()),
            )
            .set(data_comprehension_details::deleted_at.eq(Some(now)))
            .execute(conn)?,
            WorkOrderType::DataFusion => diesel::update(
                data_fusion_details::table
                    .filter(data_fusion_details::task_id.eq(&task_bytes))
                    .filter(data_fusion_details::deleted_at.is_null()),
            )
            .set(data_fusion_details::deleted_at.eq(Some(now)))
            .execute(conn)?,
            WorkOrderType::DataQuality => diesel::update(
                data_quality_details::table
                    .filter(data_quality_details::task_id.eq(&task_bytes))
                    .filter(data_quality_details::deleted_at.is_null()),
            )
            .set(data_quality_details::deleted_at.eq(Some(now)))
            .execute(conn)?,
            WorkOrderType::DataQualityAudit => diesel::update(
                data_quality_audit_details::table
                    .filter(data_quality_audit_details::task_id.eq(&task_bytes))
                    .filter(data_quality_audit_details::deleted_at.is_null()),
            )
            .set(data_quality_audit_details::deleted_at.eq(Some(now)))
            .execute(conn)?,
        };
    }
    Ok(())
}

/// Loads a task's live detail of the given kind.
///
/// Returns `None` when the task has no live rows in that table.
pub(crate) fn load_detail(
    conn: &mut SqliteConnection,
    task_id: UniversalUuid,
    kind: WorkOrderType,
) -> Result<Option<TaskDetail>, StorageError> {
    let task_bytes = task_id.to_bytes();
    let detail = match kind {
        WorkOrderType::DataAggregation => {
            let rows: Vec<SqliteDataAggregationDetail> = data_aggregation_details::table
                .filter(data_aggregation_details::task_id.eq(task_bytes))
                .filter(data_aggregation_details::deleted_at.is_null())
                .order(data_aggregation_details::id.asc())
                .select(SqliteDataAggregationDetail::as_select())
                .load(conn)?;
            if rows.is_empty() {
                None
            } else {
                let items = rows
                    .into_iter()
                    .map(DataAggregationDetail::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Some(TaskDetail::DataAggregation(items))
            }
        }
        WorkOrderType::DataComprehension => data_comprehension_details::table
            .filter(data_comprehension_details::task_id.eq(task_bytes))
            .filter(data_comprehension_details::deleted_at.is_null())
            .select(SqliteDataComprehensionDetail::as_select())
            .first(conn)
            .optional()?
            .map(|_| TaskDetail::DataComprehension(DataComprehensionDetail::default())),
        WorkOrderType::DataFusion => data_fusion_details::table
            .filter(data_fusion_details::task_id.eq(task_bytes))
            .filter(data_fusion_details::deleted_at.is_null())
            .select(SqliteDataFusionDetail::as_select())
            .first(conn)
            .optional()?
            .map(|row| TaskDetail::DataFusion(DataFusionDetail::from(row))),
        WorkOrderType::DataQuality => data_quality_details::table
            .filter(data_quality_details::task_id.eq(task_bytes))
            .filter(data_quality_details::deleted_at.is_null())
            .select(SqliteDataQualityDetail::as_select())
            .first(conn)
            .optional()?
            .map(|_| TaskDetail::DataQuality(DataQualityDetail::default())),
        WorkOrderType::DataQualityAudit => {
            let rows: Vec<SqliteDataQualityAuditDetail> = data_quality_audit_details::table
                .filter(data_quality_audit_details::task_id.eq(task_bytes))
                .filter(data_quality_audit_details::deleted_at.is_null())
                .order(data_quality_audit_details::id.asc())
                .select(SqliteDataQualityAuditDetail::as_select())
                .load(conn)?;
            if rows.is_empty() {
                None
            } else {
                let items = rows
                    .into_iter()
                    .map(DataQualityAuditDetail::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Some(TaskDetail::DataQualityAudit(items))
            }
        }
    };
    Ok(detail)
}

/// Finds live detail rows that reference a table, grouped by task.
///
/// Each returned detail holds only the matching rows. Tasks appear in the
/// order of their first matching row.
pub(crate) fn details_matching_table(
    conn: &mut SqliteConnection,
    table: &TableMatch,
) -> Result<Vec<(UniversalUuid, TaskDetail)>, StorageError> {
    let mut grouped: Vec<(UniversalUuid, TaskDetail)> = Vec::new();

    match table {
        TableMatch::AggregationTarget(name) => {
            let rows: Vec<SqliteDataAggregationDetail> = data_aggregation_details::table
                .filter(data_aggregation_details::target_table_name.eq(name))
                .filter(data_aggregation_details::deleted_at.is_null())
                .order(data_aggregation_details::id.asc())
                .select(SqliteDataAggregationDetail::as_select())
                .load(conn)?;
            for row in rows {
                let task_id = UniversalUuid::from_bytes(&row.task_id)?;
                let item = DataAggregationDetail::try_from(row)?;
                match grouped.iter_mut().find(|(id, _)| *id == task_id) {
                    Some((_, TaskDetail::DataAggregation(items))) => items.push(item),
                    _ => grouped.push((task_id, TaskDetail::DataAggregation(vec![item]))),
                }
            }
        }
        TableMatch::QualityAuditTable(name) => {
            let rows: Vec<SqliteDataQualityAuditDetail> = data_quality_audit_details::table
                .filter(data_quality_audit_details::data_table.eq(name))
                .filter(data_quality_audit_details::deleted_at.is_null())
                .order(data_quality_audit_details::id.asc())
                .select(SqliteDataQualityAuditDetail::as_select())
                .load(conn)?;
            for row in rows {
                let task_id = UniversalUuid::from_bytes(&row.task_id)?;
                let item = DataQualityAuditDetail::try_from(row)?;
                match grouped.iter_mut().find(|(id, _)| *id == task_id) {
                    Some((_, TaskDetail::DataQualityAudit(items))) => items.push(item),
                    _ => grouped.push((task_id, TaskDetail::DataQualityAudit(vec![item]))),
                }
            }
        }
        TableMatch::FusionTable(name) => {
            let rows: Vec<SqliteDataFusionDetail> = data_fusion_details::table
                .filter(data_fusion_details::data_table.eq(name))
                .filter(data_fusion_details::deleted_at.is_null())
                .select(SqliteDataFusionDetail::as_select())
                .load(conn)?;
            for row in rows {
                let task_id = UniversalUuid::from_bytes(&row.task_id)?;
                grouped.push((task_id, TaskDetail::DataFusion(DataFusionDetail::from(row))));
            }
        }
    }

    Ok(grouped)
}
