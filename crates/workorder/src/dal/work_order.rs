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

//! Work order data access.
//!
//! Work orders belong to the upstream workflow module. This DAL reads them
//! and writes back `process_status`; `create` exists for that module and for
//! tests.

use super::models::{NewSqliteWorkOrder, SqliteWorkOrder};
use super::DAL;
use crate::database::schema::work_orders;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::StorageError;
use crate::models::work_order::{NewWorkOrder, WorkOrder};
use crate::status::ProcessingStatus;
use diesel::prelude::*;

/// Data access layer for work orders.
#[derive(Clone)]
pub struct WorkOrderDAL<'a> {
    dal: &'a DAL,
}

impl<'a> WorkOrderDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Creates a new work order.
    pub async fn create(&self, new_work_order: NewWorkOrder) -> Result<WorkOrder, StorageError> {
        let id = UniversalUuid::new_v7();
        let now = UniversalTimestamp::now();

        let row = NewSqliteWorkOrder {
            id: id.to_bytes(),
            work_order_type: new_work_order.work_order_type.as_str().to_string(),
            name: new_work_order.name.clone(),
            responsible_uid: new_work_order.responsible_uid.clone(),
            deadline: new_work_order.deadline.map(|d| d.to_rfc3339()),
            process_status: None,
            created_at: now.to_rfc3339(),
            updated_at: now.to_rfc3339(),
        };

        self.dal
            .interact(move |conn| {
                diesel::insert_into(work_orders::table)
                    .values(&row)
                    .execute(conn)?;
                Ok(())
            })
            .await?;

        Ok(WorkOrder {
            id,
            work_order_type: new_work_order.work_order_type,
            name: new_work_order.name,
            responsible_uid: new_work_order.responsible_uid,
            deadline: new_work_order.deadline,
            process_status: ProcessingStatus::Unset,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fetches a work order, failing with `MissingRow` if it does not exist.
    pub async fn get(&self, id: UniversalUuid) -> Result<WorkOrder, StorageError> {
        self.find(id).await?.ok_or_else(|| StorageError::MissingRow {
            table: "work_order",
            id: id.to_string(),
        })
    }

    /// Fetches a work order if it exists.
    pub async fn find(&self, id: UniversalUuid) -> Result<Option<WorkOrder>, StorageError> {
        let id_bytes = id.to_bytes();
        let row: Option<SqliteWorkOrder> = self
            .dal
            .interact(move |conn| {
                Ok(work_orders::table
                    .filter(work_orders::id.eq(id_bytes))
                    .select(SqliteWorkOrder::as_select())
                    .first(conn)
                    .optional()?)
            })
            .await?;

        row.map(WorkOrder::try_from).transpose()
    }

    /// Writes the rolled-up processing status.
    pub async fn update_process_status(
        &self,
        id: UniversalUuid,
        status: ProcessingStatus,
    ) -> Result<(), StorageError> {
        let id_bytes = id.to_bytes();
        let now = UniversalTimestamp::now().to_rfc3339();
        let stored = if status.is_unset() {
            None
        } else {
            Some(status.as_str().to_string())
        };

        let affected = self
            .dal
            .interact(move |conn| {
                Ok(diesel::update(work_orders::table.filter(work_orders::id.eq(id_bytes)))
                    .set((
                        work_orders::process_status.eq(stored),
                        work_orders::updated_at.eq(now),
                    ))
                    .execute(conn)?)
            })
            .await?;

        if affected == 0 {
            return Err(StorageError::MissingRow {
                table: "work_order",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
