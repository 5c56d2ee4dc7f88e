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

//! Inventory data access.

use super::models::{NewSqliteInventory, SqliteInventory};
use super::DAL;
use crate::database::schema::data_aggregation_inventories;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::StorageError;
use crate::models::inventory::{DataAggregationInventory, NewDataAggregationInventory};
use diesel::prelude::*;

#[derive(Clone)]
pub struct InventoryDAL<'a> {
    dal: &'a DAL,
}

impl<'a> InventoryDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    pub async fn create(
        &self,
        new_inventory: NewDataAggregationInventory,
    ) -> Result<DataAggregationInventory, StorageError> {
        let id = UniversalUuid::new_v7();
        let now = UniversalTimestamp::now();
        let row = NewSqliteInventory {
            id: id.to_bytes(),
            name: new_inventory.name.clone(),
            department_id: new_inventory.department_id.clone(),
            created_at: now.to_rfc3339(),
            updated_at: now.to_rfc3339(),
        };

        self.dal
            .interact(move |conn| {
                diesel::insert_into(data_aggregation_inventories::table)
                    .values(&row)
                    .execute(conn)?;
                Ok(())
            })
            .await?;

        Ok(DataAggregationInventory {
            id,
            name: new_inventory.name,
            department_id: new_inventory.department_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fetches a live inventory if it exists.
    pub async fn find(
        &self,
        id: UniversalUuid,
    ) -> Result<Option<DataAggregationInventory>, StorageError> {
        let id_bytes = id.to_bytes();
        let row: Option<SqliteInventory> = self
            .dal
            .interact(move |conn| {
                Ok(data_aggregation_inventories::table
                    .filter(data_aggregation_inventories::id.eq(id_bytes))
                    .filter(data_aggregation_inventories::deleted_at.is_null())
                    .select(SqliteInventory::as_select())
                    .first(conn)
                    .optional()?)
            })
            .await?;

        row.map(DataAggregationInventory::try_from).transpose()
    }
}
