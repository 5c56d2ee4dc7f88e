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

//! Resource data access.
//!
//! Resources are only written through [`ResourceDAL::reconcile`], which loads
//! the owner's live rows, plans the diff and applies it inside one
//! transaction. The owner column is chosen from the [`ResourceOwner`]; the
//! rest of the code path is shared by both scopes.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use thiserror::Error;
use tracing::debug;

use super::models::{NewSqliteResource, SqliteResource, SqliteResourceChanges};
use super::DAL;
use crate::call_context::CallContext;
use crate::database::schema::data_aggregation_resources;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::{StorageError, ValidationError};
use crate::models::resource::{DataAggregationResource, ResourceDescriptor, ResourceOwner};
use crate::reconciler::{plan_reconciliation, ReconciliationPlan};

/// Failure of a reconcile transaction.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<diesel::result::Error> for ReconcileError {
    fn from(e: diesel::result::Error) -> Self {
        ReconcileError::Storage(StorageError::Database(e))
    }
}

/// Result of a committed reconciliation.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub plan: ReconciliationPlan,
    /// The owner's live resources after commit
    pub resources: Vec<DataAggregationResource>,
}

#[derive(Clone)]
pub struct ResourceDAL<'a> {
    dal: &'a DAL,
}

impl<'a> ResourceDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Lists the live resources of an owner, oldest first.
    pub async fn list(
        &self,
        owner: ResourceOwner,
    ) -> Result<Vec<DataAggregationResource>, StorageError> {
        self.dal.interact(move |conn| load_live(conn, owner)).await
    }

    /// Makes the owner's live resources equal `desired`.
    ///
    /// Loading, planning and every write happen in one transaction. A
    /// validation failure, a storage failure or a tripped context leaves the
    /// previous resource set untouched.
    pub async fn reconcile(
        &self,
        ctx: &CallContext,
        owner: ResourceOwner,
        desired: Vec<ResourceDescriptor>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        self.dal
            .transaction(ctx, move |conn, ctx| {
                let actual = load_live(conn, owner)?;
                let plan = plan_reconciliation(owner, &actual, &desired)?;
                debug!(
                    owner = %owner,
                    inserts = plan.inserts.len(),
                    updates = plan.updates.len(),
                    unchanged = plan.unchanged.len(),
                    deletions = plan.deletions.len(),
                    "Planned resource reconciliation"
                );

                if plan.is_noop() {
                    return Ok(ReconcileOutcome {
                        plan,
                        resources: actual,
                    });
                }

                let now = UniversalTimestamp::now().to_rfc3339();

                ctx.check()?;
                if !plan.inserts.is_empty() {
                    let rows: Vec<NewSqliteResource> = plan
                        .inserts
                        .iter()
                        .map(|descriptor| new_row(owner, descriptor, &now))
                        .collect();
                    diesel::insert_into(data_aggregation_resources::table)
                        .values(&rows)
                        .execute(conn)?;
                }

                ctx.check()?;
                for update in &plan.updates {
                    let changes = changes_for(&update.descriptor, &now);
                    diesel::update(
                        data_aggregation_resources::table
                            .filter(data_aggregation_resources::id.eq(update.id.to_bytes())),
                    )
                    .set(&changes)
                    .execute(conn)?;
                }

                ctx.check()?;
                if !plan.deletions.is_empty() {
                    let ids: Vec<Vec<u8>> = plan
                        .deletion_ids()
                        .iter()
                        .map(UniversalUuid::to_bytes)
                        .collect();
                    diesel::update(
                        data_aggregation_resources::table
                            .filter(data_aggregation_resources::id.eq_any(ids)),
                    )
                    .set((
                        data_aggregation_resources::deleted_at.eq(Some(now.clone())),
                        data_aggregation_resources::updated_at.eq(now.clone()),
                    ))
                    .execute(conn)?;
                }

                ctx.check()?;
                let resources = load_live(conn, owner)?;
                Ok(ReconcileOutcome { plan, resources })
            })
            .await
    }
}

/// Loads the live resources of one owner.
fn load_live(
    conn: &mut SqliteConnection,
    owner: ResourceOwner,
) -> Result<Vec<DataAggregationResource>, StorageError> {
    let mut query = data_aggregation_resources::table
        .filter(data_aggregation_resources::deleted_at.is_null())
        .select(SqliteResource::as_select())
        .order(data_aggregation_resources::id.asc())
        .into_boxed();

    query = match owner {
        ResourceOwner::Inventory(id) => {
            query.filter(data_aggregation_resources::inventory_id.eq(id.to_bytes()))
        }
        ResourceOwner::WorkOrder(id) => {
            query.filter(data_aggregation_resources::work_order_id.eq(id.to_bytes()))
        }
    };

    let rows: Vec<SqliteResource> = query.load(conn)?;
    rows.into_iter()
        .map(DataAggregationResource::try_from)
        .collect()
}

fn new_row(owner: ResourceOwner, descriptor: &ResourceDescriptor, now: &str) -> NewSqliteResource {
    NewSqliteResource {
        id: UniversalUuid::new_v7().to_bytes(),
        view_id: descriptor.view_id.clone(),
        inventory_id: owner.inventory_id().map(|id| id.to_bytes()),
        work_order_id: owner.work_order_id().map(|id| id.to_bytes()),
        collection_method: descriptor.collection_method.as_str().to_string(),
        sync_frequency: descriptor.sync_frequency.as_str().to_string(),
        business_form_id: descriptor.business_form_id.clone(),
        target_datasource_id: descriptor.target_datasource_id.clone(),
        target_table_name: descriptor.target_table_name.clone(),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    }
}

fn changes_for(descriptor: &ResourceDescriptor, now: &str) -> SqliteResourceChanges {
    SqliteResourceChanges {
        collection_method: descriptor.collection_method.as_str().to_string(),
        sync_frequency: descriptor.sync_frequency.as_str().to_string(),
        business_form_id: descriptor.business_form_id.clone(),
        target_datasource_id: descriptor.target_datasource_id.clone(),
        target_table_name: descriptor.target_table_name.clone(),
        updated_at: now.to_string(),
    }
}
