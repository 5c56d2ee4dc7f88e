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

//! Resource reconciliation service.
//!
//! One code path serves both ownership scopes. After a reconciliation commits,
//! a [`ResourceChangeEvent`] is published; a failed publish is logged and does
//! not fail the call, because the change is already durable.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use crate::call_context::CallContext;
use crate::dal::{ReconcileError, ReconcileOutcome, DAL};
use crate::error::WorkOrderError;
use crate::external::ResourceChangeNotifier;
use crate::models::resource::{
    DataAggregationResource, ResourceChangeEvent, ResourceDescriptor, ResourceOwner,
};
use crate::reconciler::validate_desired;

pub struct ResourceService {
    dal: DAL,
    notifier: Arc<dyn ResourceChangeNotifier>,
}

impl ResourceService {
    pub fn new(dal: DAL, notifier: Arc<dyn ResourceChangeNotifier>) -> Self {
        Self { dal, notifier }
    }

    /// Makes the owner's live resources equal `desired`, keyed by view id.
    ///
    /// An empty `desired` removes every resource. Calling twice with the same
    /// input writes nothing the second time.
    ///
    /// # Errors
    ///
    /// * `Validation` for ownership violations or duplicate views, before any write
    /// * `NotFound` if the owning inventory or work order does not exist
    /// * `Storage` if the transaction fails or the context trips; nothing is committed
    pub async fn reconcile_resources(
        &self,
        ctx: &CallContext,
        owner: ResourceOwner,
        desired: Vec<ResourceDescriptor>,
    ) -> Result<ReconcileOutcome, WorkOrderError> {
        validate_desired(owner, &desired)?;
        self.ensure_owner_exists(owner).await?;

        let outcome = self
            .dal
            .resource()
            .reconcile(ctx, owner, desired)
            .await
            .map_err(|e| match e {
                ReconcileError::Validation(e) => WorkOrderError::Validation(e),
                ReconcileError::Storage(e) => {
                    WorkOrderError::storage("reconcile_resources", owner.to_string(), e)
                }
            })?;

        let plan = &outcome.plan;
        let kind = owner.kind();
        counter!("workorder_resources_inserted_total", "owner_kind" => kind)
            .increment(plan.inserts.len() as u64);
        counter!("workorder_resources_updated_total", "owner_kind" => kind)
            .increment(plan.updates.len() as u64);
        counter!("workorder_resources_deleted_total", "owner_kind" => kind)
            .increment(plan.deletions.len() as u64);

        info!(
            owner = %owner,
            inserted = plan.inserts.len(),
            updated = plan.updates.len(),
            unchanged = plan.unchanged.len(),
            deleted = plan.deletions.len(),
            "Resources reconciled"
        );

        if !plan.is_noop() {
            let event = ResourceChangeEvent {
                owner,
                inserted: plan.inserts.iter().map(|d| d.view_id.clone()).collect(),
                updated: plan
                    .updates
                    .iter()
                    .map(|u| u.descriptor.view_id.clone())
                    .collect(),
                deleted: plan.deletions.iter().map(|r| r.view_id.clone()).collect(),
                view_ids: plan.target_views.clone(),
            };
            if let Err(e) = self.notifier.publish(event).await {
                warn!(owner = %owner, error = %e, "Failed to publish resource change event");
            }
        }

        Ok(outcome)
    }

    /// Lists an owner's live resources.
    pub async fn list_resources(
        &self,
        owner: ResourceOwner,
    ) -> Result<Vec<DataAggregationResource>, WorkOrderError> {
        self.dal
            .resource()
            .list(owner)
            .await
            .map_err(|e| WorkOrderError::storage("list_resources", owner.to_string(), e))
    }

    async fn ensure_owner_exists(&self, owner: ResourceOwner) -> Result<(), WorkOrderError> {
        let exists = match owner {
            ResourceOwner::Inventory(id) => self
                .dal
                .inventory()
                .find(id)
                .await
                .map(|found| found.is_some()),
            ResourceOwner::WorkOrder(id) => self
                .dal
                .work_order()
                .find(id)
                .await
                .map(|found| found.is_some()),
        }
        .map_err(|e| WorkOrderError::storage("reconcile_resources", owner.to_string(), e))?;

        if !exists {
            return Err(WorkOrderError::NotFound {
                entity: owner.kind(),
                id: owner.id().to_string(),
            });
        }
        Ok(())
    }
}
