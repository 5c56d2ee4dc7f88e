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

//! Task lifecycle service.
//!
//! Writes are fail-fast: every task in a call is validated against its owning
//! work order before the transaction starts, and any failure leaves storage
//! untouched.
//!
//! Reads degrade. The detail is resolved through the owning work order's type;
//! if the work order cannot be resolved the task comes back with no detail,
//! and if the detail rows are missing it comes back with an empty detail of
//! the expected kind. Both cases are logged as warnings.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use crate::call_context::CallContext;
use crate::dal::work_order_task::StoredTask;
use crate::dal::DAL;
use crate::database::universal_types::UniversalUuid;
use crate::error::{ValidationError, WorkOrderError};
use crate::external::WorkOrderLookup;
use crate::models::task::validation::{validate_detail, validate_name};
use crate::models::task::{NewWorkOrderTask, TableMatch, TaskFilter, TaskUpdate, WorkOrderTask};
use crate::models::task_detail::TaskDetail;
use crate::models::work_order::WorkOrderType;
use crate::status::{aggregate_task_statuses, ProcessingStatus};

/// Work order types resolved during one call.
type TypeMemo = HashMap<UniversalUuid, Option<WorkOrderType>>;

pub struct TaskService {
    dal: DAL,
    work_orders: Arc<dyn WorkOrderLookup>,
}

impl TaskService {
    pub fn new(dal: DAL, work_orders: Arc<dyn WorkOrderLookup>) -> Self {
        Self { dal, work_orders }
    }

    /// Creates a task and its detail in one transaction.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the owning work order does not exist
    /// * `Validation` if the detail is not the one the work order's type requires
    /// * `Collaborator` if the work order lookup fails
    /// * `Storage` if the write fails; nothing is committed
    pub async fn create_task(
        &self,
        ctx: &CallContext,
        task: NewWorkOrderTask,
    ) -> Result<WorkOrderTask, WorkOrderError> {
        let mut created = self.batch_create_tasks(ctx, vec![task]).await?;
        created.pop().ok_or_else(|| WorkOrderError::NotFound {
            entity: "work_order_task",
            id: "newly created task".to_string(),
        })
    }

    /// Creates tasks all-or-nothing, then re-reads them from storage.
    pub async fn batch_create_tasks(
        &self,
        ctx: &CallContext,
        tasks: Vec<NewWorkOrderTask>,
    ) -> Result<Vec<WorkOrderTask>, WorkOrderError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let mut memo = TypeMemo::new();
        for task in &tasks {
            validate_name(&task.name)?;
            let expected = self.require_work_order_type(&mut memo, task.work_order_id).await?;
            validate_detail(expected, task.work_order_id, &task.detail)?;
        }

        let scope = scope_of(tasks.iter().map(|t| t.work_order_id));
        let count = tasks.len();
        let ids = self
            .dal
            .work_order_task()
            .create_many(ctx, tasks)
            .await
            .map_err(|e| WorkOrderError::storage("create_tasks", scope.clone(), e))?;

        counter!("workorder_tasks_created_total").increment(count as u64);
        info!(scope = %scope, count, "Created tasks");

        self.reread(ids, &mut memo, "create_tasks", scope).await
    }

    /// Replaces a task's mutable fields and its detail.
    ///
    /// `created_at` is kept from storage. One-to-many details are replaced
    /// wholesale: the given list becomes the full detail.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the task or its work order does not exist
    /// * `Validation` if the detail does not match, or the update names a different work order
    /// * `Storage` if the write fails; nothing is committed
    pub async fn update_task(
        &self,
        ctx: &CallContext,
        update: TaskUpdate,
    ) -> Result<WorkOrderTask, WorkOrderError> {
        let id = update.id;
        let mut updated = self.batch_update_tasks(ctx, vec![update]).await?;
        updated.pop().ok_or_else(|| WorkOrderError::NotFound {
            entity: "work_order_task",
            id: id.to_string(),
        })
    }

    /// Updates tasks all-or-nothing, then re-reads them from storage.
    pub async fn batch_update_tasks(
        &self,
        ctx: &CallContext,
        updates: Vec<TaskUpdate>,
    ) -> Result<Vec<WorkOrderTask>, WorkOrderError> {
        if updates.is_empty() {
            return Ok(Vec::new());
        }

        let mut memo = TypeMemo::new();
        for update in &updates {
            validate_name(&update.name)?;
            let stored = self.require_stored(update.id, "update_tasks").await?;
            if stored.task.work_order_id != update.work_order_id {
                return Err(ValidationError::WorkOrderChanged {
                    task_id: update.id.to_string(),
                    stored: stored.task.work_order_id.to_string(),
                    requested: update.work_order_id.to_string(),
                }
                .into());
            }
            let expected = self
                .require_work_order_type(&mut memo, update.work_order_id)
                .await?;
            validate_detail(expected, update.work_order_id, &update.detail)?;
        }

        let scope = scope_of(updates.iter().map(|u| u.work_order_id));
        let ids: Vec<UniversalUuid> = updates.iter().map(|u| u.id).collect();
        let count = updates.len();
        self.dal
            .work_order_task()
            .update_many(ctx, updates)
            .await
            .map_err(|e| WorkOrderError::storage("update_tasks", scope.clone(), e))?;

        counter!("workorder_tasks_updated_total").increment(count as u64);
        info!(scope = %scope, count, "Updated tasks");

        self.reread(ids, &mut memo, "update_tasks", scope).await
    }

    /// Fetches a task with its detail.
    ///
    /// Fails only when the task itself is missing; detail resolution problems
    /// are logged and degrade the detail.
    pub async fn get_task(&self, id: UniversalUuid) -> Result<WorkOrderTask, WorkOrderError> {
        let stored = self.require_stored(id, "get_task").await?;
        let mut memo = TypeMemo::new();
        Ok(self.resolve(stored, &mut memo).await)
    }

    /// Lists tasks matching `filter` with their details, plus the unpaged total.
    pub async fn list_tasks(
        &self,
        filter: TaskFilter,
    ) -> Result<(Vec<WorkOrderTask>, i64), WorkOrderError> {
        let scope = match filter.work_order_id {
            Some(id) => format!("work order {}", id),
            None => "all work orders".to_string(),
        };
        let (rows, total) = self
            .dal
            .work_order_task()
            .list(filter)
            .await
            .map_err(|e| WorkOrderError::storage("list_tasks", scope, e))?;

        let mut memo = TypeMemo::new();
        let mut tasks = Vec::with_capacity(rows.len());
        for stored in rows {
            tasks.push(self.resolve(stored, &mut memo).await);
        }
        Ok((tasks, total))
    }

    /// Lists tasks whose details reference a table, detail narrowed to the
    /// matching rows.
    pub async fn list_tasks_by_table(
        &self,
        table: TableMatch,
    ) -> Result<Vec<WorkOrderTask>, WorkOrderError> {
        let scope = format!("table {}", table.table_name());
        self.dal
            .work_order_task()
            .list_by_table(table)
            .await
            .map_err(|e| WorkOrderError::storage("list_tasks_by_table", scope, e))
    }

    /// Soft-deletes a task and its detail rows.
    pub async fn delete_task(&self, ctx: &CallContext, id: UniversalUuid) -> Result<(), WorkOrderError> {
        let stored = self.require_stored(id, "delete_task").await?;
        let scope = format!("work order {}", stored.task.work_order_id);
        self.dal
            .work_order_task()
            .soft_delete(ctx, id)
            .await
            .map_err(|e| WorkOrderError::storage("delete_task", scope, e))?;

        counter!("workorder_tasks_deleted_total").increment(1);
        info!(task_id = %id, "Deleted task");
        Ok(())
    }

    /// Recomputes a work order's processing status from its live tasks and
    /// stores it.
    pub async fn refresh_work_order_status(
        &self,
        ctx: &CallContext,
        work_order_id: UniversalUuid,
    ) -> Result<ProcessingStatus, WorkOrderError> {
        let scope = format!("work order {}", work_order_id);
        let storage = |e| WorkOrderError::storage("refresh_work_order_status", scope.clone(), e);

        ctx.check().map_err(storage)?;
        let exists = self
            .dal
            .work_order()
            .find(work_order_id)
            .await
            .map_err(storage)?
            .is_some();
        if !exists {
            return Err(WorkOrderError::NotFound {
                entity: "work_order",
                id: work_order_id.to_string(),
            });
        }

        let (rows, _) = self
            .dal
            .work_order_task()
            .list(TaskFilter::for_work_order(work_order_id))
            .await
            .map_err(storage)?;
        let tasks: Vec<WorkOrderTask> = rows.into_iter().map(|s| s.task).collect();
        let status = aggregate_task_statuses(&tasks);

        ctx.check().map_err(storage)?;
        self.dal
            .work_order()
            .update_process_status(work_order_id, status)
            .await
            .map_err(storage)?;

        info!(work_order_id = %work_order_id, status = %status, tasks = tasks.len(), "Refreshed work order status");
        Ok(status)
    }

    /// Resolves the owning work order's type for a write.
    async fn require_work_order_type(
        &self,
        memo: &mut TypeMemo,
        work_order_id: UniversalUuid,
    ) -> Result<WorkOrderType, WorkOrderError> {
        if let Some(Some(kind)) = memo.get(&work_order_id) {
            return Ok(*kind);
        }
        match self.work_orders.get_work_order(work_order_id).await? {
            Some(work_order) => {
                memo.insert(work_order_id, Some(work_order.work_order_type));
                Ok(work_order.work_order_type)
            }
            None => Err(WorkOrderError::NotFound {
                entity: "work_order",
                id: work_order_id.to_string(),
            }),
        }
    }

    async fn require_stored(
        &self,
        id: UniversalUuid,
        operation: &'static str,
    ) -> Result<StoredTask, WorkOrderError> {
        self.dal
            .work_order_task()
            .get(id)
            .await
            .map_err(|e| WorkOrderError::storage(operation, format!("task {}", id), e))?
            .ok_or_else(|| WorkOrderError::NotFound {
                entity: "work_order_task",
                id: id.to_string(),
            })
    }

    /// Re-reads freshly written tasks so callers get stored values.
    async fn reread(
        &self,
        ids: Vec<UniversalUuid>,
        memo: &mut TypeMemo,
        operation: &'static str,
        scope: String,
    ) -> Result<Vec<WorkOrderTask>, WorkOrderError> {
        let rows = self
            .dal
            .work_order_task()
            .get_many(ids)
            .await
            .map_err(|e| WorkOrderError::storage(operation, scope, e))?;

        let mut tasks = Vec::with_capacity(rows.len());
        for stored in rows {
            tasks.push(self.resolve(stored, memo).await);
        }
        Ok(tasks)
    }

    /// Attaches the detail implied by the owning work order's type.
    async fn resolve(&self, stored: StoredTask, memo: &mut TypeMemo) -> WorkOrderTask {
        let recorded = stored.recorded_type();
        let mut task = stored.task;

        let kind = match memo.get(&task.work_order_id) {
            Some(kind) => *kind,
            None => {
                let kind = match self.work_orders.get_work_order(task.work_order_id).await {
                    Ok(Some(work_order)) => Some(work_order.work_order_type),
                    Ok(None) => {
                        warn!(
                            task_id = %task.id,
                            work_order_id = %task.work_order_id,
                            "Owning work order not found; returning task without detail"
                        );
                        None
                    }
                    Err(e) => {
                        warn!(
                            task_id = %task.id,
                            work_order_id = %task.work_order_id,
                            error = %e,
                            "Work order lookup failed; returning task without detail"
                        );
                        None
                    }
                };
                memo.insert(task.work_order_id, kind);
                kind
            }
        };

        let Some(kind) = kind else {
            return task;
        };

        if recorded != Some(kind) {
            warn!(
                task_id = %task.id,
                recorded = %stored.task_type,
                current = %kind,
                "Stored task type differs from work order type; using work order type"
            );
        }

        task.detail = match self.dal.work_order_task().load_detail(task.id, kind).await {
            Ok(Some(detail)) => Some(detail),
            Ok(None) => {
                warn!(task_id = %task.id, expected = %kind, "Task detail missing; returning empty detail");
                Some(TaskDetail::empty(kind))
            }
            Err(e) => {
                warn!(task_id = %task.id, expected = %kind, error = %e, "Failed to load task detail");
                None
            }
        };
        task
    }
}

/// Describes the work orders touched by a batch, for error context.
fn scope_of(work_order_ids: impl Iterator<Item = UniversalUuid>) -> String {
    let mut ids: Vec<UniversalUuid> = work_order_ids.collect();
    ids.sort();
    ids.dedup();
    match ids.as_slice() {
        [single] => format!("work order {}", single),
        many => format!("{} work orders", many.len()),
    }
}
