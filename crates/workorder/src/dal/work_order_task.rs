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

//! Task data access.
//!
//! A task is one common row in `work_order_tasks` plus its detail rows. Writes
//! put both in the same transaction, so a reader never sees a task without the
//! detail it was written with. This layer does not validate; callers check
//! the detail against the owning work order first.
//!
//! Reads return [`StoredTask`], the common row plus its stored type tag. The
//! detail is loaded separately with [`WorkOrderTaskDAL::load_detail`] once the
//! caller knows which type to resolve.

use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};

use super::models::{NewSqliteWorkOrderTask, SqliteWorkOrderTask, SqliteWorkOrderTaskChanges};
use super::DAL;
use crate::call_context::CallContext;
use crate::database::schema::work_order_tasks;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::StorageError;
use crate::models::task::{NewWorkOrderTask, TableMatch, TaskFilter, TaskUpdate, WorkOrderTask};
use crate::models::task_detail::TaskDetail;
use crate::models::work_order::WorkOrderType;

pub(crate) mod detail;

/// A task's common row with the type tag recorded when it was written.
#[derive(Debug, Clone)]
pub struct StoredTask {
    /// The task, with `detail` not yet resolved
    pub task: WorkOrderTask,
    /// Raw stored tag; may not parse if it predates a type rename
    pub task_type: String,
}

impl StoredTask {
    pub fn recorded_type(&self) -> Option<WorkOrderType> {
        WorkOrderType::from_str(&self.task_type)
    }
}

impl TryFrom<SqliteWorkOrderTask> for StoredTask {
    type Error = StorageError;

    fn try_from(row: SqliteWorkOrderTask) -> Result<Self, Self::Error> {
        let task_type = row.task_type.clone();
        Ok(StoredTask {
            task: WorkOrderTask::try_from(row)?,
            task_type,
        })
    }
}

/// Data access layer for tasks.
#[derive(Clone)]
pub struct WorkOrderTaskDAL<'a> {
    dal: &'a DAL,
}

impl<'a> WorkOrderTaskDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Inserts tasks and their detail rows in one transaction.
    ///
    /// Returns the new ids in input order. Nothing is written if any insert
    /// fails or the context trips.
    pub async fn create_many(
        &self,
        ctx: &CallContext,
        new_tasks: Vec<NewWorkOrderTask>,
    ) -> Result<Vec<UniversalUuid>, StorageError> {
        self.dal
            .transaction(ctx, move |conn, ctx| {
                let now = UniversalTimestamp::now().to_rfc3339();
                let mut ids = Vec::with_capacity(new_tasks.len());

                for new_task in &new_tasks {
                    ctx.check()?;
                    let id = UniversalUuid::new_v7();
                    let row = NewSqliteWorkOrderTask {
                        id: id.to_bytes(),
                        work_order_id: new_task.work_order_id.to_bytes(),
                        task_type: new_task.detail.kind().as_str().to_string(),
                        name: new_task.name.clone(),
                        third_party_id: new_task.third_party_id.clone(),
                        status: new_task.status.clone(),
                        reason: new_task.reason.clone(),
                        link: new_task.link.clone(),
                        created_at: now.clone(),
                        updated_at: now.clone(),
                    };
                    diesel::insert_into(work_order_tasks::table)
                        .values(&row)
                        .execute(conn)?;
                    detail::insert_detail(
                        conn,
                        id,
                        new_task.work_order_id,
                        &new_task.detail,
                        &now,
                    )?;
                    ids.push(id);
                }

                ctx.check()?;
                Ok(ids)
            })
            .await
    }

    /// Overwrites tasks and their details in one transaction.
    ///
    /// `created_at` and `work_order_id` are never written. A task that does
    /// not exist or is tombstoned fails the whole batch with `MissingRow`.
    pub async fn update_many(
        &self,
        ctx: &CallContext,
        updates: Vec<TaskUpdate>,
    ) -> Result<(), StorageError> {
        self.dal
            .transaction(ctx, move |conn, ctx| {
                let now = UniversalTimestamp::now().to_rfc3339();

                for update in &updates {
                    ctx.check()?;
                    let changes = SqliteWorkOrderTaskChanges {
                        task_type: update.detail.kind().as_str().to_string(),
                        name: update.name.clone(),
                        third_party_id: update.third_party_id.clone(),
                        status: update.status.clone(),
                        reason: update.reason.clone(),
                        link: update.link.clone(),
                        updated_at: now.clone(),
                    };
                    let affected = diesel::update(
                        work_order_tasks::table
                            .filter(work_order_tasks::id.eq(update.id.to_bytes()))
                            .filter(work_order_tasks::deleted_at.is_null()),
                    )
                    .set(&changes)
                    .execute(conn)?;
                    if affected == 0 {
                        return Err(StorageError::MissingRow {
                            table: "work_order_task",
                            id: update.id.to_string(),
                        });
                    }

                    detail::replace_detail(
                        conn,
                        update.id,
                        update.work_order_id,
                        &update.detail,
                        &now,
                    )?;
                }

                ctx.check()?;
                Ok(())
            })
            .await
    }

    /// Tombstones a task and all of its detail rows.
    pub async fn soft_delete(&self, ctx: &CallContext, id: UniversalUuid) -> Result<(), StorageError> {
        self.dal
            .transaction(ctx, move |conn, _ctx| {
                let now = UniversalTimestamp::now().to_rfc3339();
                let affected = diesel::update(
                    work_order_tasks::table
                        .filter(work_order_tasks::id.eq(id.to_bytes()))
                        .filter(work_order_tasks::deleted_at.is_null()),
                )
                .set((
                    work_order_tasks::deleted_at.eq(Some(now.clone())),
                    work_order_tasks::updated_at.eq(now.clone()),
                ))
                .execute(conn)?;
                if affected == 0 {
                    return Err(StorageError::MissingRow {
                        table: "work_order_task",
                        id: id.to_string(),
                    });
                }
                detail::tombstone_details(conn, id, &now, None)?;
                Ok(())
            })
            .await
    }

    /// Fetches a live task's common row.
    pub async fn get(&self, id: UniversalUuid) -> Result<Option<StoredTask>, StorageError> {
        let id_bytes = id.to_bytes();
        let row: Option<SqliteWorkOrderTask> = self
            .dal
            .interact(move |conn| {
                Ok(work_order_tasks::table
                    .filter(work_order_tasks::id.eq(id_bytes))
                    .filter(work_order_tasks::deleted_at.is_null())
                    .select(SqliteWorkOrderTask::as_select())
                    .first(conn)
                    .optional()?)
            })
            .await?;

        row.map(StoredTask::try_from).transpose()
    }

    /// Fetches live tasks by id, in the order given. Missing ids are skipped.
    pub async fn get_many(&self, ids: Vec<UniversalUuid>) -> Result<Vec<StoredTask>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_bytes: Vec<Vec<u8>> = ids.iter().map(UniversalUuid::to_bytes).collect();
        let rows: Vec<SqliteWorkOrderTask> = self
            .dal
            .interact(move |conn| load_live_by_ids(conn, id_bytes))
            .await?;

        let mut stored = rows
            .into_iter()
            .map(StoredTask::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        stored.sort_by_key(|s| ids.iter().position(|id| *id == s.task.id));
        Ok(stored)
    }

    /// Loads a task's live detail of the given kind, `None` if it has none.
    pub async fn load_detail(
        &self,
        task_id: UniversalUuid,
        kind: WorkOrderType,
    ) -> Result<Option<TaskDetail>, StorageError> {
        self.dal
            .interact(move |conn| detail::load_detail(conn, task_id, kind))
            .await
    }

    /// Lists live tasks matching `filter`, newest first, with the total count
    /// before paging.
    pub async fn list(&self, filter: TaskFilter) -> Result<(Vec<StoredTask>, i64), StorageError> {
        let (rows, total): (Vec<SqliteWorkOrderTask>, i64) = self
            .dal
            .interact(move |conn| {
                let total: i64 = filtered(&filter).count().get_result(conn)?;

                let mut query = filtered(&filter)
                    .select(SqliteWorkOrderTask::as_select())
                    .order((work_order_tasks::created_at.desc(), work_order_tasks::id.desc()));
                if filter.limit > 0 {
                    query = query.limit(filter.limit);
                }
                if filter.offset > 0 {
                    // SQLite only accepts OFFSET after LIMIT
                    if filter.limit <= 0 {
                        query = query.limit(-1);
                    }
                    query = query.offset(filter.offset);
                }
                let rows = query.load(conn)?;
                Ok((rows, total))
            })
            .await?;

        let stored = rows
            .into_iter()
            .map(StoredTask::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((stored, total))
    }

    /// Returns live tasks whose detail rows reference a table.
    ///
    /// Each task's detail holds only the rows that matched.
    pub async fn list_by_table(&self, table: TableMatch) -> Result<Vec<WorkOrderTask>, StorageError> {
        self.dal
            .interact(move |conn| {
                let matches = detail::details_matching_table(conn, &table)?;
                if matches.is_empty() {
                    return Ok(Vec::new());
                }

                let id_bytes: Vec<Vec<u8>> = matches.iter().map(|(id, _)| id.to_bytes()).collect();
                let rows = load_live_by_ids(conn, id_bytes)?;
                let mut tasks = rows
                    .into_iter()
                    .map(WorkOrderTask::try_from)
                    .collect::<Result<Vec<_>, _>>()?;

                for task in tasks.iter_mut() {
                    task.detail = matches
                        .iter()
                        .find(|(id, _)| *id == task.id)
                        .map(|(_, detail)| detail.clone());
                }
                Ok(tasks)
            })
            .await
    }
}

fn filtered(filter: &TaskFilter) -> work_order_tasks::BoxedQuery<'static, Sqlite> {
    let mut query = work_order_tasks::table
        .filter(work_order_tasks::deleted_at.is_null())
        .into_boxed();

    if let Some(work_order_id) = filter.work_order_id {
        query = query.filter(work_order_tasks::work_order_id.eq(work_order_id.to_bytes()));
    }
    if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.is_empty()) {
        query = query.filter(
            work_order_tasks::name
                .like(contains_pattern(keyword))
                .escape('\\'),
        );
    }
    if !filter.statuses.is_empty() {
        query = query.filter(work_order_tasks::status.eq_any(filter.statuses.clone()));
    }
    if let Some(kind) = filter.work_order_type {
        query = query.filter(work_order_tasks::task_type.eq(kind.as_str()));
    }
    query
}

/// `LIKE` pattern matching `keyword` literally anywhere in the value.
/// Pair with `.escape('\\')`.
fn contains_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn load_live_by_ids(
    conn: &mut SqliteConnection,
    id_bytes: Vec<Vec<u8>>,
) -> Result<Vec<SqliteWorkOrderTask>, StorageError> {
    Ok(work_order_tasks::table
        .filter(work_order_tasks::id.eq_any(id_bytes))
        .filter(work_order_tasks::deleted_at.is_null())
        .order(work_order_tasks::id.asc())
        .select(SqliteWorkOrderTask::as_select())
        .load(conn)?)
}
