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

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use workorder::models::task::TaskFilter;
use workorder::{TaskService, UniversalUuid};

use super::{print_json, AppContext};

pub fn task_service(app: &AppContext) -> TaskService {
    TaskService::new(app.dal.clone(), Arc::new(app.dal.clone()))
}

pub async fn list_tasks(app: &AppContext, filter: TaskFilter) -> Result<()> {
    let (tasks, total) = task_service(app).list_tasks(filter).await?;
    print_json(&json!({ "total": total, "tasks": tasks }))
}

pub async fn refresh_status(app: &AppContext, work_order_id: UniversalUuid) -> Result<()> {
    let status = task_service(app)
        .refresh_work_order_status(&app.config.call_context(), work_order_id)
        .await?;
    print_json(&json!({
        "work_order_id": work_order_id,
        "process_status": status.as_str(),
    }))
}
