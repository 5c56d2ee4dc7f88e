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
use workorder::{CatalogStatusService, NoComprehensionPlans};

use super::tasks::task_service;
use super::{print_json, AppContext};

pub async fn catalog_status(app: &AppContext, table: &str, details: bool) -> Result<()> {
    let directory = Arc::new(app.config.directory());
    let service = CatalogStatusService::new(
        Arc::new(task_service(app)),
        directory.clone(),
        directory,
        Arc::new(NoComprehensionPlans),
    );

    if details {
        print_json(&service.get_aggregation_info(table).await?)
    } else {
        print_json(&service.get_catalog_processing_status(table).await?)
    }
}
