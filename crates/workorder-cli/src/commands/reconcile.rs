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

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::json;
use workorder::models::resource::{ResourceDescriptor, ResourceOwner};
use workorder::{LoggingNotifier, ResourceService, UniversalUuid};

use super::{print_json, AppContext};

/// Picks the reconcile scope from the mutually exclusive owner flags.
pub fn owner_from_flags(
    inventory: Option<UniversalUuid>,
    work_order: Option<UniversalUuid>,
) -> Result<ResourceOwner> {
    match (inventory, work_order) {
        (Some(id), None) => Ok(ResourceOwner::Inventory(id)),
        (None, Some(id)) => Ok(ResourceOwner::WorkOrder(id)),
        _ => bail!("exactly one of --inventory or --work-order is required"),
    }
}

pub fn read_descriptors(path: &Path) -> Result<Vec<ResourceDescriptor>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of resource descriptors", path.display()))
}

pub async fn reconcile(app: &AppContext, owner: ResourceOwner, file: &Path) -> Result<()> {
    let desired = read_descriptors(file)?;
    let service = ResourceService::new(app.dal.clone(), Arc::new(LoggingNotifier));

    let outcome = service
        .reconcile_resources(&app.config.call_context(), owner, desired)
        .await?;

    let plan = &outcome.plan;
    print_json(&json!({
        "owner": owner,
        "inserted": plan.inserts.iter().map(|d| &d.view_id).collect::<Vec<_>>(),
        "updated": plan.updates.iter().map(|u| &u.descriptor.view_id).collect::<Vec<_>>(),
        "deleted": plan.deletions.iter().map(|r| &r.view_id).collect::<Vec<_>>(),
        "unchanged": plan.unchanged.len(),
        "resources": outcome.resources,
    }))
}
