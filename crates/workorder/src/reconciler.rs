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

//! # Resource Reconciliation
//!
//! Computes how to make the stored resources of one owner equal a desired set.
//! Resources are keyed by `view_id`; surrogate ids never take part in equality.
//!
//! Planning is pure. [`crate::dal::ResourceDAL::apply_plan`] executes a plan in
//! one transaction: one batch insert, one update per changed row and one batch
//! soft-delete.
//!
//! A desired descriptor whose view already exists keeps the existing row id.
//! When its values are identical to the stored row it is left untouched, which
//! makes a repeated reconcile with the same input write nothing.

use std::collections::{HashMap, HashSet};

use crate::database::universal_types::UniversalUuid;
use crate::error::ValidationError;
use crate::models::resource::{DataAggregationResource, ResourceDescriptor, ResourceOwner};

/// A desired resource that maps onto an existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    /// Existing row id, carried forward
    pub id: UniversalUuid,
    pub descriptor: ResourceDescriptor,
}

/// The writes needed to converge one owner's resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub owner: ResourceOwner,
    pub inserts: Vec<ResourceDescriptor>,
    pub updates: Vec<PlannedUpdate>,
    /// Rows whose stored values already match
    pub unchanged: Vec<UniversalUuid>,
    /// Rows whose view is absent from the desired set
    pub deletions: Vec<DataAggregationResource>,
    /// View ids the owner holds once the plan is applied, in desired order
    pub target_views: Vec<String>,
}

impl ReconciliationPlan {
    /// True when applying the plan would write nothing.
    pub fn is_noop(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletions.is_empty()
    }

    pub fn deletion_ids(&self) -> Vec<UniversalUuid> {
        self.deletions.iter().map(|row| row.id).collect()
    }
}

/// Checks a desired set without looking at stored rows.
///
/// # Errors
///
/// * [`ValidationError::ExclusiveOwnership`] if a descriptor names both an inventory and a work order
/// * [`ValidationError::OwnerMismatch`] if a descriptor names an owner other than `owner`
/// * [`ValidationError::DuplicateView`] if a view appears twice in `desired`
/// * [`ValidationError::EmptyField`] if a descriptor has an empty view id
pub fn validate_desired(
    owner: ResourceOwner,
    desired: &[ResourceDescriptor],
) -> Result<HashSet<&str>, ValidationError> {
    let mut desired_views: HashSet<&str> = HashSet::with_capacity(desired.len());
    for descriptor in desired {
        if descriptor.view_id.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "view_id" });
        }
        descriptor.validate_owner(&owner)?;
        if !desired_views.insert(descriptor.view_id.as_str()) {
            return Err(ValidationError::DuplicateView {
                view_id: descriptor.view_id.clone(),
            });
        }
    }
    Ok(desired_views)
}

/// Plans the writes that make `actual` equal `desired` under `owner`.
///
/// The desired set is validated with [`validate_desired`] before anything is
/// planned, so an invalid set never produces a partial plan.
pub fn plan_reconciliation(
    owner: ResourceOwner,
    actual: &[DataAggregationResource],
    desired: &[ResourceDescriptor],
) -> Result<ReconciliationPlan, ValidationError> {
    let desired_views = validate_desired(owner, desired)?;

    let existing: HashMap<&str, &DataAggregationResource> = actual
        .iter()
        .map(|row| (row.view_id.as_str(), row))
        .collect();

    let mut plan = ReconciliationPlan {
        owner,
        inserts: Vec::new(),
        updates: Vec::new(),
        unchanged: Vec::new(),
        deletions: Vec::new(),
        target_views: desired.iter().map(|d| d.view_id.clone()).collect(),
    };

    for descriptor in desired {
        match existing.get(descriptor.view_id.as_str()) {
            Some(row) if descriptor.matches(row) => plan.unchanged.push(row.id),
            Some(row) => plan.updates.push(PlannedUpdate {
                id: row.id,
                descriptor: descriptor.clone(),
            }),
            None => plan.inserts.push(descriptor.clone()),
        }
    }

    plan.deletions = actual
        .iter()
        .filter(|row| !desired_views.contains(row.view_id.as_str()))
        .cloned()
        .collect();

    Ok(plan)
}
