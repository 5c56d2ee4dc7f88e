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

//! Data Aggregation Resource Model
//!
//! A resource binds one logical view to an owner, either an inventory or a
//! work order. Resources are always written as a set through the reconciler;
//! the view id is their identity, the surrogate id is a storage detail.

use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// How a resource's data is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionMethod {
    Full,
    Incremental,
}

impl CollectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionMethod::Full => "Full",
            CollectionMethod::Incremental => "Incremental",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Full" => Some(CollectionMethod::Full),
            "Incremental" => Some(CollectionMethod::Incremental),
            _ => None,
        }
    }
}

/// How often a resource is synchronised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncFrequency {
    PerMinute,
    PerHour,
    PerDay,
    PerWeek,
    PerMonth,
    PerYear,
}

impl SyncFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncFrequency::PerMinute => "PerMinute",
            SyncFrequency::PerHour => "PerHour",
            SyncFrequency::PerDay => "PerDay",
            SyncFrequency::PerWeek => "PerWeek",
            SyncFrequency::PerMonth => "PerMonth",
            SyncFrequency::PerYear => "PerYear",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PerMinute" => Some(SyncFrequency::PerMinute),
            "PerHour" => Some(SyncFrequency::PerHour),
            "PerDay" => Some(SyncFrequency::PerDay),
            "PerWeek" => Some(SyncFrequency::PerWeek),
            "PerMonth" => Some(SyncFrequency::PerMonth),
            "PerYear" => Some(SyncFrequency::PerYear),
            _ => None,
        }
    }
}

/// The scope a resource set is reconciled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum ResourceOwner {
    Inventory(UniversalUuid),
    WorkOrder(UniversalUuid),
}

impl ResourceOwner {
    pub fn id(&self) -> UniversalUuid {
        match self {
            ResourceOwner::Inventory(id) | ResourceOwner::WorkOrder(id) => *id,
        }
    }

    /// Short label used in logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceOwner::Inventory(_) => "inventory",
            ResourceOwner::WorkOrder(_) => "work_order",
        }
    }

    pub fn inventory_id(&self) -> Option<UniversalUuid> {
        match self {
            ResourceOwner::Inventory(id) => Some(*id),
            ResourceOwner::WorkOrder(_) => None,
        }
    }

    pub fn work_order_id(&self) -> Option<UniversalUuid> {
        match self {
            ResourceOwner::WorkOrder(id) => Some(*id),
            ResourceOwner::Inventory(_) => None,
        }
    }
}

impl std::fmt::Display for ResourceOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceOwner::Inventory(id) => write!(f, "inventory {}", id),
            ResourceOwner::WorkOrder(id) => write!(f, "work order {}", id),
        }
    }
}

/// Inbound description of one desired resource.
///
/// The owner fields are optional: when omitted the resource takes the owner
/// it is reconciled under. When supplied they must name that owner, and at
/// most one may be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub view_id: String,
    #[serde(default)]
    pub inventory_id: Option<UniversalUuid>,
    #[serde(default)]
    pub work_order_id: Option<UniversalUuid>,
    pub collection_method: CollectionMethod,
    pub sync_frequency: SyncFrequency,
    #[serde(default)]
    pub business_form_id: String,
    pub target_datasource_id: String,
    #[serde(default)]
    pub target_table_name: Option<String>,
}

impl ResourceDescriptor {
    pub fn new(
        view_id: impl Into<String>,
        collection_method: CollectionMethod,
        sync_frequency: SyncFrequency,
        target_datasource_id: impl Into<String>,
    ) -> Self {
        Self {
            view_id: view_id.into(),
            inventory_id: None,
            work_order_id: None,
            collection_method,
            sync_frequency,
            business_form_id: String::new(),
            target_datasource_id: target_datasource_id.into(),
            target_table_name: None,
        }
    }

    /// Checks the declared owner fields against the reconcile scope.
    pub fn validate_owner(&self, scope: &ResourceOwner) -> Result<(), ValidationError> {
        if let (Some(inventory_id), Some(work_order_id)) = (self.inventory_id, self.work_order_id) {
            return Err(ValidationError::ExclusiveOwnership {
                view_id: self.view_id.clone(),
                inventory_id: inventory_id.to_string(),
                work_order_id: work_order_id.to_string(),
            });
        }

        let declared = match (self.inventory_id, self.work_order_id) {
            (Some(id), None) => Some(ResourceOwner::Inventory(id)),
            (None, Some(id)) => Some(ResourceOwner::WorkOrder(id)),
            _ => None,
        };
        match declared {
            Some(declared) if declared != *scope => Err(ValidationError::OwnerMismatch {
                view_id: self.view_id.clone(),
                declared: declared.to_string(),
                scope: scope.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// True when a stored resource already holds this descriptor's values.
    pub fn matches(&self, stored: &DataAggregationResource) -> bool {
        self.view_id == stored.view_id
            && self.collection_method == stored.collection_method
            && self.sync_frequency == stored.sync_frequency
            && self.business_form_id == stored.business_form_id
            && self.target_datasource_id == stored.target_datasource_id
            && self.target_table_name == stored.target_table_name
    }
}

/// A stored resource (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAggregationResource {
    pub id: UniversalUuid,
    pub view_id: String,
    pub owner: ResourceOwner,
    pub collection_method: CollectionMethod,
    pub sync_frequency: SyncFrequency,
    pub business_form_id: String,
    pub target_datasource_id: String,
    pub target_table_name: Option<String>,
    pub created_at: UniversalTimestamp,
    pub updated_at: UniversalTimestamp,
}

/// Published after a reconciliation commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceChangeEvent {
    pub owner: ResourceOwner,
    pub inserted: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    /// View ids of the full resource set after the change
    pub view_ids: Vec<String>,
}
