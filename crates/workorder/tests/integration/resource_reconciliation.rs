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

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::broadcast::error::TryRecvError;
use tokio_util::sync::CancellationToken;
use workorder::models::resource::{
    CollectionMethod, DataAggregationResource, ResourceOwner, SyncFrequency,
};
use workorder::models::work_order::WorkOrderType;
use workorder::{
    BroadcastNotifier, CallContext, LoggingNotifier, UniversalUuid, ValidationError,
    WorkOrderError,
};

use crate::fixtures::{descriptor, TestFixture};

fn views(resources: &[DataAggregationResource]) -> BTreeSet<String> {
    resources.iter().map(|r| r.view_id.clone()).collect()
}

fn ids_by_view(resources: &[DataAggregationResource]) -> HashMap<String, UniversalUuid> {
    resources.iter().map(|r| (r.view_id.clone(), r.id)).collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_resize_keeps_shared_views_and_their_ids() {
    let fixture = TestFixture::new().await;
    let service = fixture.resource_service(Arc::new(LoggingNotifier));
    let inventory = fixture.create_inventory().await;
    let owner = ResourceOwner::Inventory(inventory.id);
    let ctx = CallContext::background();

    let first = service
        .reconcile_resources(&ctx, owner, vec![descriptor("A"), descriptor("B"), descriptor("C")])
        .await
        .expect("initial reconcile failed");
    assert_eq!(views(&first.resources), set(&["A", "B", "C"]));
    let before = ids_by_view(&first.resources);

    let second = service
        .reconcile_resources(&ctx, owner, vec![descriptor("B"), descriptor("C"), descriptor("D")])
        .await
        .expect("resize reconcile failed");

    assert_eq!(second.plan.inserts.len(), 1);
    assert_eq!(second.plan.inserts[0].view_id, "D");
    assert_eq!(second.plan.deletions.len(), 1);
    assert_eq!(second.plan.deletions[0].view_id, "A");
    assert!(second.plan.updates.is_empty());

    let after = ids_by_view(&service.list_resources(owner).await.expect("list failed"));
    assert_eq!(after.keys().cloned().collect::<BTreeSet<_>>(), set(&["B", "C", "D"]));
    assert_eq!(after["B"], before["B"]);
    assert_eq!(after["C"], before["C"]);
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let fixture = TestFixture::new().await;
    let service = fixture.resource_service(Arc::new(LoggingNotifier));
    let inventory = fixture.create_inventory().await;
    let owner = ResourceOwner::Inventory(inventory.id);
    let ctx = CallContext::background();
    let desired = vec![descriptor("A"), descriptor("B")];

    let first = service
        .reconcile_resources(&ctx, owner, desired.clone())
        .await
        .expect("first reconcile failed");
    let second = service
        .reconcile_resources(&ctx, owner, desired)
        .await
        .expect("second reconcile failed");

    assert!(second.plan.is_noop());
    assert_eq!(second.plan.unchanged.len(), 2);

    let mut a = first.resources.clone();
    let mut b = second.resources.clone();
    a.sort_by(|x, y| x.view_id.cmp(&y.view_id));
    b.sort_by(|x, y| x.view_id.cmp(&y.view_id));
    assert_eq!(a, b, "a repeated reconcile must not touch any row");
}

#[tokio::test]
async fn test_changed_values_update_in_place() {
    let fixture = TestFixture::new().await;
    let service = fixture.resource_service(Arc::new(LoggingNotifier));
    let inventory = fixture.create_inventory().await;
    let owner = ResourceOwner::Inventory(inventory.id);
    let ctx = CallContext::background();

    let first = service
        .reconcile_resources(&ctx, owner, vec![descriptor("A")])
        .await
        .expect("initial reconcile failed");
    let original = first.resources[0].clone();

    let mut changed = descriptor("A");
    changed.collection_method = CollectionMethod::Incremental;
    changed.sync_frequency = SyncFrequency::PerHour;
    changed.target_table_name = Some("ods_orders".to_string());

    let second = service
        .reconcile_resources(&ctx, owner, vec![changed])
        .await
        .expect("update reconcile failed");
    assert_eq!(second.plan.updates.len(), 1);
    assert!(second.plan.inserts.is_empty());
    assert!(second.plan.deletions.is_empty());

    let stored = &second.resources[0];
    assert_eq!(stored.id, original.id);
    assert_eq!(stored.created_at, original.created_at);
    assert_eq!(stored.collection_method, CollectionMethod::Incremental);
    assert_eq!(stored.sync_frequency, SyncFrequency::PerHour);
    assert_eq!(stored.target_table_name.as_deref(), Some("ods_orders"));
}

#[tokio::test]
async fn test_empty_desired_removes_everything() {
    let fixture = TestFixture::new().await;
    let service = fixture.resource_service(Arc::new(LoggingNotifier));
    let inventory = fixture.create_inventory().await;
    let owner = ResourceOwner::Inventory(inventory.id);
    let ctx = CallContext::background();

    service
        .reconcile_resources(&ctx, owner, vec![descriptor("A"), descriptor("B")])
        .await
        .expect("initial reconcile failed");

    let cleared = service
        .reconcile_resources(&ctx, owner, Vec::new())
        .await
        .expect("clearing reconcile failed");
    assert_eq!(cleared.plan.deletions.len(), 2);
    assert!(cleared.resources.is_empty());
    assert!(service.list_resources(owner).await.expect("list failed").is_empty());

    let again = service
        .reconcile_resources(&ctx, owner, Vec::new())
        .await
        .expect("empty reconcile failed");
    assert!(again.plan.is_noop());
}

#[tokio::test]
async fn test_exclusive_ownership_rejected_before_any_write() {
    let fixture = TestFixture::new().await;
    let service = fixture.resource_service(Arc::new(LoggingNotifier));
    let inventory = fixture.create_inventory().await;
    let work_order = fixture.create_work_order(WorkOrderType::DataAggregation).await;
    let owner = ResourceOwner::Inventory(inventory.id);
    let ctx = CallContext::background();

    service
        .reconcile_resources(&ctx, owner, vec![descriptor("A")])
        .await
        .expect("initial reconcile failed");

    let mut both = descriptor("B");
    both.inventory_id = Some(inventory.id);
    both.work_order_id = Some(work_order.id);

    let err = service
        .reconcile_resources(&ctx, owner, vec![descriptor("C"), both])
        .await
        .expect_err("dual ownership must be rejected");
    assert!(matches!(
        err,
        WorkOrderError::Validation(ValidationError::ExclusiveOwnership { ref view_id, .. }) if view_id == "B"
    ));

    let stored = service.list_resources(owner).await.expect("list failed");
    assert_eq!(views(&stored), set(&["A"]));
}

#[tokio::test]
async fn test_declared_owner_must_match_scope() {
    let fixture = TestFixture::new().await;
    let service = fixture.resource_service(Arc::new(LoggingNotifier));
    let inventory = fixture.create_inventory().await;
    let other = fixture.create_inventory().await;
    let ctx = CallContext::background();

    let mut foreign = descriptor("A");
    foreign.inventory_id = Some(other.id);

    let err = service
        .reconcile_resources(&ctx, ResourceOwner::Inventory(inventory.id), vec![foreign])
        .await
        .expect_err("foreign owner must be rejected");
    assert!(matches!(
        err,
        WorkOrderError::Validation(ValidationError::OwnerMismatch { .. })
    ));
}

#[tokio::test]
async fn test_duplicate_view_rejected() {
    let fixture = TestFixture::new().await;
    let service = fixture.resource_service(Arc::new(LoggingNotifier));
    let inventory = fixture.create_inventory().await;
    let owner = ResourceOwner::Inventory(inventory.id);

    let err = service
        .reconcile_resources(
            &CallContext::background(),
            owner,
            vec![descriptor("A"), descriptor("A")],
        )
        .await
        .expect_err("duplicate views must be rejected");
    assert!(matches!(
        err,
        WorkOrderError::Validation(ValidationError::DuplicateView { .. })
    ));
    assert!(service.list_resources(owner).await.expect("list failed").is_empty());
}

#[tokio::test]
async fn test_missing_owner_is_not_found() {
    let fixture = TestFixture::new().await;
    let service = fixture.resource_service(Arc::new(LoggingNotifier));

    let err = service
        .reconcile_resources(
            &CallContext::background(),
            ResourceOwner::WorkOrder(UniversalUuid::new_v7()),
            vec![descriptor("A")],
        )
        .await
        .expect_err("unknown owner must fail");
    assert!(matches!(err, WorkOrderError::NotFound { entity: "work_order", .. }));
}

#[tokio::test]
async fn test_work_order_scope_is_isolated_from_inventory_scope() {
    let fixture = TestFixture::new().await;
    let service = fixture.resource_service(Arc::new(LoggingNotifier));
    let inventory = fixture.create_inventory().await;
    let work_order = fixture.create_work_order(WorkOrderType::DataAggregation).await;
    let ctx = CallContext::background();

    let inventory_owner = ResourceOwner::Inventory(inventory.id);
    let work_order_owner = ResourceOwner::WorkOrder(work_order.id);

    service
        .reconcile_resources(&ctx, inventory_owner, vec![descriptor("A"), descriptor("B")])
        .await
        .expect("inventory reconcile failed");
    let outcome = service
        .reconcile_resources(&ctx, work_order_owner, vec![descriptor("A")])
        .await
        .expect("work order reconcile failed");

    assert_eq!(outcome.plan.inserts.len(), 1);
    assert!(outcome.plan.deletions.is_empty());
    assert!(outcome
        .resources
        .iter()
        .all(|r| r.owner == work_order_owner));

    service
        .reconcile_resources(&ctx, work_order_owner, Vec::new())
        .await
        .expect("clearing work order failed");

    let inventory_rows = service.list_resources(inventory_owner).await.expect("list failed");
    assert_eq!(views(&inventory_rows), set(&["A", "B"]));
}

#[tokio::test]
async fn test_cancelled_context_commits_nothing() {
    let fixture = TestFixture::new().await;
    let service = fixture.resource_service(Arc::new(LoggingNotifier));
    let inventory = fixture.create_inventory().await;
    let owner = ResourceOwner::Inventory(inventory.id);

    service
        .reconcile_resources(&CallContext::background(), owner, vec![descriptor("A")])
        .await
        .expect("initial reconcile failed");

    let token = CancellationToken::new();
    token.cancel();
    let ctx = CallContext::background().with_cancellation(token);

    let err = service
        .reconcile_resources(&ctx, owner, vec![descriptor("B")])
        .await
        .expect_err("cancelled reconcile must fail");
    assert!(matches!(err, WorkOrderError::Storage { .. }));

    let stored = service.list_resources(owner).await.expect("list failed");
    assert_eq!(views(&stored), set(&["A"]));
}

#[tokio::test]
async fn test_change_event_published_only_for_real_changes() {
    let fixture = TestFixture::new().await;
    let notifier = Arc::new(BroadcastNotifier::new(8));
    let mut events = notifier.subscribe();
    let service = fixture.resource_service(notifier.clone());
    let inventory = fixture.create_inventory().await;
    let owner = ResourceOwner::Inventory(inventory.id);
    let ctx = CallContext::background();

    service
        .reconcile_resources(&ctx, owner, vec![descriptor("A"), descriptor("B")])
        .await
        .expect("initial reconcile failed");

    let event = events.try_recv().expect("expected a change event");
    assert_eq!(event.owner, owner);
    assert_eq!(event.inserted.len(), 2);
    assert_eq!(event.view_ids, vec!["A".to_string(), "B".to_string()]);

    service
        .reconcile_resources(&ctx, owner, vec![descriptor("A"), descriptor("B")])
        .await
        .expect("repeat reconcile failed");
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_publish_failure_does_not_fail_reconcile() {
    let fixture = TestFixture::new().await;
    // No subscriber, so every publish fails
    let service = fixture.resource_service(Arc::new(BroadcastNotifier::new(1)));
    let inventory = fixture.create_inventory().await;
    let owner = ResourceOwner::Inventory(inventory.id);

    let outcome = service
        .reconcile_resources(&CallContext::background(), owner, vec![descriptor("A")])
        .await
        .expect("reconcile must succeed without subscribers");
    assert_eq!(outcome.resources.len(), 1);
}
