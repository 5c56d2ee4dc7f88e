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

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use workorder::models::task::{NewWorkOrderTask, TaskFilter, TaskStatus, TaskUpdate};
use workorder::models::task_detail::{
    DataAggregationDetail, DataComprehensionDetail, DataFusionDetail, DataQualityAuditDetail,
    DataQualityDetail, TableRef, TaskDetail,
};
use workorder::models::work_order::{WorkOrder, WorkOrderType};
use workorder::{
    CallContext, CollaboratorError, ProcessingStatus, TaskService, UniversalUuid,
    ValidationError, WorkOrderError, WorkOrderLookup,
};

use crate::fixtures::TestFixture;

fn aggregation_detail(target_table: &str) -> TaskDetail {
    TaskDetail::DataAggregation(vec![DataAggregationDetail {
        id: None,
        department_id: "dept-1".to_string(),
        source: TableRef {
            datasource_id: "ds-src".to_string(),
            table_name: "raw_orders".to_string(),
        },
        target: TableRef {
            datasource_id: "ds-dst".to_string(),
            table_name: target_table.to_string(),
        },
        count: 10,
    }])
}

fn fusion_detail(table: &str) -> TaskDetail {
    TaskDetail::DataFusion(DataFusionDetail {
        datasource_id: "ds-1".to_string(),
        datasource_name: "warehouse".to_string(),
        data_table: table.to_string(),
    })
}

fn audit_item(table: &str, status: TaskStatus) -> DataQualityAuditDetail {
    DataQualityAuditDetail {
        datasource_id: "ds-1".to_string(),
        datasource_name: "warehouse".to_string(),
        data_table: table.to_string(),
        detection_scheme: "null-check".to_string(),
        status: status.as_str().to_string(),
        ..Default::default()
    }
}

/// Reports every work order as a fixed type, or fails every call.
struct FixedLookup(Option<WorkOrder>);

#[async_trait]
impl WorkOrderLookup for FixedLookup {
    async fn get_work_order(&self, _id: UniversalUuid) -> Result<Option<WorkOrder>, CollaboratorError> {
        match &self.0 {
            Some(work_order) => Ok(Some(work_order.clone())),
            None => Err(CollaboratorError::new("work_order_lookup", "service unavailable")),
        }
    }
}

#[tokio::test]
async fn test_create_and_get_every_detail_kind() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let ctx = CallContext::background();

    let cases = [
        (WorkOrderType::DataAggregation, aggregation_detail("dw_orders")),
        (
            WorkOrderType::DataComprehension,
            TaskDetail::DataComprehension(DataComprehensionDetail::default()),
        ),
        (WorkOrderType::DataFusion, fusion_detail("dw_orders")),
        (
            WorkOrderType::DataQuality,
            TaskDetail::DataQuality(DataQualityDetail::default()),
        ),
        (
            WorkOrderType::DataQualityAudit,
            TaskDetail::DataQualityAudit(vec![audit_item("dw_orders", TaskStatus::Running)]),
        ),
    ];

    for (kind, detail) in cases {
        let work_order = fixture.create_work_order(kind).await;
        let created = service
            .create_task(&ctx, NewWorkOrderTask::running(work_order.id, "task", detail))
            .await
            .unwrap_or_else(|e| panic!("create failed for {}: {}", kind, e));

        let fetched = service.get_task(created.id).await.expect("get failed");
        let detail = fetched.detail.as_ref().expect("detail should resolve");
        assert_eq!(detail.kind(), kind);
        assert_eq!(fetched.known_status(), Some(TaskStatus::Running));
        assert_eq!(fetched.work_order_id, work_order.id);
    }
}

#[tokio::test]
async fn test_list_details_get_ids_assigned() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let work_order = fixture.create_work_order(WorkOrderType::DataQualityAudit).await;

    let created = service
        .create_task(
            &CallContext::background(),
            NewWorkOrderTask::running(
                work_order.id,
                "audit",
                TaskDetail::DataQualityAudit(vec![
                    audit_item("orders", TaskStatus::Running),
                    audit_item("customers", TaskStatus::Running),
                ]),
            ),
        )
        .await
        .expect("create failed");

    let items = created
        .detail
        .as_ref()
        .and_then(|d| d.as_quality_audit())
        .expect("audit detail expected");
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.id.is_some()));
    assert!(items.iter().all(|item| item.work_order_id == Some(work_order.id)));
}

#[tokio::test]
async fn test_mismatched_detail_names_the_work_order_type() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let work_order = fixture.create_work_order(WorkOrderType::DataFusion).await;

    let err = service
        .create_task(
            &CallContext::background(),
            NewWorkOrderTask::running(
                work_order.id,
                "wrong",
                TaskDetail::DataQuality(DataQualityDetail::default()),
            ),
        )
        .await
        .expect_err("mismatched detail must be rejected");

    assert!(matches!(
        err,
        WorkOrderError::Validation(ValidationError::DetailMismatch {
            expected: WorkOrderType::DataFusion,
            found: WorkOrderType::DataQuality,
        })
    ));
    assert!(err.to_string().contains("DataFusion"));

    let (tasks, total) = service
        .list_tasks(TaskFilter::for_work_order(work_order.id))
        .await
        .expect("list failed");
    assert!(tasks.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_aggregation_work_order_rejects_fusion_detail() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let work_order = fixture.create_work_order(WorkOrderType::DataAggregation).await;

    let err = service
        .create_task(
            &CallContext::background(),
            NewWorkOrderTask::running(work_order.id, "wrong", fusion_detail("orders")),
        )
        .await
        .expect_err("fusion detail must be rejected");
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_empty_list_detail_rejected() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let work_order = fixture.create_work_order(WorkOrderType::DataAggregation).await;

    let err = service
        .create_task(
            &CallContext::background(),
            NewWorkOrderTask::running(work_order.id, "empty", TaskDetail::DataAggregation(Vec::new())),
        )
        .await
        .expect_err("empty aggregation list must be rejected");
    assert!(matches!(
        err,
        WorkOrderError::Validation(ValidationError::MissingDetail { .. })
    ));
}

#[tokio::test]
async fn test_create_for_unknown_work_order_is_not_found() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();

    let err = service
        .create_task(
            &CallContext::background(),
            NewWorkOrderTask::running(UniversalUuid::new_v7(), "orphan", fusion_detail("orders")),
        )
        .await
        .expect_err("unknown work order must fail");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_batch_create_is_all_or_nothing() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let fusion = fixture.create_work_order(WorkOrderType::DataFusion).await;
    let quality = fixture.create_work_order(WorkOrderType::DataQuality).await;

    let err = service
        .batch_create_tasks(
            &CallContext::background(),
            vec![
                NewWorkOrderTask::running(fusion.id, "good", fusion_detail("orders")),
                NewWorkOrderTask::running(quality.id, "bad", fusion_detail("orders")),
            ],
        )
        .await
        .expect_err("batch with one invalid task must fail");
    assert!(err.is_validation());

    let (_, total) = service.list_tasks(TaskFilter::default()).await.expect("list failed");
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_batch_create_across_work_orders() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let fusion = fixture.create_work_order(WorkOrderType::DataFusion).await;
    let quality = fixture.create_work_order(WorkOrderType::DataQuality).await;

    let created = service
        .batch_create_tasks(
            &CallContext::background(),
            vec![
                NewWorkOrderTask::running(fusion.id, "fuse", fusion_detail("orders")),
                NewWorkOrderTask::running(
                    quality.id,
                    "check",
                    TaskDetail::DataQuality(DataQualityDetail::default()),
                ),
            ],
        )
        .await
        .expect("batch create failed");

    assert_eq!(created.len(), 2);
    assert_eq!(created[0].name, "fuse");
    assert_eq!(created[1].name, "check");
    assert_eq!(
        created[1].detail.as_ref().map(|d| d.kind()),
        Some(WorkOrderType::DataQuality)
    );
}

#[tokio::test]
async fn test_cancelled_create_writes_nothing() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let work_order = fixture.create_work_order(WorkOrderType::DataFusion).await;

    let token = CancellationToken::new();
    token.cancel();
    let ctx = CallContext::background().with_cancellation(token);

    let err = service
        .create_task(
            &ctx,
            NewWorkOrderTask::running(work_order.id, "fuse", fusion_detail("orders")),
        )
        .await
        .expect_err("cancelled create must fail");
    assert!(matches!(err, WorkOrderError::Storage { .. }));

    let (_, total) = service
        .list_tasks(TaskFilter::for_work_order(work_order.id))
        .await
        .expect("list failed");
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_update_keeps_created_at_and_replaces_fields() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let ctx = CallContext::background();
    let work_order = fixture.create_work_order(WorkOrderType::DataFusion).await;

    let created = service
        .create_task(
            &ctx,
            NewWorkOrderTask::running(work_order.id, "fuse", fusion_detail("orders")),
        )
        .await
        .expect("create failed");

    let mut update = TaskUpdate::from_task(&created, fusion_detail("orders"));
    update.status = TaskStatus::Failed.as_str().to_string();
    update.reason = "source unreachable".to_string();
    update.detail = fusion_detail("customers");

    let updated = service.update_task(&ctx, update).await.expect("update failed");
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.known_status(), Some(TaskStatus::Failed));
    assert_eq!(updated.reason, "source unreachable");
    assert_eq!(
        updated
            .detail
            .as_ref()
            .and_then(|d| d.as_fusion())
            .map(|f| f.data_table.as_str()),
        Some("customers")
    );
}

#[tokio::test]
async fn test_update_replaces_audit_items_wholesale() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let ctx = CallContext::background();
    let work_order = fixture.create_work_order(WorkOrderType::DataQualityAudit).await;

    let created = service
        .create_task(
            &ctx,
            NewWorkOrderTask::running(
                work_order.id,
                "audit",
                TaskDetail::DataQualityAudit(vec![
                    audit_item("orders", TaskStatus::Running),
                    audit_item("customers", TaskStatus::Running),
                ]),
            ),
        )
        .await
        .expect("create failed");

    let mut update = TaskUpdate::from_task(&created, TaskDetail::DataQualityAudit(Vec::new()));
    update.detail = TaskDetail::DataQualityAudit(vec![audit_item("invoices", TaskStatus::Completed)]);

    let updated = service.update_task(&ctx, update).await.expect("update failed");
    let tables: BTreeSet<String> = updated
        .detail
        .as_ref()
        .and_then(|d| d.as_quality_audit())
        .expect("audit detail expected")
        .iter()
        .map(|item| item.data_table.clone())
        .collect();
    assert_eq!(tables, BTreeSet::from(["invoices".to_string()]));
}

#[tokio::test]
async fn test_update_cannot_move_task_between_work_orders() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let ctx = CallContext::background();
    let first = fixture.create_work_order(WorkOrderType::DataFusion).await;
    let second = fixture.create_work_order(WorkOrderType::DataFusion).await;

    let created = service
        .create_task(&ctx, NewWorkOrderTask::running(first.id, "fuse", fusion_detail("orders")))
        .await
        .expect("create failed");

    let mut update = TaskUpdate::from_task(&created, fusion_detail("orders"));
    update.work_order_id = second.id;

    let err = service
        .update_task(&ctx, update)
        .await
        .expect_err("moving a task must be rejected");
    assert!(matches!(
        err,
        WorkOrderError::Validation(ValidationError::WorkOrderChanged { .. })
    ));
}

#[tokio::test]
async fn test_update_unknown_task_is_not_found() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let work_order = fixture.create_work_order(WorkOrderType::DataFusion).await;

    let update = TaskUpdate {
        id: UniversalUuid::new_v7(),
        work_order_id: work_order.id,
        name: "ghost".to_string(),
        third_party_id: None,
        status: TaskStatus::Running.as_str().to_string(),
        reason: String::new(),
        link: String::new(),
        detail: fusion_detail("orders"),
    };
    let err = service
        .update_task(&CallContext::background(), update)
        .await
        .expect_err("unknown task must fail");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_filters_and_pages() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let ctx = CallContext::background();
    let work_order = fixture.create_work_order(WorkOrderType::DataFusion).await;
    let other = fixture.create_work_order(WorkOrderType::DataFusion).await;

    let mut batch = Vec::new();
    for i in 0..5 {
        let status = if i % 2 == 0 { TaskStatus::Completed } else { TaskStatus::Running };
        batch.push(
            NewWorkOrderTask::running(work_order.id, format!("nightly-{}", i), fusion_detail("orders"))
                .with_status(status),
        );
    }
    batch.push(NewWorkOrderTask::running(work_order.id, "adhoc", fusion_detail("orders")));
    batch.push(NewWorkOrderTask::running(other.id, "nightly-other", fusion_detail("orders")));
    service.batch_create_tasks(&ctx, batch).await.expect("batch create failed");

    let (all, total) = service
        .list_tasks(TaskFilter::for_work_order(work_order.id))
        .await
        .expect("list failed");
    assert_eq!(total, 6);
    assert_eq!(all.len(), 6);
    assert!(all.iter().all(|t| t.detail.is_some()));

    let mut filter = TaskFilter::for_work_order(work_order.id);
    filter.keyword = Some("nightly".to_string());
    filter.statuses = vec![TaskStatus::Completed.as_str().to_string()];
    let (completed, total) = service.list_tasks(filter).await.expect("filtered list failed");
    assert_eq!(total, 3);
    assert!(completed.iter().all(|t| t.known_status() == Some(TaskStatus::Completed)));

    let mut page = TaskFilter::for_work_order(work_order.id);
    page.limit = 4;
    page.offset = 4;
    let (rows, total) = service.list_tasks(page).await.expect("paged list failed");
    assert_eq!(total, 6);
    assert_eq!(rows.len(), 2);

    let mut offset_only = TaskFilter::for_work_order(work_order.id);
    offset_only.offset = 5;
    let (rows, _) = service.list_tasks(offset_only).await.expect("offset list failed");
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_delete_hides_task() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let ctx = CallContext::background();
    let work_order = fixture.create_work_order(WorkOrderType::DataFusion).await;

    let created = service
        .create_task(&ctx, NewWorkOrderTask::running(work_order.id, "fuse", fusion_detail("orders")))
        .await
        .expect("create failed");

    service.delete_task(&ctx, created.id).await.expect("delete failed");

    assert!(service.get_task(created.id).await.expect_err("deleted task").is_not_found());
    let (_, total) = service
        .list_tasks(TaskFilter::for_work_order(work_order.id))
        .await
        .expect("list failed");
    assert_eq!(total, 0);
    assert!(service.delete_task(&ctx, created.id).await.is_err());
}

#[tokio::test]
async fn test_failed_work_order_lookup_degrades_read() {
    let fixture = TestFixture::new().await;
    let writer = fixture.task_service();
    let work_order = fixture.create_work_order(WorkOrderType::DataFusion).await;

    let created = writer
        .create_task(
            &CallContext::background(),
            NewWorkOrderTask::running(work_order.id, "fuse", fusion_detail("orders")),
        )
        .await
        .expect("create failed");

    let reader = TaskService::new(fixture.get_dal(), Arc::new(FixedLookup(None)));
    let fetched = reader.get_task(created.id).await.expect("get must still succeed");
    assert_eq!(fetched.name, "fuse");
    assert!(fetched.detail.is_none());
}

#[tokio::test]
async fn test_failed_work_order_lookup_degrades_list() {
    let fixture = TestFixture::new().await;
    let writer = fixture.task_service();
    let work_order = fixture.create_work_order(WorkOrderType::DataFusion).await;

    writer
        .batch_create_tasks(
            &CallContext::background(),
            vec![
                NewWorkOrderTask::running(work_order.id, "fuse-orders", fusion_detail("orders")),
                NewWorkOrderTask::running(work_order.id, "fuse-invoices", fusion_detail("invoices")),
            ],
        )
        .await
        .expect("batch create failed");

    let reader = TaskService::new(fixture.get_dal(), Arc::new(FixedLookup(None)));
    let (tasks, total) = reader
        .list_tasks(TaskFilter::for_work_order(work_order.id))
        .await
        .expect("list must still succeed");
    assert_eq!(total, 2);
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|task| task.detail.is_none()));
}

#[tokio::test]
async fn test_keyword_wildcards_match_literally() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let work_order = fixture.create_work_order(WorkOrderType::DataFusion).await;

    service
        .batch_create_tasks(
            &CallContext::background(),
            vec![
                NewWorkOrderTask::running(work_order.id, "load_100%", fusion_detail("a")),
                NewWorkOrderTask::running(work_order.id, "loadX100Y", fusion_detail("b")),
                NewWorkOrderTask::running(work_order.id, "load\\100", fusion_detail("c")),
            ],
        )
        .await
        .expect("batch create failed");

    let keyword = |keyword: &str| TaskFilter {
        keyword: Some(keyword.to_string()),
        ..TaskFilter::for_work_order(work_order.id)
    };

    let (tasks, total) = service.list_tasks(keyword("_100%")).await.expect("list failed");
    assert_eq!(total, 1);
    assert_eq!(tasks[0].name, "load_100%");

    let (tasks, _) = service.list_tasks(keyword("\\1")).await.expect("list failed");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "load\\100");

    let (_, total) = service.list_tasks(keyword("100")).await.expect("list failed");
    assert_eq!(total, 3);
}

#[tokio::test]
async fn test_missing_detail_rows_degrade_to_empty_detail() {
    let fixture = TestFixture::new().await;
    let writer = fixture.task_service();
    let work_order = fixture.create_work_order(WorkOrderType::DataFusion).await;

    let created = writer
        .create_task(
            &CallContext::background(),
            NewWorkOrderTask::running(work_order.id, "fuse", fusion_detail("orders")),
        )
        .await
        .expect("create failed");

    // The lookup now reports an aggregation work order, which has no rows for this task
    let mut drifted = work_order.clone();
    drifted.work_order_type = WorkOrderType::DataAggregation;
    let reader = TaskService::new(fixture.get_dal(), Arc::new(FixedLookup(Some(drifted))));

    let fetched = reader.get_task(created.id).await.expect("get must still succeed");
    assert_eq!(fetched.detail, Some(TaskDetail::DataAggregation(Vec::new())));
}

#[tokio::test]
async fn test_refresh_work_order_status_rolls_up_tasks() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();
    let ctx = CallContext::background();
    let work_order = fixture.create_work_order(WorkOrderType::DataFusion).await;

    let empty = service
        .refresh_work_order_status(&ctx, work_order.id)
        .await
        .expect("refresh failed");
    assert_eq!(empty, ProcessingStatus::Unset);

    let created = service
        .batch_create_tasks(
            &ctx,
            vec![
                NewWorkOrderTask::running(work_order.id, "a", fusion_detail("orders")),
                NewWorkOrderTask::running(work_order.id, "b", fusion_detail("orders"))
                    .with_status(TaskStatus::Completed),
            ],
        )
        .await
        .expect("batch create failed");

    let running = service
        .refresh_work_order_status(&ctx, work_order.id)
        .await
        .expect("refresh failed");
    assert_eq!(running, ProcessingStatus::Running);
    let stored = fixture.get_dal().work_order().get(work_order.id).await.expect("get failed");
    assert_eq!(stored.process_status, ProcessingStatus::Running);

    let mut update = TaskUpdate::from_task(&created[0], fusion_detail("orders"));
    update.status = TaskStatus::Failed.as_str().to_string();
    service.update_task(&ctx, update).await.expect("update failed");

    let failed = service
        .refresh_work_order_status(&ctx, work_order.id)
        .await
        .expect("refresh failed");
    assert_eq!(failed, ProcessingStatus::Failed);
}

#[tokio::test]
async fn test_refresh_unknown_work_order_is_not_found() {
    let fixture = TestFixture::new().await;
    let service = fixture.task_service();

    let err = service
        .refresh_work_order_status(&CallContext::background(), UniversalUuid::new_v7())
        .await
        .expect_err("unknown work order must fail");
    assert!(err.is_not_found());
}
