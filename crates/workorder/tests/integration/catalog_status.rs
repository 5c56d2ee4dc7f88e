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

use async_trait::async_trait;
use workorder::external::{ComprehensionPlan, DatasourceInfo, DepartmentInfo};
use workorder::models::task::{NewWorkOrderTask, TaskStatus};
use workorder::models::task_detail::{
    DataAggregationDetail, DataFusionDetail, DataQualityAuditDetail, TableRef, TaskDetail,
};
use workorder::models::work_order::WorkOrderType;
use workorder::{
    CallContext, CatalogStatusService, CollaboratorError, ComprehensionPlanLookup,
    DatasourceLookup, DepartmentLookup, NoComprehensionPlans, ProcessingStatus,
    StaticDirectory, TaskService, WorkOrderError,
};

use crate::fixtures::TestFixture;

struct Unavailable;

#[async_trait]
impl DatasourceLookup for Unavailable {
    async fn get_datasource(&self, _id: &str) -> Result<Option<DatasourceInfo>, CollaboratorError> {
        Err(CollaboratorError::new("datasource_lookup", "timed out"))
    }
}

#[async_trait]
impl DepartmentLookup for Unavailable {
    async fn get_department(&self, _id: &str) -> Result<Option<DepartmentInfo>, CollaboratorError> {
        Err(CollaboratorError::new("department_lookup", "timed out"))
    }
}

#[async_trait]
impl ComprehensionPlanLookup for Unavailable {
    async fn get_plan_for_table(
        &self,
        _table_name: &str,
    ) -> Result<Option<ComprehensionPlan>, CollaboratorError> {
        Err(CollaboratorError::new("comprehension_lookup", "timed out"))
    }
}

struct OnePlan;

#[async_trait]
impl ComprehensionPlanLookup for OnePlan {
    async fn get_plan_for_table(
        &self,
        table_name: &str,
    ) -> Result<Option<ComprehensionPlan>, CollaboratorError> {
        Ok(Some(ComprehensionPlan {
            id: "plan-1".to_string(),
            name: format!("understand {}", table_name),
            status: "Running".to_string(),
        }))
    }
}

fn directory() -> StaticDirectory {
    StaticDirectory::new()
        .with_datasource(DatasourceInfo {
            id: "ds-src".to_string(),
            name: "crm".to_string(),
            kind: "mysql".to_string(),
        })
        .with_datasource(DatasourceInfo {
            id: "ds-dst".to_string(),
            name: "warehouse".to_string(),
            kind: "hive".to_string(),
        })
        .with_department(DepartmentInfo {
            id: "dept-1".to_string(),
            name: "Finance".to_string(),
        })
}

fn catalog_service(fixture: &TestFixture) -> (Arc<TaskService>, CatalogStatusService) {
    let tasks = Arc::new(fixture.task_service());
    let directory = Arc::new(directory());
    let catalog = CatalogStatusService::new(
        tasks.clone(),
        directory.clone(),
        directory,
        Arc::new(NoComprehensionPlans),
    );
    (tasks, catalog)
}

fn aggregation_item(source_table: &str, target_table: &str, count: i64) -> DataAggregationDetail {
    DataAggregationDetail {
        id: None,
        department_id: "dept-1".to_string(),
        source: TableRef {
            datasource_id: "ds-src".to_string(),
            table_name: source_table.to_string(),
        },
        target: TableRef {
            datasource_id: "ds-dst".to_string(),
            table_name: target_table.to_string(),
        },
        count,
    }
}

fn audit_item(table: &str, status: TaskStatus) -> DataQualityAuditDetail {
    DataQualityAuditDetail {
        datasource_id: "ds-dst".to_string(),
        datasource_name: "warehouse".to_string(),
        data_table: table.to_string(),
        detection_scheme: "row-count".to_string(),
        status: status.as_str().to_string(),
        ..Default::default()
    }
}

fn fusion(table: &str) -> TaskDetail {
    TaskDetail::DataFusion(DataFusionDetail {
        datasource_id: "ds-dst".to_string(),
        datasource_name: "warehouse".to_string(),
        data_table: table.to_string(),
    })
}

#[tokio::test]
async fn test_unknown_table_has_unset_families() {
    let fixture = TestFixture::new().await;
    let (_, catalog) = catalog_service(&fixture);

    let status = catalog
        .get_catalog_processing_status("nothing_here")
        .await
        .expect("status failed");
    assert_eq!(status.quality_audit, ProcessingStatus::Unset);
    assert_eq!(status.fusion, ProcessingStatus::Unset);
    // Empty families are inert inputs to the combined rule, not missing ones
    assert_eq!(status.combined, ProcessingStatus::Completed);
}

#[tokio::test]
async fn test_families_roll_up_per_table() {
    let fixture = TestFixture::new().await;
    let (tasks, catalog) = catalog_service(&fixture);
    let ctx = CallContext::background();

    let audit = fixture.create_work_order(WorkOrderType::DataQualityAudit).await;
    let fuse = fixture.create_work_order(WorkOrderType::DataFusion).await;

    tasks
        .batch_create_tasks(
            &ctx,
            vec![
                NewWorkOrderTask::running(
                    audit.id,
                    "audit-1",
                    TaskDetail::DataQualityAudit(vec![
                        audit_item("orders", TaskStatus::Completed),
                        audit_item("customers", TaskStatus::Failed),
                    ]),
                ),
                NewWorkOrderTask::running(
                    audit.id,
                    "audit-2",
                    TaskDetail::DataQualityAudit(vec![audit_item("orders", TaskStatus::Completed)]),
                ),
                NewWorkOrderTask::running(fuse.id, "fuse-orders", fusion("orders")),
                NewWorkOrderTask::running(fuse.id, "fuse-invoices", fusion("invoices"))
                    .with_status(TaskStatus::Completed),
            ],
        )
        .await
        .expect("batch create failed");

    // The customers item failed, but only orders items count for orders
    let orders = catalog
        .get_catalog_processing_status("orders")
        .await
        .expect("status failed");
    assert_eq!(orders.quality_audit, ProcessingStatus::Completed);
    assert_eq!(orders.fusion, ProcessingStatus::Running);
    assert_eq!(orders.combined, ProcessingStatus::Running);

    let customers = catalog
        .get_catalog_processing_status("customers")
        .await
        .expect("status failed");
    assert_eq!(customers.quality_audit, ProcessingStatus::Failed);
    assert_eq!(customers.fusion, ProcessingStatus::Unset);
    assert_eq!(customers.combined, ProcessingStatus::Failed);

    let invoices = catalog
        .get_catalog_processing_status("invoices")
        .await
        .expect("status failed");
    assert_eq!(invoices.quality_audit, ProcessingStatus::Unset);
    assert_eq!(invoices.combined, ProcessingStatus::Completed);
}

#[tokio::test]
async fn test_deleted_tasks_drop_out_of_status() {
    let fixture = TestFixture::new().await;
    let (tasks, catalog) = catalog_service(&fixture);
    let ctx = CallContext::background();
    let fuse = fixture.create_work_order(WorkOrderType::DataFusion).await;

    let created = tasks
        .create_task(
            &ctx,
            NewWorkOrderTask::running(fuse.id, "fuse", fusion("orders")).with_status(TaskStatus::Failed),
        )
        .await
        .expect("create failed");
    assert_eq!(
        catalog.get_catalog_processing_status("orders").await.expect("status failed").combined,
        ProcessingStatus::Failed
    );

    tasks.delete_task(&ctx, created.id).await.expect("delete failed");
    let after = catalog
        .get_catalog_processing_status("orders")
        .await
        .expect("status failed");
    assert_eq!(after.fusion, ProcessingStatus::Unset);
    assert_eq!(after.combined, ProcessingStatus::Completed);
}

#[tokio::test]
async fn test_aggregation_info_counts_and_enriches() {
    let fixture = TestFixture::new().await;
    let tasks = Arc::new(fixture.task_service());
    let directory = Arc::new(directory());
    let catalog =
        CatalogStatusService::new(tasks.clone(), directory.clone(), directory, Arc::new(OnePlan));
    let ctx = CallContext::background();

    let aggregate = fixture.create_work_order(WorkOrderType::DataAggregation).await;
    let audit = fixture.create_work_order(WorkOrderType::DataQualityAudit).await;

    tasks
        .batch_create_tasks(
            &ctx,
            vec![
                NewWorkOrderTask::running(
                    aggregate.id,
                    "collect-crm",
                    TaskDetail::DataAggregation(vec![
                        aggregation_item("crm_orders", "dw_orders", 120),
                        aggregation_item("crm_refunds", "dw_orders", 8),
                        aggregation_item("crm_users", "dw_users", 40),
                    ]),
                ),
                NewWorkOrderTask::running(
                    aggregate.id,
                    "collect-erp",
                    TaskDetail::DataAggregation(vec![aggregation_item("erp_orders", "dw_orders", 75)]),
                )
                .with_status(TaskStatus::Completed),
                NewWorkOrderTask::running(
                    audit.id,
                    "audit",
                    TaskDetail::DataQualityAudit(vec![audit_item("dw_orders", TaskStatus::Completed)]),
                ),
            ],
        )
        .await
        .expect("batch create failed");

    let info = catalog.get_aggregation_info("dw_orders").await.expect("info failed");

    assert_eq!(info.table_name, "dw_orders");
    assert_eq!(info.aggregation.total_count, 2);
    assert_eq!(info.aggregation.running_count, 1);
    assert_eq!(info.aggregation.completed_count, 1);
    assert_eq!(info.aggregation.status, ProcessingStatus::Running);

    assert_eq!(info.quality_audit.total_count, 1);
    assert_eq!(info.quality_audit.completed_count, 1);
    assert_eq!(info.fusion.total_count, 0);
    assert_eq!(info.processing_status, ProcessingStatus::Completed);

    assert_eq!(info.sources.len(), 3);
    assert!(info.sources.iter().all(|s| s.source_table_name != "crm_users"));
    assert_eq!(info.sources.iter().map(|s| s.count).sum::<i64>(), 203);
    for source in &info.sources {
        assert_eq!(source.department_name, "Finance");
        assert_eq!(source.source_datasource_name, "crm");
        assert_eq!(source.source_datasource_kind, "mysql");
        assert_eq!(source.target_datasource_name, "warehouse");
        assert_eq!(source.target_datasource_kind, "hive");
        assert!(source.task_id.is_some());
    }

    let plan = info.comprehension_plan.expect("plan expected");
    assert_eq!(plan.name, "understand dw_orders");
}

#[tokio::test]
async fn test_aggregation_info_survives_failing_lookups() {
    let fixture = TestFixture::new().await;
    let tasks = Arc::new(fixture.task_service());
    let unavailable = Arc::new(Unavailable);
    let catalog = CatalogStatusService::new(
        tasks.clone(),
        unavailable.clone(),
        unavailable.clone(),
        unavailable,
    );
    let aggregate = fixture.create_work_order(WorkOrderType::DataAggregation).await;

    tasks
        .create_task(
            &CallContext::background(),
            NewWorkOrderTask::running(
                aggregate.id,
                "collect",
                TaskDetail::DataAggregation(vec![aggregation_item("crm_orders", "dw_orders", 5)]),
            ),
        )
        .await
        .expect("create failed");

    let info = catalog.get_aggregation_info("dw_orders").await.expect("info must degrade");
    assert_eq!(info.sources.len(), 1);
    let source = &info.sources[0];
    assert_eq!(source.source_datasource_id, "ds-src");
    assert!(source.source_datasource_name.is_empty());
    assert!(source.department_name.is_empty());
    assert_eq!(source.department_id, "dept-1");
    assert!(info.comprehension_plan.is_none());
    assert_eq!(info.quality_audit.status, ProcessingStatus::Unset);
    assert_eq!(info.fusion.status, ProcessingStatus::Unset);
    assert_eq!(info.processing_status, ProcessingStatus::Completed);
}

#[tokio::test]
async fn test_family_fetch_failure_aborts_status_and_info() {
    let fixture = TestFixture::new().await;
    let (tasks, catalog) = catalog_service(&fixture);
    let aggregate = fixture.create_work_order(WorkOrderType::DataAggregation).await;

    tasks
        .create_task(
            &CallContext::background(),
            NewWorkOrderTask::running(
                aggregate.id,
                "collect",
                TaskDetail::DataAggregation(vec![aggregation_item("crm_orders", "dw_orders", 5)]),
            ),
        )
        .await
        .expect("create failed");

    // Aggregation and audit fetches still work; only the fusion family breaks
    fixture.execute_sql("DROP TABLE data_fusion_details").await;

    let status = catalog.get_catalog_processing_status("dw_orders").await;
    assert!(
        matches!(status, Err(WorkOrderError::Storage { .. })),
        "expected storage error, got {:?}",
        status
    );

    let info = catalog.get_aggregation_info("dw_orders").await;
    assert!(
        matches!(info, Err(WorkOrderError::Storage { .. })),
        "expected storage error, got {:?}",
        info
    );
}
