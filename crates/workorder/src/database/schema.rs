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

//! Diesel table definitions for the SQLite schema.
//!
//! UUIDs are BLOB columns, timestamps are RFC3339 TEXT columns. Every child
//! table carries a nullable `deleted_at` tombstone.

diesel::table! {
    work_orders (id) {
        id -> Binary,
        work_order_type -> Text,
        name -> Text,
        responsible_uid -> Text,
        deadline -> Nullable<Text>,
        process_status -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    work_order_tasks (id) {
        id -> Binary,
        work_order_id -> Binary,
        task_type -> Text,
        name -> Text,
        third_party_id -> Nullable<Text>,
        status -> Text,
        reason -> Text,
        link -> Text,
        created_at -> Text,
        updated_at -> Text,
        deleted_at -> Nullable<Text>,
    }
}

diesel::table! {
    data_aggregation_details (id) {
        id -> Binary,
        task_id -> Binary,
        department_id -> Text,
        source_datasource_id -> Text,
        source_table_name -> Text,
        target_datasource_id -> Text,
        target_table_name -> Text,
        item_count -> BigInt,
        created_at -> Text,
        deleted_at -> Nullable<Text>,
    }
}

diesel::table! {
    data_comprehension_details (task_id) {
        task_id -> Binary,
        created_at -> Text,
        deleted_at -> Nullable<Text>,
    }
}

diesel::table! {
    data_fusion_details (task_id) {
        task_id -> Binary,
        datasource_id -> Text,
        datasource_name -> Text,
        data_table -> Text,
        created_at -> Text,
        deleted_at -> Nullable<Text>,
    }
}

diesel::table! {
    data_quality_details (task_id) {
        task_id -> Binary,
        created_at -> Text,
        deleted_at -> Nullable<Text>,
    }
}

diesel::table! {
    data_quality_audit_details (id) {
        id -> Binary,
        task_id -> Binary,
        work_order_id -> Binary,
        datasource_id -> Text,
        datasource_name -> Text,
        data_table -> Text,
        detection_scheme -> Text,
        status -> Text,
        reason -> Text,
        link -> Text,
        created_at -> Text,
        deleted_at -> Nullable<Text>,
    }
}

diesel::table! {
    data_aggregation_inventories (id) {
        id -> Binary,
        name -> Text,
        department_id -> Text,
        created_at -> Text,
        updated_at -> Text,
        deleted_at -> Nullable<Text>,
    }
}

diesel::table! {
    data_aggregation_resources (id) {
        id -> Binary,
        view_id -> Text,
        inventory_id -> Nullable<Binary>,
        work_order_id -> Nullable<Binary>,
        collection_method -> Text,
        sync_frequency -> Text,
        business_form_id -> Text,
        target_datasource_id -> Text,
        target_table_name -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
        deleted_at -> Nullable<Text>,
    }
}

diesel::joinable!(work_order_tasks -> work_orders (work_order_id));
diesel::joinable!(data_aggregation_details -> work_order_tasks (task_id));
diesel::joinable!(data_comprehension_details -> work_order_tasks (task_id));
diesel::joinable!(data_fusion_details -> work_order_tasks (task_id));
diesel::joinable!(data_quality_details -> work_order_tasks (task_id));
diesel::joinable!(data_quality_audit_details -> work_order_tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(
    work_orders,
    work_order_tasks,
    data_aggregation_details,
    data_comprehension_details,
    data_fusion_details,
    data_quality_details,
    data_quality_audit_details,
    data_aggregation_inventories,
    data_aggregation_resources,
);
