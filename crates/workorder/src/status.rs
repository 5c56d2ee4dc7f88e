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

//! # Status Aggregation
//!
//! Collapses many task statuses into one coarse [`ProcessingStatus`].
//!
//! Precedence is `Failed > Running > Completed > Unset`:
//!
//! - an empty input yields [`ProcessingStatus::Unset`], never `Completed`;
//! - otherwise the result starts at `Completed`;
//! - any `Failed` input returns `Failed` immediately;
//! - any `Running` input moves the result to `Running` and scanning continues;
//! - anything else (unknown strings, `Unset`) contributes nothing.
//!
//! The same reduction is applied to task statuses within a family and then to
//! the per-family results, see [`combine_family_statuses`].

use serde::{Deserialize, Serialize};

use crate::models::task::{TaskStatus, WorkOrderTask};

/// Rolled-up status of a group of tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProcessingStatus {
    /// No tasks contributed. Displayed as empty.
    #[default]
    Unset,
    Running,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// Returns the display/storage string. `Unset` is the empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Unset => "",
            ProcessingStatus::Running => TaskStatus::Running.as_str(),
            ProcessingStatus::Completed => TaskStatus::Completed.as_str(),
            ProcessingStatus::Failed => TaskStatus::Failed.as_str(),
        }
    }

    /// Parses a status string. Unknown strings map to `Unset`.
    pub fn from_str(s: &str) -> Self {
        match TaskStatus::from_str(s) {
            Some(status) => status.into(),
            None => ProcessingStatus::Unset,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, ProcessingStatus::Unset)
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<TaskStatus> for ProcessingStatus {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Running => ProcessingStatus::Running,
            TaskStatus::Completed => ProcessingStatus::Completed,
            TaskStatus::Failed => ProcessingStatus::Failed,
        }
    }
}

/// Reduces a sequence of statuses with `Failed > Running > Completed > Unset`.
pub fn aggregate_status<I>(statuses: I) -> ProcessingStatus
where
    I: IntoIterator<Item = ProcessingStatus>,
{
    let mut statuses = statuses.into_iter().peekable();
    if statuses.peek().is_none() {
        return ProcessingStatus::Unset;
    }

    let mut result = ProcessingStatus::Completed;
    for status in statuses {
        match status {
            ProcessingStatus::Failed => return ProcessingStatus::Failed,
            ProcessingStatus::Running => result = ProcessingStatus::Running,
            ProcessingStatus::Completed | ProcessingStatus::Unset => {}
        }
    }
    result
}

/// Reduces the stored status strings of a set of tasks.
///
/// Strings other than `Running`, `Completed` and `Failed` are inert.
pub fn aggregate_task_statuses(tasks: &[WorkOrderTask]) -> ProcessingStatus {
    aggregate_status(
        tasks
            .iter()
            .map(|task| ProcessingStatus::from_str(&task.status)),
    )
}

/// Combines per-family results into one processing status.
///
/// The same reduction as [`aggregate_status`]: an empty family is inert but
/// still counts as an input, so two empty families combine to `Completed`.
pub fn combine_family_statuses<I>(families: I) -> ProcessingStatus
where
    I: IntoIterator<Item = ProcessingStatus>,
{
    aggregate_status(families)
}
