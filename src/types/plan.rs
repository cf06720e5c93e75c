//! Plan and plan-check types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A change plan, named `projects/{project}/plans/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub title: String,
    pub creator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub specs: Vec<PlanSpec>,
}

/// One step of a plan, referencing the document it applies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanSpec {
    pub id: String,
    pub document: String,
}

/// One page of a plan search.
#[derive(Debug, Clone, Default)]
pub struct PlanPage {
    pub plans: Vec<Plan>,
    /// Empty when this is the last page.
    pub next_page_token: String,
}

/// Lifecycle of a single plan check execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckState {
    Running,
    Done,
    Failed,
    Canceled,
}

/// A check run executed against one target of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRun {
    pub name: String,
    pub target: String,
    pub status: CheckState,
    /// Advisory findings; `Done` runs can still carry warnings or errors.
    #[serde(default)]
    pub error_count: u32,
    #[serde(default)]
    pub warning_count: u32,
}

/// Aggregated findings over a set of check runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub error_count: u32,
    pub warning_count: u32,
    pub running_count: u32,
}

impl CheckSummary {
    /// Tally findings across `runs`.
    pub fn of(runs: &[CheckRun]) -> Self {
        let mut summary = Self::default();
        for run in runs {
            summary.error_count += run.error_count;
            summary.warning_count += run.warning_count;
            if run.status == CheckState::Running {
                summary.running_count += 1;
            }
        }
        summary
    }
}
