use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::instrument;

use crate::middleware::{CallContext, RpcChain};
use crate::traits::{EventStream, PlanService};
use crate::types::{CheckRun, Plan, PlanPage};
use crate::Result;

/// Search criteria for [`PlanStore::search`]. Unset fields filter
/// nothing.
#[derive(Debug, Clone, Default)]
pub struct PlanFind {
    pub creator: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub has_issue: Option<bool>,
    pub has_pipeline: Option<bool>,
}

/// Render a find as the `&&`-joined filter expression the search API
/// accepts.
pub fn build_plan_filter(find: &PlanFind) -> String {
    let mut clauses = Vec::new();
    if let Some(creator) = &find.creator {
        clauses.push(format!("creator == \"{creator}\""));
    }
    if let Some(after) = find.created_after {
        clauses.push(format!("create_time >= \"{}\"", timestamp(after)));
    }
    if let Some(before) = find.created_before {
        clauses.push(format!("create_time <= \"{}\"", timestamp(before)));
    }
    if let Some(has_issue) = find.has_issue {
        clauses.push(format!("has_issue == {has_issue}"));
    }
    if let Some(has_pipeline) = find.has_pipeline {
        clauses.push(format!("has_pipeline == {has_pipeline}"));
    }
    clauses.join(" && ")
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Plan search and check-run watching. Uncached: plans mutate
/// server-side too often to keep.
#[derive(Clone)]
pub struct PlanStore {
    service: Arc<dyn PlanService>,
    chain: RpcChain,
}

impl PlanStore {
    pub fn new(service: Arc<dyn PlanService>, chain: RpcChain) -> Self {
        Self { service, chain }
    }

    /// Search plans under a parent, one page per call.
    #[instrument(skip(self, find), fields(operation = "search_plans"))]
    pub async fn search(
        &self,
        parent: &str,
        find: &PlanFind,
        page_size: u32,
        page_token: &str,
    ) -> Result<PlanPage> {
        let ctx = CallContext::new("PlanService/SearchPlans");
        let filter = build_plan_filter(find);
        self.chain
            .unary(
                &ctx,
                self.service.search_plans(parent, &filter, page_size, page_token),
            )
            .await
    }

    #[instrument(skip(self), fields(operation = "get_plan"))]
    pub async fn fetch_by_name(&self, name: &str) -> Result<Plan> {
        let ctx = CallContext::new("PlanService/GetPlan");
        self.chain.unary(&ctx, self.service.get_plan(name)).await
    }

    /// Follow a plan's check runs as they progress.
    ///
    /// Failures while establishing the watch and error items on the
    /// stream both pass through the middleware chain.
    #[instrument(skip(self), fields(operation = "watch_plan_checks"))]
    pub async fn watch_checks(&self, plan: &str) -> Result<EventStream<CheckRun>> {
        let ctx = CallContext::new("PlanService/WatchPlanChecks");
        let stream = self
            .chain
            .unary(&ctx, self.service.watch_plan_checks(plan))
            .await?;
        Ok(self.chain.server_streaming(&ctx, stream))
    }
}
