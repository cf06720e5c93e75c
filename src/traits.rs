//! Consumed capability traits
//!
//! Muninn owns caching, error classification and suggestion flow; the
//! transport, UI and persistence sit behind these seams. Consumers
//! implement them and hand `Arc`s to the
//! [`WorkspaceBuilder`](crate::workspace::WorkspaceBuilder).

use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

use crate::Result;
use crate::types::{
    CheckRun, CompletionResponse, Document, Message, Notification, Plan, PlanPage, ResourceGroup,
    Route, View,
};

/// A boxed server-streaming response.
pub type EventStream<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send>>;

/// Remote document API.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Create a document under a project.
    async fn create_document(&self, parent: &str, document: Document) -> Result<Document>;

    /// Fetch a document by resource name at the given view.
    async fn get_document(&self, name: &str, view: View) -> Result<Document>;

    /// Update a document; `update_mask` lists the fields to replace.
    async fn update_document(&self, document: Document, update_mask: &[&str]) -> Result<Document>;
}

/// Remote resource-group API.
#[async_trait]
pub trait ResourceGroupService: Send + Sync {
    async fn get_group(&self, name: &str, view: View) -> Result<ResourceGroup>;

    async fn list_groups(&self, parent: &str) -> Result<Vec<ResourceGroup>>;

    /// Create a group. With `validate_only` the server evaluates the
    /// expression and returns match results without persisting anything.
    async fn create_group(
        &self,
        parent: &str,
        group: ResourceGroup,
        group_id: &str,
        validate_only: bool,
    ) -> Result<ResourceGroup>;

    async fn update_group(&self, group: ResourceGroup, update_mask: &[&str])
    -> Result<ResourceGroup>;

    async fn delete_group(&self, name: &str) -> Result<()>;
}

/// Remote plan API.
#[async_trait]
pub trait PlanService: Send + Sync {
    /// Search plans under a parent; `page_size` 0 lets the server pick.
    async fn search_plans(
        &self,
        parent: &str,
        filter: &str,
        page_size: u32,
        page_token: &str,
    ) -> Result<PlanPage>;

    async fn get_plan(&self, name: &str) -> Result<Plan>;

    /// Stream check-run updates for a plan until the watch ends.
    async fn watch_plan_checks(&self, plan: &str) -> Result<EventStream<CheckRun>>;
}

/// Completion backend for dynamic suggestions.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse>;
}

/// Sink for user-facing notifications. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn push(&self, notification: Notification);
}

/// Navigation hook for error-driven redirects.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, route: Route);
}
