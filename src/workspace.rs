//! Builder for wiring workspace instances

use std::sync::Arc;

use crate::middleware::RpcChain;
use crate::session::SessionState;
use crate::storage::{KeyValueStorage, MemoryStorage};
use crate::store::{DocumentStore, PlanStore, ResourceGroupStore};
use crate::suggest::{DynamicSuggestions, SuggestionConfig};
use crate::traits::{
    CompletionService, DocumentService, Navigator, Notifier, PlanService, ResourceGroupService,
};
use crate::{Error, Result};

/// Main entry point for creating workspaces.
pub struct Muninn;

impl Muninn {
    /// Create a new builder for configuring the workspace.
    pub fn builder() -> WorkspaceBuilder {
        WorkspaceBuilder::new()
    }
}

/// The wired data layer.
///
/// All stores share one middleware chain and one [`SessionState`];
/// suggestion contexts share the persistence backend. The owning shell
/// reads the session to drive its login flow.
pub struct Workspace {
    session: Arc<SessionState>,
    documents: DocumentStore,
    groups: ResourceGroupStore,
    plans: PlanStore,
    suggestions: DynamicSuggestions,
}

impl Workspace {
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn groups(&self) -> &ResourceGroupStore {
        &self.groups
    }

    pub fn plans(&self) -> &PlanStore {
        &self.plans
    }

    pub fn suggestions(&self) -> &DynamicSuggestions {
        &self.suggestions
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring workspace instances.
pub struct WorkspaceBuilder {
    documents: Option<Arc<dyn DocumentService>>,
    groups: Option<Arc<dyn ResourceGroupService>>,
    plans: Option<Arc<dyn PlanService>>,
    completion: Option<Arc<dyn CompletionService>>,
    notifier: Option<Arc<dyn Notifier>>,
    navigator: Option<Arc<dyn Navigator>>,
    storage: Option<Arc<dyn KeyValueStorage>>,
    suggestions: SuggestionConfig,
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self {
            documents: None,
            groups: None,
            plans: None,
            completion: None,
            notifier: None,
            navigator: None,
            storage: None,
            suggestions: SuggestionConfig::default(),
        }
    }

    /// Set the remote document API.
    pub fn document_service(mut self, service: Arc<dyn DocumentService>) -> Self {
        self.documents = Some(service);
        self
    }

    /// Set the remote resource-group API.
    pub fn group_service(mut self, service: Arc<dyn ResourceGroupService>) -> Self {
        self.groups = Some(service);
        self
    }

    /// Set the remote plan API.
    pub fn plan_service(mut self, service: Arc<dyn PlanService>) -> Self {
        self.plans = Some(service);
        self
    }

    /// Set the completion backend for dynamic suggestions.
    pub fn completion_service(mut self, service: Arc<dyn CompletionService>) -> Self {
        self.completion = Some(service);
        self
    }

    /// Set the notification sink the middleware chain pushes to.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Set the navigation hook for permission-denied redirects.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Set the persistence backend (default: in-memory).
    pub fn storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Tune suggestion fetching.
    pub fn suggestion_config(mut self, config: SuggestionConfig) -> Self {
        self.suggestions = config;
        self
    }

    /// Build the workspace.
    ///
    /// Every remote service, the notifier and the navigator must be
    /// set; storage falls back to [`MemoryStorage`].
    pub fn build(self) -> Result<Workspace> {
        let documents = require(self.documents, "document service")?;
        let groups = require(self.groups, "group service")?;
        let plans = require(self.plans, "plan service")?;
        let completion = require(self.completion, "completion service")?;
        let notifier = require(self.notifier, "notifier")?;
        let navigator = require(self.navigator, "navigator")?;
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));

        let session = Arc::new(SessionState::new());
        let chain = RpcChain::standard(Arc::clone(&session), notifier, navigator);

        Ok(Workspace {
            documents: DocumentStore::new(documents, chain.clone()),
            groups: ResourceGroupStore::new(groups, chain.clone()),
            plans: PlanStore::new(plans, chain),
            suggestions: DynamicSuggestions::new(completion, storage, self.suggestions),
            session,
        })
    }
}

impl Default for WorkspaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn require<T>(value: Option<T>, what: &str) -> Result<T> {
    value.ok_or_else(|| Error::Configuration(format!("{what} is required")))
}
