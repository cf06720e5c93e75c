use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use futures_util::StreamExt;
use muninn::traits::{DocumentService, Navigator, Notifier, PlanService, ResourceGroupService};
use muninn::{
    CheckRun, CheckState, CheckSummary, Code, Document, DocumentStore, Error, EventStream,
    GetGroupOptions, MatchList, Notification, NotificationStyle, Plan, PlanFind, PlanPage,
    PlanStore, ResourceGroup, ResourceGroupStore, Result, Route, RpcChain, SessionState, View,
    document_name,
};
use parking_lot::Mutex;

/// Notifier that records every pushed notification.
#[derive(Default)]
struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn all(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn push(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

/// Navigator that records requested routes.
#[derive(Default)]
struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, route: Route) {
        self.routes.lock().push(route);
    }
}

fn chain() -> (RpcChain, Arc<RecordingNotifier>, Arc<RecordingNavigator>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let chain = RpcChain::standard(
        Arc::new(SessionState::new()),
        notifier.clone(),
        navigator.clone(),
    );
    (chain, notifier, navigator)
}

// ============================================================================
// Document store
// ============================================================================

/// Document backend that echoes requests and counts RPCs.
#[derive(Default)]
struct MockDocuments {
    calls: AtomicU32,
    views: Mutex<Vec<View>>,
}

impl MockDocuments {
    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DocumentService for MockDocuments {
    async fn create_document(&self, parent: &str, mut document: Document) -> Result<Document> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        document.name = format!("{parent}/documents/900");
        Ok(document)
    }

    async fn get_document(&self, name: &str, view: View) -> Result<Document> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.views.lock().push(view);
        let document = Document::new(name, "Q3 report");
        Ok(match view {
            View::Full => document.with_content("SELECT 1;"),
            View::Basic => document,
        })
    }

    async fn update_document(&self, document: Document, update_mask: &[&str]) -> Result<Document> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        assert_eq!(update_mask, ["content"]);
        Ok(document)
    }
}

fn document_store() -> (DocumentStore, Arc<MockDocuments>) {
    let service = Arc::new(MockDocuments::default());
    let (chain, _, _) = chain();
    (DocumentStore::new(service.clone(), chain), service)
}

#[tokio::test]
async fn viewless_document_misses_fetch_basic() {
    let (store, service) = document_store();
    let name = document_name("alpha", "102");

    let document = store.get_or_fetch_by_name(&name, None).await.unwrap();
    assert_eq!(document.title, "Q3 report");
    assert_eq!(*service.views.lock(), vec![View::Basic]);

    // The entry answers the next viewless read without a second RPC.
    store.get_or_fetch_by_name(&name, None).await.unwrap();
    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn full_entries_supersede_basic_and_answer_viewless_reads() {
    let (store, service) = document_store();
    let name = document_name("alpha", "102");

    store.get_or_fetch_by_name(&name, None).await.unwrap();
    assert!(store.get_by_uid("102", Some(View::Basic)).is_some());

    let full = store
        .get_or_fetch_by_name(&name, Some(View::Full))
        .await
        .unwrap();
    assert_eq!(full.content, "SELECT 1;");
    assert_eq!(service.call_count(), 2);

    assert!(store.get_by_uid("102", Some(View::Basic)).is_none());
    let viewless = store.get_by_uid("102", None).unwrap();
    assert_eq!(viewless.content, "SELECT 1;");
}

#[tokio::test]
async fn concurrent_document_reads_share_one_rpc() {
    let (store, service) = document_store();
    let name = document_name("alpha", "102");

    let (first, second) = tokio::join!(
        store.get_or_fetch_by_name(&name, None),
        store.get_or_fetch_by_name(&name, None),
    );

    assert_eq!(first.unwrap().title, "Q3 report");
    assert_eq!(second.unwrap().title, "Q3 report");
    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn malformed_document_names_fail_without_an_rpc() {
    let (store, service) = document_store();

    let result = store.get_or_fetch_by_name("sheets/9", None).await;

    assert!(matches!(result, Err(Error::InvalidName(_))));
    assert_eq!(service.call_count(), 0);
    assert!(store.get_by_name("sheets/9", None).is_none());
}

#[tokio::test]
async fn uid_reads_go_through_the_wildcard_project() {
    let (store, _) = document_store();

    let document = store
        .get_or_fetch_by_uid("102", Some(View::Full))
        .await
        .unwrap();

    assert_eq!(document.name, "projects/-/documents/102");
    assert!(store.get_by_uid("102", Some(View::Full)).is_some());
}

#[tokio::test]
async fn created_documents_are_cached_full() {
    let (store, _) = document_store();

    let created = store
        .create("projects/alpha", Document::new("", "fresh").with_content("SELECT 2;"))
        .await
        .unwrap();

    assert_eq!(created.name, "projects/alpha/documents/900");
    let cached = store.get_by_uid("900", Some(View::Full)).unwrap();
    assert_eq!(cached.content, "SELECT 2;");
}

#[tokio::test]
async fn update_content_overwrites_the_cached_document() {
    let (store, service) = document_store();
    let name = document_name("alpha", "102");

    store
        .get_or_fetch_by_name(&name, Some(View::Full))
        .await
        .unwrap();
    let updated = store.update_content(&name, "SELECT 2;").await.unwrap();

    assert_eq!(updated.content, "SELECT 2;");
    assert_eq!(service.call_count(), 2);
    let cached = store.get_by_uid("102", None).unwrap();
    assert_eq!(cached.content, "SELECT 2;");
}

// ============================================================================
// Resource group store
// ============================================================================

/// What a create call carried to the backend.
#[derive(Debug, Clone)]
struct CreateCall {
    parent: String,
    expression: String,
    group_id: String,
    validate_only: bool,
}

/// Group backend serving versioned titles so overwrites are visible.
#[derive(Default)]
struct MockGroups {
    calls: AtomicU32,
    created: Mutex<Vec<CreateCall>>,
}

impl MockGroups {
    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ResourceGroupService for MockGroups {
    async fn get_group(&self, name: &str, _view: View) -> Result<ResourceGroup> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(ResourceGroup::new(name, format!("v{call}"), "true"))
    }

    async fn list_groups(&self, parent: &str) -> Result<Vec<ResourceGroup>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(vec![
            ResourceGroup::new(format!("{parent}/groups/one"), "One", "true"),
            ResourceGroup::new(format!("{parent}/groups/two"), "Two", "true"),
        ])
    }

    async fn create_group(
        &self,
        parent: &str,
        mut group: ResourceGroup,
        group_id: &str,
        validate_only: bool,
    ) -> Result<ResourceGroup> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.created.lock().push(CreateCall {
            parent: parent.to_owned(),
            expression: group.expression.clone(),
            group_id: group_id.to_owned(),
            validate_only,
        });
        if validate_only {
            group.matched_members = vec!["instances/prod/databases/orders".to_owned()];
            group.unmatched_members = vec!["instances/prod/databases/archive".to_owned()];
        }
        Ok(group)
    }

    async fn update_group(
        &self,
        group: ResourceGroup,
        _update_mask: &[&str],
    ) -> Result<ResourceGroup> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(group)
    }

    async fn delete_group(&self, _name: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Group backend where every call fails with one code.
struct FailingGroups {
    code: Code,
}

#[async_trait]
impl ResourceGroupService for FailingGroups {
    async fn get_group(&self, _name: &str, _view: View) -> Result<ResourceGroup> {
        Err(Error::rpc(self.code, "denied"))
    }

    async fn list_groups(&self, _parent: &str) -> Result<Vec<ResourceGroup>> {
        Err(Error::rpc(self.code, "denied"))
    }

    async fn create_group(
        &self,
        _parent: &str,
        _group: ResourceGroup,
        _group_id: &str,
        _validate_only: bool,
    ) -> Result<ResourceGroup> {
        Err(Error::rpc(self.code, "denied"))
    }

    async fn update_group(
        &self,
        _group: ResourceGroup,
        _update_mask: &[&str],
    ) -> Result<ResourceGroup> {
        Err(Error::rpc(self.code, "denied"))
    }

    async fn delete_group(&self, _name: &str) -> Result<()> {
        Err(Error::rpc(self.code, "denied"))
    }
}

fn group_store() -> (ResourceGroupStore, Arc<MockGroups>) {
    let service = Arc::new(MockGroups::default());
    let (chain, _, _) = chain();
    (ResourceGroupStore::new(service.clone(), chain), service)
}

#[tokio::test]
async fn group_reads_are_exact_view() {
    let (store, service) = group_store();
    let name = "projects/alpha/groups/ops";

    store
        .get_or_fetch_by_name(name, GetGroupOptions::new())
        .await
        .unwrap();
    assert!(store.get_by_name(name, Some(View::Basic)).is_some());
    // A BASIC entry does not answer a FULL read.
    assert!(store.get_by_name(name, Some(View::Full)).is_none());

    store
        .get_or_fetch_by_name(name, GetGroupOptions::new().view(View::Full))
        .await
        .unwrap();
    assert_eq!(service.call_count(), 2);

    // The FULL write superseded the BASIC entry.
    assert!(store.get_by_name(name, Some(View::Basic)).is_none());
    assert_eq!(store.get_by_name(name, None).unwrap().title, "v2");
}

#[tokio::test]
async fn skip_cache_forces_a_remote_call_and_overwrites() {
    let (store, service) = group_store();
    let name = "projects/alpha/groups/ops";

    store
        .get_or_fetch_by_name(name, GetGroupOptions::new())
        .await
        .unwrap();
    let refreshed = store
        .get_or_fetch_by_name(name, GetGroupOptions::new().skip_cache(true))
        .await
        .unwrap();

    assert_eq!(refreshed.title, "v2");
    assert_eq!(service.call_count(), 2);
    assert_eq!(store.get_by_name(name, Some(View::Basic)).unwrap().title, "v2");

    // Back to normal reads, the overwritten entry answers.
    store
        .get_or_fetch_by_name(name, GetGroupOptions::new())
        .await
        .unwrap();
    assert_eq!(service.call_count(), 2);
}

#[tokio::test]
async fn list_caches_each_group_at_basic() {
    let (store, _) = group_store();

    let groups = store.list_by_parent("projects/alpha").await.unwrap();

    assert_eq!(groups.len(), 2);
    let cached = store
        .get_by_name("projects/alpha/groups/one", Some(View::Basic))
        .unwrap();
    assert_eq!(cached.title, "One");
}

#[tokio::test]
async fn validate_only_creates_are_silent_and_uncached() {
    let service = Arc::new(FailingGroups {
        code: Code::PermissionDenied,
    });
    let (chain, notifier, navigator) = chain();
    let store = ResourceGroupStore::new(service, chain);
    let group = ResourceGroup::new("projects/alpha/groups/ops", "Ops", "true");

    let result = store
        .create("projects/alpha", group.clone(), "ops", true)
        .await;
    assert!(result.is_err());
    assert!(notifier.all().is_empty());
    assert!(navigator.routes.lock().is_empty());

    // A real create surfaces the same failure loudly.
    let result = store.create("projects/alpha", group, "ops", false).await;
    assert!(result.is_err());
    assert_eq!(notifier.all().len(), 1);
    assert_eq!(notifier.all()[0].style, NotificationStyle::Critical);
    assert_eq!(*navigator.routes.lock(), vec![Route::Forbidden]);
}

#[tokio::test]
async fn match_lists_come_from_validate_only_creates() {
    let (store, service) = group_store();

    let matches = store
        .fetch_match_list("projects/alpha", "")
        .await
        .unwrap();

    assert_eq!(
        matches,
        MatchList {
            matched: vec!["instances/prod/databases/orders".to_owned()],
            unmatched: vec!["instances/prod/databases/archive".to_owned()],
        }
    );

    let calls = service.created.lock().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].parent, "projects/alpha");
    // An empty expression validates against everything.
    assert_eq!(calls[0].expression, "true");
    assert!(calls[0].group_id.starts_with("validating-group-"));
    assert!(calls[0].validate_only);

    // The throwaway group never lands in the cache.
    let name = format!("projects/alpha/groups/{}", calls[0].group_id);
    assert!(store.get_by_name(&name, None).is_none());
}

#[tokio::test]
async fn delete_drops_both_cached_views() {
    let (store, service) = group_store();
    let name = "projects/alpha/groups/ops";

    store
        .get_or_fetch_by_name(name, GetGroupOptions::new().view(View::Full))
        .await
        .unwrap();
    store
        .get_or_fetch_by_name(name, GetGroupOptions::new())
        .await
        .unwrap();
    assert!(store.get_by_name(name, Some(View::Full)).is_some());
    assert!(store.get_by_name(name, Some(View::Basic)).is_some());

    store.delete(name).await.unwrap();

    assert_eq!(service.call_count(), 3);
    assert!(store.get_by_name(name, None).is_none());
}

#[tokio::test]
async fn updated_groups_are_cached_full() {
    let (store, _) = group_store();
    let group = ResourceGroup::new("projects/alpha/groups/ops", "Renamed", "true");

    store.update(group, &["title"]).await.unwrap();

    let cached = store
        .get_by_name("projects/alpha/groups/ops", Some(View::Full))
        .unwrap();
    assert_eq!(cached.title, "Renamed");
}

// ============================================================================
// Plan store
// ============================================================================

fn check(status: CheckState, errors: u32, warnings: u32) -> CheckRun {
    CheckRun {
        name: "projects/alpha/plans/1/planCheckRuns/1".to_owned(),
        target: "instances/prod/databases/orders".to_owned(),
        status,
        error_count: errors,
        warning_count: warnings,
    }
}

/// Plan backend that records search filters and scripts one watch.
#[derive(Default)]
struct MockPlans {
    filters: Mutex<Vec<String>>,
}

#[async_trait]
impl PlanService for MockPlans {
    async fn search_plans(
        &self,
        parent: &str,
        filter: &str,
        _page_size: u32,
        _page_token: &str,
    ) -> Result<PlanPage> {
        self.filters.lock().push(filter.to_owned());
        Ok(PlanPage {
            plans: vec![Plan {
                name: format!("{parent}/plans/1"),
                ..Plan::default()
            }],
            next_page_token: "next-1".to_owned(),
        })
    }

    async fn get_plan(&self, name: &str) -> Result<Plan> {
        Ok(Plan {
            name: name.to_owned(),
            ..Plan::default()
        })
    }

    async fn watch_plan_checks(&self, _plan: &str) -> Result<EventStream<CheckRun>> {
        Ok(Box::pin(futures_util::stream::iter(vec![
            Ok(check(CheckState::Running, 0, 0)),
            Ok(check(CheckState::Done, 1, 2)),
            Err(Error::rpc(Code::Internal, "watch broke")),
        ])))
    }
}

fn plan_store() -> (PlanStore, Arc<MockPlans>, Arc<RecordingNotifier>) {
    let service = Arc::new(MockPlans::default());
    let (chain, notifier, _) = chain();
    (PlanStore::new(service.clone(), chain), service, notifier)
}

#[tokio::test]
async fn search_passes_the_rendered_filter() {
    let (store, service, _) = plan_store();
    let find = PlanFind {
        creator: Some("users/alice".to_owned()),
        has_issue: Some(false),
        ..PlanFind::default()
    };

    let page = store.search("projects/alpha", &find, 50, "").await.unwrap();

    assert_eq!(page.plans.len(), 1);
    assert_eq!(page.next_page_token, "next-1");
    assert_eq!(
        *service.filters.lock(),
        vec![r#"creator == "users/alice" && has_issue == false"#.to_owned()]
    );
}

#[tokio::test]
async fn fetch_by_name_returns_the_plan() {
    let (store, _, _) = plan_store();

    let plan = store.fetch_by_name("projects/alpha/plans/1").await.unwrap();

    assert_eq!(plan.name, "projects/alpha/plans/1");
}

#[tokio::test]
async fn watch_streams_checks_until_the_first_error() {
    let (store, _, notifier) = plan_store();

    let mut stream = store.watch_checks("projects/alpha/plans/1").await.unwrap();
    let mut runs = Vec::new();
    let mut failure = None;
    while let Some(item) = stream.next().await {
        match item {
            Ok(run) => runs.push(run),
            Err(error) => failure = Some(error),
        }
    }

    assert_eq!(runs.len(), 2);
    assert!(matches!(
        failure,
        Some(Error::Rpc { code: Code::Internal, .. })
    ));

    let summary = CheckSummary::of(&runs);
    assert_eq!(summary.error_count, 1);
    assert_eq!(summary.warning_count, 2);
    assert_eq!(summary.running_count, 1);

    // The broken watch surfaced exactly one notification.
    assert_eq!(notifier.all().len(), 1);
    assert_eq!(notifier.all()[0].title, "Code 13: INTERNAL");
}
