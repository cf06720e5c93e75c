use std::sync::Arc;

use futures_util::FutureExt;
use tracing::instrument;

use crate::cache::{KeyedCache, SharedRequest};
use crate::middleware::{CallContext, RpcChain};
use crate::traits::DocumentService;
use crate::types::{Document, View, document_name, document_uid};
use crate::Result;

type DocumentKey = (String, View);

/// Documents, cached by `(uid, view)`.
///
/// Writes always land as FULL and supersede any BASIC entry for the
/// same uid. Reads given no explicit view prefer FULL and fall back to
/// BASIC.
#[derive(Clone)]
pub struct DocumentStore {
    service: Arc<dyn DocumentService>,
    chain: RpcChain,
    cache: KeyedCache<DocumentKey, Document>,
}

impl DocumentStore {
    pub fn new(service: Arc<dyn DocumentService>, chain: RpcChain) -> Self {
        Self {
            service,
            chain,
            cache: KeyedCache::new("document"),
        }
    }

    fn cache_document(&self, document: &Document, view: View) {
        let Ok(uid) = document_uid(&document.name) else {
            return;
        };
        if view == View::Full {
            self.cache.invalidate_entity(&(uid.clone(), View::Basic));
        }
        self.cache.set_entity((uid, view), document.clone());
    }

    /// Create a document under a project and cache the response.
    #[instrument(skip(self, document), fields(operation = "create_document"))]
    pub async fn create(&self, parent: &str, document: Document) -> Result<Document> {
        let ctx = CallContext::new("DocumentService/CreateDocument");
        let created = self
            .chain
            .unary(&ctx, self.service.create_document(parent, document))
            .await?;
        self.cache_document(&created, View::Full);
        Ok(created)
    }

    /// Cached read by uid. No explicit view reads FULL, then BASIC.
    pub fn get_by_uid(&self, uid: &str, view: Option<View>) -> Option<Document> {
        match view {
            Some(view) => self.cache.get_entity(&(uid.to_owned(), view)),
            None => self
                .cache
                .get_entity(&(uid.to_owned(), View::Full))
                .or_else(|| self.cache.get_entity(&(uid.to_owned(), View::Basic))),
        }
    }

    /// Cached read by resource name. Malformed names read as `None`.
    pub fn get_by_name(&self, name: &str, view: Option<View>) -> Option<Document> {
        let uid = document_uid(name).ok()?;
        self.get_by_uid(&uid, view)
    }

    fn request_by_uid(&self, uid: &str, view: Option<View>) -> Option<SharedRequest<Document>> {
        match view {
            Some(view) => self.cache.get_request(&(uid.to_owned(), view)),
            None => self
                .cache
                .get_request(&(uid.to_owned(), View::Full))
                .or_else(|| self.cache.get_request(&(uid.to_owned(), View::Basic))),
        }
    }

    /// Resolve a document by name, deduplicating concurrent fetches.
    ///
    /// With no explicit view, both probes prefer FULL before BASIC and a
    /// miss fetches BASIC.
    #[instrument(skip(self), fields(operation = "get_document"))]
    pub async fn get_or_fetch_by_name(&self, name: &str, view: Option<View>) -> Result<Document> {
        let uid = document_uid(name)?;
        if let Some(document) = self.get_by_uid(&uid, view) {
            return Ok(document);
        }
        if let Some(request) = self.request_by_uid(&uid, view) {
            return request.await;
        }

        let effective = view.unwrap_or_default();
        let fetch = {
            let service = Arc::clone(&self.service);
            let chain = self.chain.clone();
            let name = name.to_owned();
            move || {
                async move {
                    let ctx = CallContext::new("DocumentService/GetDocument");
                    chain.unary(&ctx, service.get_document(&name, effective)).await
                }
                .boxed()
            }
        };
        let store = self.clone();
        let superseded = (uid.clone(), View::Basic);
        self.cache
            .get_or_fetch((uid, effective), fetch, move |_| {
                if effective == View::Full {
                    store.cache.invalidate_entity(&superseded);
                }
            })
            .await
    }

    /// [`get_or_fetch_by_name`](Self::get_or_fetch_by_name) through the
    /// wildcard project.
    pub async fn get_or_fetch_by_uid(&self, uid: &str, view: Option<View>) -> Result<Document> {
        self.get_or_fetch_by_name(&document_name("-", uid), view).await
    }

    /// Replace a document's content and cache the response.
    #[instrument(skip(self, content), fields(operation = "update_document_content"))]
    pub async fn update_content(
        &self,
        name: &str,
        content: impl Into<String> + Send,
    ) -> Result<Document> {
        let document = Document::new(name, "").with_content(content);
        let ctx = CallContext::new("DocumentService/UpdateDocument");
        let updated = self
            .chain
            .unary(&ctx, self.service.update_document(document, &["content"]))
            .await?;
        self.cache_document(&updated, View::Full);
        Ok(updated)
    }
}
