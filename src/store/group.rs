use std::sync::Arc;

use chrono::Utc;
use futures_util::FutureExt;
use tracing::instrument;

use crate::cache::KeyedCache;
use crate::middleware::{CallContext, RpcChain};
use crate::traits::ResourceGroupService;
use crate::types::{MatchList, ResourceGroup, View};
use crate::Result;

type GroupKey = (String, View);

/// Options for [`ResourceGroupStore::get_or_fetch_by_name`].
///
/// Defaults: BASIC view, cache honoured, errors surfaced to the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetGroupOptions {
    skip_cache: bool,
    silent: bool,
    view: View,
}

impl GetGroupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bypass the cache probe; the fetched group is still written back.
    pub fn skip_cache(mut self, skip_cache: bool) -> Self {
        self.skip_cache = skip_cache;
        self
    }

    /// Suppress middleware side effects for this call.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn view(mut self, view: View) -> Self {
        self.view = view;
        self
    }
}

/// Resource groups, cached by `(name, view)`.
#[derive(Clone)]
pub struct ResourceGroupStore {
    service: Arc<dyn ResourceGroupService>,
    chain: RpcChain,
    cache: KeyedCache<GroupKey, ResourceGroup>,
}

impl ResourceGroupStore {
    pub fn new(service: Arc<dyn ResourceGroupService>, chain: RpcChain) -> Self {
        Self {
            service,
            chain,
            cache: KeyedCache::new("group"),
        }
    }

    fn cache_group(&self, group: &ResourceGroup, view: View) {
        if view == View::Full {
            self.cache
                .invalidate_entity(&(group.name.clone(), View::Basic));
        }
        self.cache.set_entity((group.name.clone(), view), group.clone());
    }

    /// Resolve a group by name, deduplicating concurrent fetches.
    ///
    /// The probe is exact-view: a BASIC entry does not answer a FULL
    /// read. `skip_cache` forces a remote call and overwrites the entry.
    #[instrument(skip(self, options), fields(operation = "get_group"))]
    pub async fn get_or_fetch_by_name(
        &self,
        name: &str,
        options: GetGroupOptions,
    ) -> Result<ResourceGroup> {
        let GetGroupOptions {
            skip_cache,
            silent,
            view,
        } = options;
        if skip_cache {
            let ctx = CallContext::new("ResourceGroupService/GetGroup").silent(silent);
            let group = self.chain.unary(&ctx, self.service.get_group(name, view)).await?;
            self.cache_group(&group, view);
            return Ok(group);
        }

        let fetch = {
            let service = Arc::clone(&self.service);
            let chain = self.chain.clone();
            let name = name.to_owned();
            move || {
                async move {
                    let ctx = CallContext::new("ResourceGroupService/GetGroup").silent(silent);
                    chain.unary(&ctx, service.get_group(&name, view)).await
                }
                .boxed()
            }
        };
        let store = self.clone();
        let superseded = (name.to_owned(), View::Basic);
        self.cache
            .get_or_fetch((name.to_owned(), view), fetch, move |_| {
                if view == View::Full {
                    store.cache.invalidate_entity(&superseded);
                }
            })
            .await
    }

    /// List a project's groups, caching each at BASIC.
    #[instrument(skip(self), fields(operation = "list_groups"))]
    pub async fn list_by_parent(&self, parent: &str) -> Result<Vec<ResourceGroup>> {
        let ctx = CallContext::new("ResourceGroupService/ListGroups");
        let groups = self.chain.unary(&ctx, self.service.list_groups(parent)).await?;
        for group in &groups {
            self.cache_group(group, View::Basic);
        }
        Ok(groups)
    }

    /// Cached read by name. No explicit view reads FULL, then BASIC.
    pub fn get_by_name(&self, name: &str, view: Option<View>) -> Option<ResourceGroup> {
        match view {
            Some(view) => self.cache.get_entity(&(name.to_owned(), view)),
            None => self
                .cache
                .get_entity(&(name.to_owned(), View::Full))
                .or_else(|| self.cache.get_entity(&(name.to_owned(), View::Basic))),
        }
    }

    /// Create a group. Validate-only calls are silenced and leave the
    /// cache untouched.
    #[instrument(skip(self, group), fields(operation = "create_group"))]
    pub async fn create(
        &self,
        parent: &str,
        group: ResourceGroup,
        group_id: &str,
        validate_only: bool,
    ) -> Result<ResourceGroup> {
        let ctx = CallContext::new("ResourceGroupService/CreateGroup").silent(validate_only);
        let created = self
            .chain
            .unary(
                &ctx,
                self.service.create_group(parent, group, group_id, validate_only),
            )
            .await?;
        if !validate_only {
            self.cache_group(&created, View::Full);
        }
        Ok(created)
    }

    #[instrument(skip(self, group), fields(operation = "update_group"))]
    pub async fn update(&self, group: ResourceGroup, update_mask: &[&str]) -> Result<ResourceGroup> {
        let ctx = CallContext::new("ResourceGroupService/UpdateGroup");
        let updated = self
            .chain
            .unary(&ctx, self.service.update_group(group, update_mask))
            .await?;
        self.cache_group(&updated, View::Full);
        Ok(updated)
    }

    /// Delete a group and drop both cached views.
    #[instrument(skip(self), fields(operation = "delete_group"))]
    pub async fn delete(&self, name: &str) -> Result<()> {
        let ctx = CallContext::new("ResourceGroupService/DeleteGroup");
        self.chain.unary(&ctx, self.service.delete_group(name)).await?;
        self.cache.invalidate_entity(&(name.to_owned(), View::Full));
        self.cache.invalidate_entity(&(name.to_owned(), View::Basic));
        Ok(())
    }

    /// Evaluate a membership expression without creating anything.
    ///
    /// Issues a validate-only create under a throwaway timestamped id;
    /// an empty expression falls back to matching everything.
    #[instrument(skip(self), fields(operation = "fetch_match_list"))]
    pub async fn fetch_match_list(&self, parent: &str, expression: &str) -> Result<MatchList> {
        let expression = if expression.is_empty() { "true" } else { expression };
        let group_id = format!("validating-group-{}", Utc::now().timestamp_millis());
        let group = ResourceGroup::new(
            format!("{parent}/groups/{group_id}"),
            group_id.clone(),
            expression,
        );
        let created = self.create(parent, group, &group_id, true).await?;
        Ok(MatchList {
            matched: created.matched_members,
            unmatched: created.unmatched_members,
        })
    }
}
