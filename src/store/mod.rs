//! Resource stores.
//!
//! Each store fronts one remote service with a [`KeyedCache`] keyed by
//! `(identifier, view)` and routes every call through the shared
//! [`RpcChain`]. Stores are cheap to clone and safe to share; clones
//! operate on the same cache.
//!
//! [`KeyedCache`]: crate::cache::KeyedCache
//! [`RpcChain`]: crate::middleware::RpcChain

mod document;
mod group;
mod plan;

pub use document::DocumentStore;
pub use group::{GetGroupOptions, ResourceGroupStore};
pub use plan::{PlanFind, PlanStore, build_plan_filter};
