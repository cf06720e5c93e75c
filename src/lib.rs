//! Muninn - Client-side data layer for remote workspace APIs
//!
//! This crate provides the plumbing a client shell needs between its UI
//! and a remote workspace API: a keyed entity/request cache that
//! deduplicates concurrent fetches, an RPC middleware chain that turns
//! call failures into session, navigation and notification effects, and
//! an incremental suggestion machine fed by a completion backend.
//!
//! Transport, UI and durable storage stay on the consumer's side of the
//! trait seams in [`traits`]; muninn never opens a connection itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use muninn::{Muninn, View};
//!
//! #[tokio::main]
//! async fn main() -> muninn::Result<()> {
//!     let workspace = Muninn::builder()
//!         .document_service(Arc::new(documents))
//!         .group_service(Arc::new(groups))
//!         .plan_service(Arc::new(plans))
//!         .completion_service(Arc::new(completion))
//!         .notifier(Arc::new(toasts))
//!         .navigator(Arc::new(router))
//!         .build()?;
//!
//!     // Concurrent callers share one remote fetch per (uid, view).
//!     let document = workspace
//!         .documents()
//!         .get_or_fetch_by_uid("102", Some(View::Full))
//!         .await?;
//!     println!("{}", document.title);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod middleware;
pub mod session;
pub mod storage;
pub mod store;
pub mod suggest;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod workspace;

// Re-export main types at crate root
pub use cache::KeyedCache;
pub use error::{Code, Error, Result};
pub use middleware::{CallContext, RpcChain};
pub use session::SessionState;
pub use storage::{KeyValueStorage, MemoryStorage, ScopedStorage};
pub use store::{DocumentStore, GetGroupOptions, PlanFind, PlanStore, ResourceGroupStore};
pub use suggest::{DynamicSuggestions, SuggestionConfig, SuggestionContext, SuggestionState};
pub use traits::EventStream;
pub use workspace::{Muninn, Workspace, WorkspaceBuilder};

// Re-export all types
pub use types::{
    Candidate, CheckRun, CheckState, CheckSummary, CompletionResponse, Document, MatchList,
    Message, Notification, NotificationStyle, Plan, PlanPage, PlanSpec, ResourceGroup, Role,
    Route, View, document_name, document_uid,
};
