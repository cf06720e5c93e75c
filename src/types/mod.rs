//! Public types for the muninn API.

mod document;
mod group;
mod message;
mod notification;
mod plan;
mod view;

pub use document::{Document, document_name, document_uid};
pub use group::{MatchList, ResourceGroup};
pub use message::{Candidate, CompletionResponse, Message, Role};
pub use notification::{Notification, NotificationStyle, Route};
pub use plan::{CheckRun, CheckState, CheckSummary, Plan, PlanPage, PlanSpec};
pub use view::View;
