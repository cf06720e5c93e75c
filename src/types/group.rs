//! Resource group types

use serde::{Deserialize, Serialize};

/// A rule-based group of workspace resources.
///
/// `expression` is an opaque predicate string evaluated server-side; the
/// matched/unmatched member lists are only populated in FULL views and in
/// validate-only create responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub name: String,
    pub title: String,
    pub expression: String,
    #[serde(default)]
    pub matched_members: Vec<String>,
    #[serde(default)]
    pub unmatched_members: Vec<String>,
}

impl ResourceGroup {
    /// Create a group with a name, title and matching expression.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            expression: expression.into(),
            matched_members: Vec::new(),
            unmatched_members: Vec::new(),
        }
    }
}

/// Result of evaluating a group expression without creating the group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchList {
    pub matched: Vec<String>,
    pub unmatched: Vec<String>,
}
