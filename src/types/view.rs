//! Resource view levels

use serde::{Deserialize, Serialize};

/// How much of a resource a read or fetch should carry.
///
/// FULL and BASIC of the same resource are distinct cache entries; a
/// FULL write supersedes the BASIC one, never the other way around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum View {
    /// Metadata only (listing fields).
    #[default]
    Basic,
    /// Metadata plus content payloads.
    Full,
}
