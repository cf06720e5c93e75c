//! Document resource type and name helpers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A workspace document.
///
/// Named `projects/{project}/documents/{uid}`. BASIC views omit
/// `content`; FULL views carry it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub title: String,
    pub creator: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}

impl Document {
    /// Create a document with a name and title, other fields defaulted.
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the content payload, keeping `content_size` in sync.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self.content_size = self.content.len() as u64;
        self
    }
}

/// Extract the uid from a document resource name.
///
/// Accepts the wildcard project (`projects/-/documents/{uid}`).
pub fn document_uid(name: &str) -> Result<String> {
    let parts: Vec<&str> = name.split('/').collect();
    match parts.as_slice() {
        ["projects", project, "documents", uid] if !project.is_empty() && !uid.is_empty() => {
            Ok((*uid).to_owned())
        }
        _ => Err(Error::InvalidName(name.to_owned())),
    }
}

/// Build a document resource name from a project and uid.
pub fn document_name(project: &str, uid: &str) -> String {
    format!("projects/{project}/documents/{uid}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_round_trips_through_name() {
        let name = document_name("alpha", "102");
        assert_eq!(name, "projects/alpha/documents/102");
        assert_eq!(document_uid(&name).unwrap(), "102");
    }

    #[test]
    fn uid_accepts_wildcard_project() {
        assert_eq!(document_uid("projects/-/documents/7").unwrap(), "7");
    }

    #[test]
    fn uid_rejects_malformed_names() {
        for name in [
            "",
            "documents/7",
            "projects/alpha",
            "projects/alpha/sheets/7",
            "projects/alpha/documents/",
            "projects/alpha/documents/7/extra",
        ] {
            assert!(matches!(document_uid(name), Err(Error::InvalidName(_))), "{name}");
        }
    }

    #[test]
    fn with_content_tracks_size() {
        let doc = Document::new("projects/p/documents/1", "t").with_content("SELECT 1;");
        assert_eq!(doc.content_size, 9);
    }
}
