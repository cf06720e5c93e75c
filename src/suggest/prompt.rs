//! Prompt assembly and response decoding for suggestion fetches.

use indexmap::IndexMap;

use crate::types::CompletionResponse;

/// Build the `[system, user]` message contents for one suggestion fetch.
///
/// The system command pins the response shape to a bare JSON object so
/// [`parse_suggestions`] can decode it; the user prompt carries the data
/// source description and the suggestions the model must not repeat.
pub(crate) fn dynamic_suggestions_prompt(metadata: &str, exclusion: &[String]) -> (String, String) {
    let command = "You suggest questions a user could ask about the data source \
        described by the text they provide. Reply with a single JSON object whose \
        values are the suggested questions, for example \
        {\"1\": \"How many rows does each table hold?\", \"2\": \"...\"}. \
        Reply with the JSON object only, no surrounding text. If there is nothing \
        new worth asking, reply with {}."
        .to_owned();

    let mut prompt = format!("The data source:\n{metadata}");
    if !exclusion.is_empty() {
        prompt.push_str("\n\nDo not repeat any of these suggestions:\n");
        for suggestion in exclusion {
            prompt.push_str("- ");
            prompt.push_str(suggestion);
            prompt.push('\n');
        }
    }
    (command, prompt)
}

/// Decode a completion into suggestion strings.
///
/// Reads the first candidate's content, trimmed, as a JSON object and
/// returns its values in document order. Everything else (missing
/// candidate, non-object payload, non-string values) decodes to an
/// empty batch.
pub(crate) fn parse_suggestions(response: &CompletionResponse) -> Vec<String> {
    let Some(candidate) = response.candidates.first() else {
        return Vec::new();
    };
    serde_json::from_str::<IndexMap<String, String>>(candidate.content.trim())
        .map(|suggestions| suggestions.into_values().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_values_in_document_order() {
        let response = CompletionResponse::single(
            r#"  {"z": "first one", "a": "second one", "m": "third one"}  "#,
        );
        assert_eq!(
            parse_suggestions(&response),
            vec!["first one", "second one", "third one"]
        );
    }

    #[test]
    fn rejects_non_object_payloads() {
        for content in ["[\"a\", \"b\"]", "\"plain\"", "not json at all", "", "{\"k\": 3}"] {
            let response = CompletionResponse::single(content);
            assert!(parse_suggestions(&response).is_empty(), "content: {content}");
        }
        assert!(parse_suggestions(&CompletionResponse::default()).is_empty());
    }

    #[test]
    fn prompt_lists_exclusions() {
        let exclusion = vec!["old one".to_owned(), "older one".to_owned()];
        let (command, prompt) = dynamic_suggestions_prompt("table t(a int)", &exclusion);
        assert!(command.contains("JSON object"));
        assert!(prompt.contains("table t(a int)"));
        assert!(prompt.contains("- old one\n"));
        assert!(prompt.contains("- older one\n"));

        let (_, bare) = dynamic_suggestions_prompt("table t(a int)", &[]);
        assert!(!bare.contains("Do not repeat"));
    }
}
