//! Behavioral health documents: extraction, context filtering and merging.

use crate::context::ContextTag;
use crate::mcp::{CallToolResult, ReadResourceResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A benefits document. Unknown fields ride along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_english_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_english_email_save: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_english_video_action: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Document {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// First non-empty action link.
    pub fn link(&self) -> Option<&str> {
        [
            &self.on_english_action,
            &self.on_english_email_save,
            &self.on_english_video_action,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|link| !link.is_empty())
    }

    fn matches_any(&self, keywords: &[&str]) -> bool {
        let name = self.name.to_lowercase();
        let description = self.description.to_lowercase();
        keywords
            .iter()
            .any(|kw| name.contains(kw) || description.contains(kw))
    }
}

/// One group of documents in the tool payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, rename = "Docs")]
    pub docs: Vec<Document>,
}

/// Payload of a per-context resource block.
#[derive(Debug, Clone, Default, Deserialize)]
struct ResourceDocs {
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    docs: Vec<Document>,
}

/// Keep documents matching the context keywords. Falls back to the full list
/// when the context has no keywords or nothing matches.
pub fn filter_by_context(docs: &[Document], context: ContextTag) -> Vec<Document> {
    let keywords = context.doc_keywords();
    if keywords.is_empty() {
        return docs.to_vec();
    }
    let matched: Vec<Document> = docs
        .iter()
        .filter(|doc| doc.matches_any(keywords))
        .cloned()
        .collect();
    if matched.is_empty() {
        debug!(context = %context, "No documents matched, keeping all");
        docs.to_vec()
    } else {
        matched
    }
}

/// Curated documents followed by the dynamic ones they don't already name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Merged {
    pub docs: Vec<Document>,
    pub curated: usize,
    pub additional: usize,
}

pub fn merge(curated: &[Document], dynamic: &[Document]) -> Merged {
    let existing: HashSet<&str> = curated.iter().map(|d| d.name.as_str()).collect();
    let additional: Vec<&Document> = dynamic
        .iter()
        .filter(|d| !existing.contains(d.name.as_str()))
        .collect();

    let mut docs = curated.to_vec();
    docs.extend(additional.iter().map(|d| (*d).clone()));

    Merged {
        curated: curated.len(),
        additional: additional.len(),
        docs,
    }
}

/// Parse the JSON category list carried in the first text block of a tool result.
pub fn categories_from_tool_result(result: &CallToolResult) -> serde_json::Result<Vec<Category>> {
    let text = result.texts().next().unwrap_or("[]");
    serde_json::from_str(text)
}

/// Documents of the first category, or nothing if the payload is unusable.
pub fn dynamic_docs(result: &CallToolResult) -> Vec<Document> {
    match categories_from_tool_result(result) {
        Ok(categories) => categories
            .into_iter()
            .next()
            .map(|c| c.docs)
            .unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Tool content is not a category list");
            Vec::new()
        }
    }
}

/// Curated documents from a resource read. The last parsable block wins.
pub fn docs_from_resource(result: &ReadResourceResult) -> Vec<Document> {
    let mut docs = Vec::new();
    for content in &result.contents {
        let text = content.text.as_deref().unwrap_or("{}");
        match serde_json::from_str::<ResourceDocs>(text) {
            Ok(block) => {
                debug!(
                    uri = %content.uri,
                    context = block.context.as_deref().unwrap_or("-"),
                    docs = block.docs.len(),
                    "Parsed resource block"
                );
                docs = block.docs;
            }
            Err(e) => warn!(uri = %content.uri, error = %e, "Resource block is not a doc list"),
        }
    }
    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::{Content, ResourceContent};
    use serde_json::json;

    fn doc(name: &str, description: &str) -> Document {
        Document {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    fn names(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn filter_keeps_matches_by_name_or_description() {
        let docs = vec![
            doc("Substance Use Support", ""),
            doc("Wellness Coaching", "Help with alcohol and drugs"),
            doc("Vision Plan", "Eye exams"),
        ];
        let filtered = filter_by_context(&docs, ContextTag::Sud);
        assert_eq!(
            names(&filtered),
            vec!["Substance Use Support", "Wellness Coaching"]
        );
    }

    #[test]
    fn general_returns_input_unchanged() {
        let docs = vec![doc("A", "x"), doc("B", "y")];
        assert_eq!(filter_by_context(&docs, ContextTag::General), docs);
    }

    #[test]
    fn no_match_falls_back_to_all() {
        let docs = vec![doc("Vision Plan", "Eye exams"), doc("Dental", "Cleanings")];
        assert_eq!(filter_by_context(&docs, ContextTag::YouthBh), docs);
    }

    #[test]
    fn filter_of_empty_is_empty() {
        assert!(filter_by_context(&[], ContextTag::Anxiety).is_empty());
    }

    #[test]
    fn shared_keyword_matches_both_contexts() {
        let docs = vec![doc("Mental Health Navigator", ""), doc("Dental", "")];
        assert_eq!(
            names(&filter_by_context(&docs, ContextTag::Anxiety)),
            vec!["Mental Health Navigator"]
        );
        assert_eq!(
            names(&filter_by_context(&docs, ContextTag::Depression)),
            vec!["Mental Health Navigator"]
        );
    }

    #[test]
    fn merge_drops_dynamic_duplicates() {
        let curated = vec![Document::named("A")];
        let dynamic = vec![Document::named("A"), Document::named("B")];
        let merged = merge(&curated, &dynamic);
        assert_eq!(names(&merged.docs), vec!["A", "B"]);
        assert_eq!((merged.curated, merged.additional), (1, 1));
    }

    #[test]
    fn merge_with_empty_or_self_is_curated() {
        let curated = vec![Document::named("A"), Document::named("B")];
        assert_eq!(merge(&curated, &[]).docs, curated);
        assert_eq!(merge(&curated, &curated).docs, curated);
    }

    #[test]
    fn merge_names_are_case_sensitive() {
        let merged = merge(&[Document::named("Crisis Line")], &[Document::named("crisis line")]);
        assert_eq!(merged.docs.len(), 2);
    }

    #[test]
    fn merge_keeps_curated_duplicates() {
        let curated = vec![Document::named("A"), Document::named("A")];
        let merged = merge(&curated, &[Document::named("A"), Document::named("C")]);
        assert_eq!(names(&merged.docs), vec!["A", "A", "C"]);
    }

    #[test]
    fn link_prefers_action_then_email_then_video() {
        let mut d = Document::named("A");
        assert_eq!(d.link(), None);
        d.on_english_video_action = Some("https://video".into());
        assert_eq!(d.link(), Some("https://video"));
        d.on_english_action = Some(String::new());
        d.on_english_email_save = Some("mailto:x".into());
        assert_eq!(d.link(), Some("mailto:x"));
    }

    #[test]
    fn document_round_trips_unknown_fields() {
        let value = json!({
            "name": "EAP",
            "description": "Counseling",
            "onEnglishAction": "https://eap",
            "icon": "heart"
        });
        let d: Document = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(d.link(), Some("https://eap"));
        assert_eq!(d.extra["icon"], "heart");
        assert_eq!(serde_json::to_value(&d).unwrap(), value);
    }

    #[test]
    fn null_name_and_description_become_empty() {
        let d: Document =
            serde_json::from_value(json!({"name": null, "description": null})).unwrap();
        assert_eq!(d.name, "");
        assert_eq!(d.description, "");
        assert!(d.extra.is_empty());
    }

    #[test]
    fn unknown_fields_keep_their_order() {
        let d: Document =
            serde_json::from_str(r#"{"name":"EAP","zeta":1,"alpha":2,"mid":3}"#).unwrap();
        assert_eq!(d.extra.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(
            serde_json::to_string(&d).unwrap(),
            r#"{"name":"EAP","description":"","zeta":1,"alpha":2,"mid":3}"#
        );
    }

    #[test]
    fn null_description_keeps_the_category() {
        let payload = json!([
            {"title": "Behavioral Health", "Docs": [
                {"name": "Crisis Line", "description": null},
                {"name": "EAP", "description": "Counseling"}
            ]}
        ]);
        let result = CallToolResult {
            content: vec![Content::Text {
                text: payload.to_string(),
            }],
            is_error: false,
        };
        assert_eq!(names(&dynamic_docs(&result)), vec!["Crisis Line", "EAP"]);
    }

    #[test]
    fn dynamic_docs_come_from_first_category() {
        let payload = json!([
            {"title": "Behavioral Health", "Docs": [{"name": "A"}, {"name": "B"}]},
            {"title": "Other", "Docs": [{"name": "C"}]}
        ]);
        let result = CallToolResult {
            content: vec![Content::Text {
                text: payload.to_string(),
            }],
            is_error: false,
        };
        assert_eq!(names(&dynamic_docs(&result)), vec!["A", "B"]);
        assert_eq!(categories_from_tool_result(&result).unwrap().len(), 2);
    }

    #[test]
    fn dynamic_docs_tolerate_plain_text() {
        let result = CallToolResult {
            content: vec![Content::Text {
                text: "upstream unavailable".into(),
            }],
            is_error: true,
        };
        assert!(dynamic_docs(&result).is_empty());
    }

    #[test]
    fn resource_docs_last_block_wins() {
        let block = |name: &str| ResourceContent {
            uri: "resource://bcbsnc/sud".into(),
            mime_type: Some("application/json".into()),
            text: Some(json!({"context": "sud", "docs": [{"name": name}]}).to_string()),
        };
        let result = ReadResourceResult {
            contents: vec![block("first"), block("second")],
        };
        assert_eq!(names(&docs_from_resource(&result)), vec!["second"]);
    }

    #[test]
    fn resource_docs_skip_bad_blocks() {
        let result = ReadResourceResult {
            contents: vec![ResourceContent {
                uri: "resource://bcbsnc/general".into(),
                mime_type: None,
                text: Some("not json".into()),
            }],
        };
        assert!(docs_from_resource(&result).is_empty());
    }
}
