//! Context tags and query classification.

use crate::llm::LlmClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// Behavioral health category used to pick a curated resource and a keyword filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextTag {
    Anxiety,
    Depression,
    Sud,
    #[serde(rename = "youth-bh")]
    YouthBh,
    #[default]
    General,
}

/// Query keyword groups, checked in order. The first group with a hit wins.
const QUERY_GROUPS: [(ContextTag, &[&str]); 4] = [
    (
        ContextTag::Sud,
        &["drug", "alcohol", "substance", "overuse", "sud"],
    ),
    (ContextTag::Anxiety, &["anxiety", "stress", "worry", "panic"]),
    (
        ContextTag::Depression,
        &["depression", "sad", "mood", "hopeless"],
    ),
    (ContextTag::YouthBh, &["youth", "child", "teen", "adolescent"]),
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized context '{0}'")]
pub struct ContextParseError(pub String);

impl ContextTag {
    pub const ALL: [ContextTag; 5] = [
        ContextTag::Anxiety,
        ContextTag::Depression,
        ContextTag::Sud,
        ContextTag::YouthBh,
        ContextTag::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContextTag::Anxiety => "anxiety",
            ContextTag::Depression => "depression",
            ContextTag::Sud => "sud",
            ContextTag::YouthBh => "youth-bh",
            ContextTag::General => "general",
        }
    }

    /// Keywords that select matching documents. Empty for `general`.
    pub fn doc_keywords(self) -> &'static [&'static str] {
        match self {
            ContextTag::Sud => &["substance", "sud", "drug", "alcohol"],
            ContextTag::Anxiety => &["anxiety", "stress", "mental health"],
            ContextTag::Depression => &["depression", "mood", "mental health"],
            ContextTag::YouthBh => &["youth", "ybh", "young", "adolescent"],
            ContextTag::General => &[],
        }
    }

    /// Static keyword classification of a free-text query.
    pub fn from_keywords(query: &str) -> Self {
        let query = query.to_lowercase();
        QUERY_GROUPS
            .iter()
            .find(|(_, words)| words.iter().any(|w| query.contains(w)))
            .map(|(tag, _)| *tag)
            .unwrap_or(ContextTag::General)
    }

    /// Parse a classifier reply, falling back to `general` for anything unknown.
    pub fn from_reply(reply: &str) -> Self {
        reply.parse().unwrap_or_else(|err: ContextParseError| {
            warn!(error = %err, "Classifier returned unknown context, using general");
            ContextTag::General
        })
    }
}

impl fmt::Display for ContextTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextTag {
    type Err = ContextParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ContextTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == normalized)
            .ok_or_else(|| ContextParseError(s.trim().to_string()))
    }
}

/// How a member query is turned into a context tag.
pub enum Classifier {
    Keywords,
    Llm(LlmClient),
}

impl Classifier {
    /// Always yields a tag; remote failures degrade to `general`.
    pub async fn classify(&self, query: &str) -> ContextTag {
        match self {
            Classifier::Keywords => {
                let tag = ContextTag::from_keywords(query);
                info!(context = %tag, "Keyword classifier matched");
                tag
            }
            Classifier::Llm(client) => match client.classify(query).await {
                Ok(reply) => {
                    let tag = ContextTag::from_reply(&reply);
                    info!(context = %tag, reply = %reply.trim(), "LLM classifier replied");
                    tag
                }
                Err(e) => {
                    warn!(error = %e, "LLM classification failed, using general");
                    ContextTag::General
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substance_query_is_sud() {
        assert_eq!(
            ContextTag::from_keywords("I am struggling with drug and alcohol overuse"),
            ContextTag::Sud
        );
    }

    #[test]
    fn sud_wins_over_later_groups() {
        assert_eq!(
            ContextTag::from_keywords("Alcohol makes my anxiety and mood worse"),
            ContextTag::Sud
        );
        assert_eq!(
            ContextTag::from_keywords("panic attacks and feeling sad"),
            ContextTag::Anxiety
        );
        assert_eq!(
            ContextTag::from_keywords("my teen seems hopeless"),
            ContextTag::Depression
        );
    }

    #[test]
    fn each_group_matches_case_insensitively() {
        assert_eq!(ContextTag::from_keywords("So much STRESS"), ContextTag::Anxiety);
        assert_eq!(ContextTag::from_keywords("Depression"), ContextTag::Depression);
        assert_eq!(
            ContextTag::from_keywords("Help for my Child"),
            ContextTag::YouthBh
        );
    }

    #[test]
    fn unmatched_query_is_general() {
        assert_eq!(
            ContextTag::from_keywords("Where is my benefits card?"),
            ContextTag::General
        );
        assert_eq!(ContextTag::from_keywords(""), ContextTag::General);
    }

    #[test]
    fn parse_known_tags() {
        for tag in ContextTag::ALL {
            assert_eq!(tag.as_str().parse::<ContextTag>(), Ok(tag));
        }
        assert_eq!(" Youth-BH\n".parse::<ContextTag>(), Ok(ContextTag::YouthBh));
    }

    #[test]
    fn unknown_reply_defaults_to_general() {
        assert_eq!(ContextTag::from_reply("unknown"), ContextTag::General);
        assert_eq!(ContextTag::from_reply(""), ContextTag::General);
        assert_eq!(ContextTag::from_reply("anxiety."), ContextTag::General);
        assert_eq!(ContextTag::from_reply("  SUD "), ContextTag::Sud);
    }

    #[test]
    fn general_has_no_doc_keywords() {
        assert!(ContextTag::General.doc_keywords().is_empty());
        for tag in ContextTag::ALL {
            if tag != ContextTag::General {
                assert!(!tag.doc_keywords().is_empty(), "{tag} has no keywords");
            }
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_value(ContextTag::YouthBh).unwrap(),
            serde_json::json!("youth-bh")
        );
        let tag: ContextTag = serde_json::from_str("\"sud\"").unwrap();
        assert_eq!(tag, ContextTag::Sud);
    }

    #[tokio::test]
    async fn keyword_classifier_never_fails() {
        let tag = Classifier::Keywords.classify("worry all the time").await;
        assert_eq!(tag, ContextTag::Anxiety);
    }
}
