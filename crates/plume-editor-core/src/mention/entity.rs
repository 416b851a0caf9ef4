//! Mention entities, options and suggestion sources.

use std::collections::BTreeMap;

use n0_future::boxed::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// A person (or anything else) that can be mentioned.
///
/// Immutable once fetched; copied by value into the document on commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionEntity {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, String>>,
}

impl MentionEntity {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value: None,
            avatar_url: None,
            meta: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// Text shown in the suggestion list: `value`, falling back to `label`.
    pub fn list_text(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.label)
    }

    /// Text shown inside the committed chip: `value`, or `@label`.
    pub fn chip_text(&self) -> String {
        match &self.value {
            Some(value) => value.clone(),
            None => format!("@{}", self.label),
        }
    }

    /// Payload handed to the document engine when this entity is committed.
    pub fn embed_value(&self) -> MentionEmbedValue<'_> {
        MentionEmbedValue {
            entity: self,
            text: self.chip_text(),
        }
    }
}

/// A committed mention as the document engine receives it: the entity's
/// fields plus the `text` its chip renders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MentionEmbedValue<'a> {
    #[serde(flatten)]
    pub entity: &'a MentionEntity,
    pub text: String,
}

/// Tuning options for the mention engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MentionOptions {
    /// Shortest query that opens a session.
    pub min_chars: usize,
    /// Longest query that keeps a session open.
    pub max_chars: usize,
    /// Cap on rendered candidates.
    pub max_items: usize,
    /// Placeholder shown when a query has no candidates.
    pub empty_message: String,
}

impl Default for MentionOptions {
    fn default() -> Self {
        Self {
            min_chars: 0,
            max_chars: 32,
            max_items: 8,
            empty_message: "No matches".to_string(),
        }
    }
}

impl MentionOptions {
    /// How far back from the caret to look for the trigger.
    pub fn search_window(&self) -> usize {
        self.max_chars + 1
    }
}

/// Pluggable asynchronous lookup of mention candidates.
pub trait MentionSource {
    fn search(&self, query: &str) -> BoxFuture<Result<Vec<MentionEntity>, SourceError>>;
}

/// Fixed in-memory directory, filtered by case-insensitive substring match
/// on label or value. An empty query returns every entry.
#[derive(Clone, Debug)]
pub struct StaticMentionSource {
    entries: Vec<MentionEntity>,
}

impl StaticMentionSource {
    pub fn new(entries: Vec<MentionEntity>) -> Self {
        Self { entries }
    }

    /// Synchronous filter used by `search`.
    pub fn filter(&self, query: &str) -> Vec<MentionEntity> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return self.entries.clone();
        }
        self.entries
            .iter()
            .filter(|entry| {
                entry.label.to_lowercase().contains(&normalized)
                    || entry
                        .value
                        .as_deref()
                        .is_some_and(|v| v.to_lowercase().contains(&normalized))
            })
            .cloned()
            .collect()
    }
}

impl Default for StaticMentionSource {
    fn default() -> Self {
        Self::new(default_mentions())
    }
}

impl MentionSource for StaticMentionSource {
    fn search(&self, query: &str) -> BoxFuture<Result<Vec<MentionEntity>, SourceError>> {
        let results = self.filter(query);
        Box::pin(async move { Ok(results) })
    }
}

fn avatar(fill: &str) -> String {
    format!(
        "data:image/svg+xml;utf8,<svg xmlns='http://www.w3.org/2000/svg' width='24' height='24'>\
         <circle cx='12' cy='12' r='12' fill='%23{fill}'/></svg>"
    )
}

/// The built-in demo directory.
pub fn default_mentions() -> Vec<MentionEntity> {
    [
        ("u1", "Alice Johnson", "@alice_johnson", "38bdf8"),
        ("u2", "Ben Carter", "@ben_carter", "f472b6"),
        ("u3", "Chen Li", "@chen_li", "4ade80"),
        ("u4", "Daria Novak", "@daria_novak", "f59e0b"),
        ("u5", "Elliot Park", "@elliot_park", "6366f1"),
        ("u6", "Fatima Ali", "@fatima_ali", "f97316"),
    ]
    .into_iter()
    .map(|(id, label, value, fill)| {
        MentionEntity::new(id, label)
            .with_value(value)
            .with_avatar(avatar(fill))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(entries: &[MentionEntity]) -> Vec<&str> {
        entries.iter().map(|e| e.label.as_str()).collect()
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let source = StaticMentionSource::default();
        assert_eq!(source.filter("").len(), 6);
        assert_eq!(source.filter("   ").len(), 6);
    }

    #[test]
    fn test_filter_matches_label_or_value() {
        let source = StaticMentionSource::default();
        insta::assert_yaml_snapshot!(labels(&source.filter("LI")), @r"
        - Alice Johnson
        - Chen Li
        - Elliot Park
        - Fatima Ali
        ");
        assert_eq!(labels(&source.filter("_park")), vec!["Elliot Park"]);
        assert!(source.filter("zed").is_empty());
    }

    #[tokio::test]
    async fn test_search_resolves_filtered_results() {
        let source = StaticMentionSource::default();
        let results = source.search("ben").await.unwrap();
        assert_eq!(labels(&results), vec!["Ben Carter"]);
    }

    #[test]
    fn test_display_text() {
        let plain = MentionEntity::new("x", "Xi");
        assert_eq!(plain.list_text(), "Xi");
        assert_eq!(plain.chip_text(), "@Xi");

        let valued = plain.with_value("@xi");
        assert_eq!(valued.list_text(), "@xi");
        assert_eq!(valued.chip_text(), "@xi");
    }

    #[test]
    fn test_embed_value_carries_chip_text() {
        let plain = MentionEntity::new("x", "Xi");
        let value = plain.embed_value();
        assert_eq!(value.entity, &plain);
        assert_eq!(value.text, "@Xi");

        let valued = plain.clone().with_value("@xi");
        assert_eq!(valued.embed_value().text, "@xi");
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: MentionOptions =
            serde::Deserialize::deserialize(serde::de::value::MapDeserializer::<
                _,
                serde::de::value::Error,
            >::new(std::iter::once(("maxItems", 3usize))))
            .unwrap();
        assert_eq!(options.max_items, 3);
        assert_eq!(options.max_chars, 32);
        assert_eq!(options.search_window(), 33);
    }
}
