//! Non-whitespace character counter.

use serde::{Deserialize, Serialize};

use crate::port::DocumentPort;
use crate::types::EMBED_PLACEHOLDER;

pub const COUNTER_CLASS: &str = "ql-char-counter";
pub const EXCEED_CLASS: &str = "ql-char-counter-exceed";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CounterOptions {
    pub limit: Option<usize>,
}

/// A measured count, ready to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CharCount {
    pub count: usize,
    pub limit: Option<usize>,
}

impl CharCount {
    pub fn of_text(text: &str, limit: Option<usize>) -> Self {
        let count = text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != EMBED_PLACEHOLDER)
            .count();
        Self { count, limit }
    }

    pub fn of_document<P: DocumentPort + ?Sized>(port: &P, options: &CounterOptions) -> Self {
        Self::of_text(&port.text(0, port.len()), options.limit)
    }

    pub fn exceeded(&self) -> bool {
        self.limit.is_some_and(|limit| self.count > limit)
    }

    pub fn label(&self) -> String {
        match self.limit {
            Some(limit) => format!("{} / {limit} chars", self.count),
            None => format!("{} chars", self.count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::types::{Embed, Source};

    #[test]
    fn test_counts_non_whitespace() {
        let count = CharCount::of_text(" a b\n\tc ", None);
        assert_eq!(count.count, 3);
        assert_eq!(count.label(), "3 chars");
        assert!(!count.exceeded());
    }

    #[test]
    fn test_limit_label_and_exceed() {
        let labels: Vec<_> = ["abc", "abcd", "abcde"]
            .into_iter()
            .map(|text| {
                let count = CharCount::of_text(text, Some(4));
                (count.label(), count.exceeded())
            })
            .collect();
        insta::assert_yaml_snapshot!(labels, @r"
        - - 3 / 4 chars
          - false
        - - 4 / 4 chars
          - false
        - - 5 / 4 chars
          - true
        ");
    }

    #[test]
    fn test_embeds_are_not_counted() {
        let doc = MemoryDocument::from_str("hi there");
        doc.insert_embed(2, &Embed::Image("x".into()), Source::User);
        let count = CharCount::of_document(&doc, &CounterOptions::default());
        assert_eq!(count.count, 7);
    }
}
