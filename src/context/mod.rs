// Context module
// This module holds the research context data model and the pure text
// composition rules shared by the session and the database layer


use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::{Result, TriageError};

/// Separator between the base research description and the appended snippets.
/// `extract_base` splits on the first occurrence, so composition never parses
/// snippet text back out of the combined string.
pub const SNIPPET_DELIMITER: &str = "\n\n--- Context Snippets ---\n\n";

/// A short piece of text appended to the research context, usually an excerpt
/// from a paper that turned out to be relevant.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub id: String,
    pub content: String,
    pub source: Option<String>,
    pub paper_id: Option<String>,
    pub added_date: NaiveDateTime,
}

impl Snippet {
    /// Create a snippet with a fresh id, rejecting empty or whitespace-only
    /// content.
    #[inline]
    pub fn new(
        content: &str,
        source: Option<String>,
        paper_id: Option<String>,
    ) -> Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(TriageError::EmptySnippet);
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            source,
            paper_id,
            added_date: chrono::Utc::now().naive_utc(),
        })
    }
}

impl From<crate::database::StoredSnippet> for Snippet {
    #[inline]
    fn from(stored: crate::database::StoredSnippet) -> Self {
        Self {
            id: stored.id,
            content: stored.content,
            source: stored.source,
            paper_id: stored.paper_id,
            added_date: stored.added_date,
        }
    }
}

/// The loaded research context.
///
/// `composed_text` and `embedding` are derived from `base_text` and
/// `snippets`; the session only constructs this struct after a successful
/// embed, so the three always describe the same text.
#[derive(Debug, Clone)]
pub struct ResearchContext {
    pub base_text: String,
    pub snippets: Vec<Snippet>,
    pub composed_text: String,
    pub embedding: Vec<f32>,
}

/// Combine the base text with the snippets in insertion order.
///
/// With no snippets the result is exactly the base text, so composing and
/// extracting round-trip.
#[inline]
pub fn compose(base_text: &str, snippets: &[Snippet]) -> String {
    if snippets.is_empty() {
        return base_text.to_string();
    }

    let entries: Vec<String> = snippets
        .iter()
        .map(|snippet| match &snippet.source {
            Some(source) => format!("{}\n(source: {})", snippet.content, source),
            None => snippet.content.clone(),
        })
        .collect();

    format!("{}{}{}", base_text, SNIPPET_DELIMITER, entries.join("\n\n"))
}

/// Recover the base text from a composed string by splitting on the first
/// snippet delimiter. Text without a delimiter is returned unchanged.
#[inline]
pub fn extract_base(composed: &str) -> &str {
    composed
        .split_once(SNIPPET_DELIMITER)
        .map_or(composed, |(base, _)| base)
}
