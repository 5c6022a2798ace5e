// Session module
// This module owns the active encoder and research context and hosts the
// scoring operations that combine them


use tracing::{debug, info};

use crate::context::{ResearchContext, Snippet, compose};
use crate::database::RelevanceCategory;
use crate::embedding::{TextEncoder, cosine_similarity};
use crate::scoring::{ThresholdTable, clamp_for_display, compose_paper_text, similarity_to_score};
use crate::{Result, TriageError};

/// The outcome of scoring a single paper against the loaded context.
#[derive(Debug, Clone)]
pub struct ScoreReport {
    /// Similarity percentage as computed. May drift slightly outside 0-100.
    pub raw_score: f64,
    /// Raw score clamped to 0-100 for presentation.
    pub display_score: f64,
    pub category: RelevanceCategory,
    /// The paper embedding that produced the score, for caching.
    pub embedding: Vec<f32>,
}

/// Owns the active encoder, the optional research context, and the category
/// thresholds. All mutation goes through methods that re-embed before
/// committing, so the stored embedding always matches the composed text.
pub struct ResearchSession {
    encoder: Box<dyn TextEncoder>,
    context: Option<ResearchContext>,
    thresholds: ThresholdTable,
}

impl ResearchSession {
    #[inline]
    pub fn new(encoder: Box<dyn TextEncoder>, thresholds: ThresholdTable) -> Self {
        Self {
            encoder,
            context: None,
            thresholds,
        }
    }

    #[inline]
    pub fn model_name(&self) -> &str {
        self.encoder.model_name()
    }

    #[inline]
    pub fn context(&self) -> Option<&ResearchContext> {
        self.context.as_ref()
    }

    #[inline]
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    #[inline]
    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// Installs a new base text, keeping any snippets already in the session.
    /// Fails with `EmptyContext` when the text is blank after trimming.
    #[inline]
    pub fn load_base(&mut self, text: &str) -> Result<()> {
        let base = text.trim();
        if base.is_empty() {
            return Err(TriageError::EmptyContext);
        }

        let snippets = self
            .context
            .as_ref()
            .map(|context| context.snippets.clone())
            .unwrap_or_default();

        self.install(base.to_string(), snippets)
    }

    /// Startup path: installs the base text and previously stored snippets
    /// with a single compose and embed.
    #[inline]
    pub fn hydrate(&mut self, base_text: &str, snippets: Vec<Snippet>) -> Result<()> {
        let base = base_text.trim();
        if base.is_empty() {
            return Err(TriageError::EmptyContext);
        }

        self.install(base.to_string(), snippets)
    }

    /// Appends a snippet and synchronously re-embeds the composed context.
    /// Returns the created snippet so the caller can persist it.
    #[inline]
    pub fn add_snippet(
        &mut self,
        content: &str,
        source: Option<String>,
        paper_id: Option<String>,
    ) -> Result<Snippet> {
        let Some(context) = self.context.as_ref() else {
            return Err(TriageError::ContextNotLoaded);
        };

        let snippet = Snippet::new(content, source, paper_id)?;
        let mut snippets = context.snippets.clone();
        snippets.push(snippet.clone());

        self.install(context.base_text.clone(), snippets)?;

        Ok(snippet)
    }

    /// Removes a snippet by id. Returns `Ok(false)` without re-embedding when
    /// the id is unknown.
    #[inline]
    pub fn remove_snippet(&mut self, id: &str) -> Result<bool> {
        let Some(context) = self.context.as_ref() else {
            return Ok(false);
        };

        if !context.snippets.iter().any(|snippet| snippet.id == id) {
            return Ok(false);
        }

        let snippets: Vec<Snippet> = context
            .snippets
            .iter()
            .filter(|snippet| snippet.id != id)
            .cloned()
            .collect();

        self.install(context.base_text.clone(), snippets)?;

        Ok(true)
    }

    /// Re-derives the composed text from the current base and snippets and
    /// re-embeds it, so batch re-scoring runs against one context version.
    #[inline]
    pub fn recalculate_context(&mut self) -> Result<()> {
        let Some(context) = self.context.as_ref() else {
            return Err(TriageError::ContextNotLoaded);
        };

        self.install(context.base_text.clone(), context.snippets.clone())
    }

    /// Scores a paper against the loaded context. Notes, when non-blank, are
    /// part of the embedded paper text.
    #[inline]
    pub fn score_paper(
        &self,
        title: &str,
        abstract_text: &str,
        notes: &str,
    ) -> Result<ScoreReport> {
        let Some(context) = self.context.as_ref() else {
            return Err(TriageError::ContextNotLoaded);
        };

        let paper_text = compose_paper_text(title, abstract_text, notes);
        let embedding = self
            .encoder
            .embed(&paper_text)
            .map_err(|e| TriageError::Embedding(format!("{:#}", e)))?;

        let similarity = cosine_similarity(&embedding, &context.embedding)?;
        let raw_score = similarity_to_score(similarity);
        let category = self.thresholds.categorize(raw_score);

        debug!("Scored '{}': {:.1} ({})", title, raw_score, category);

        Ok(ScoreReport {
            raw_score,
            display_score: clamp_for_display(raw_score),
            category,
            embedding,
        })
    }

    /// Embeds the candidate context and commits it only on success, so a
    /// failed embed never leaves the composed text and embedding out of sync.
    fn install(&mut self, base_text: String, snippets: Vec<Snippet>) -> Result<()> {
        let composed_text = compose(&base_text, &snippets);
        let embedding = self
            .encoder
            .embed(&composed_text)
            .map_err(|e| TriageError::Embedding(format!("{:#}", e)))?;

        info!(
            "Embedded research context: {} chars, {} snippets, model {}",
            composed_text.len(),
            snippets.len(),
            self.encoder.model_name()
        );

        self.context = Some(ResearchContext {
            base_text,
            snippets,
            composed_text,
            embedding,
        });

        Ok(())
    }
}
