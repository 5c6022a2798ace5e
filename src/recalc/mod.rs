// Recalculation module
// This module batch-drives re-scoring of the paper collection and
// re-embedding of per-paper notes

#[cfg(test)]
mod tests;

use tracing::{info, warn};

use crate::database::{Database, Paper};
use crate::session::ResearchSession;
use crate::{Result, TriageError};

/// Score drift below this many percentage points counts as unchanged.
const SCORE_CHANGE_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreRefreshStats {
    pub total: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteRefreshStats {
    pub updated: usize,
    pub errors: usize,
    pub total_papers: usize,
}

/// Drives batch re-scoring against one session (one context version, one
/// model). Per-paper failures are counted and logged, never fatal.
pub struct Recalculator<'a> {
    session: &'a ResearchSession,
    database: &'a Database,
}

impl<'a> Recalculator<'a> {
    #[inline]
    pub fn new(session: &'a ResearchSession, database: &'a Database) -> Self {
        Self { session, database }
    }

    /// Re-scores every stored paper against the current context embedding.
    ///
    /// A paper counts as updated when its raw score moved by more than
    /// `SCORE_CHANGE_THRESHOLD`; the new score, category, embedding, and
    /// model are persisted either way. Reading status is never touched.
    /// `progress` receives `(processed, total)` after each paper.
    #[inline]
    pub async fn recalculate_all_scores<F>(&self, mut progress: F) -> Result<ScoreRefreshStats>
    where
        F: FnMut(usize, usize),
    {
        if !self.session.has_context() {
            return Err(TriageError::ContextNotLoaded);
        }

        let papers = self.database.list_papers().await?;
        let total = papers.len();
        let mut stats = ScoreRefreshStats {
            total,
            ..Default::default()
        };

        for (index, paper) in papers.iter().enumerate() {
            match self.rescore_paper(paper).await {
                Ok(changed) => {
                    if changed {
                        stats.updated += 1;
                    } else {
                        stats.unchanged += 1;
                    }
                }
                Err(e) => {
                    warn!(
                        "Failed to re-score paper {} ({}): {:#}",
                        paper.id, paper.title, e
                    );
                    stats.errors += 1;
                }
            }

            progress(index + 1, total);
        }

        info!(
            "Re-scored {} papers: {} updated, {} unchanged, {} errors",
            stats.total, stats.updated, stats.unchanged, stats.errors
        );

        Ok(stats)
    }

    /// Refreshes embeddings for papers whose notes changed since their last
    /// embed. Papers without real notes are left alone; their cached
    /// embedding is still valid because only notes feed back into it.
    /// `progress` receives `(processed, total)` over the stale set.
    #[inline]
    pub async fn refresh_note_embeddings<F>(&self, mut progress: F) -> Result<NoteRefreshStats>
    where
        F: FnMut(usize, usize),
    {
        if !self.session.has_context() {
            return Err(TriageError::ContextNotLoaded);
        }

        let total_papers = self.database.count_papers().await? as usize;
        let stale = self.database.list_stale_papers_with_notes().await?;
        let total = stale.len();
        let mut stats = NoteRefreshStats {
            total_papers,
            ..Default::default()
        };

        for (index, paper) in stale.iter().enumerate() {
            match self.rescore_paper(paper).await {
                Ok(_) => stats.updated += 1,
                Err(e) => {
                    warn!(
                        "Failed to refresh embedding for paper {} ({}): {:#}",
                        paper.id, paper.title, e
                    );
                    stats.errors += 1;
                }
            }

            progress(index + 1, total);
        }

        info!(
            "Refreshed note embeddings: {} updated, {} errors, {} papers total",
            stats.updated, stats.errors, stats.total_papers
        );

        Ok(stats)
    }

    /// Scores one paper through the notes-inclusive path and persists the
    /// result. Returns whether the raw score moved past the change threshold.
    async fn rescore_paper(&self, paper: &Paper) -> Result<bool> {
        let report = self
            .session
            .score_paper(&paper.title, &paper.abstract_text, &paper.notes)?;
        let changed = (report.raw_score - paper.relevance_score).abs() > SCORE_CHANGE_THRESHOLD;

        self.database
            .record_paper_score(
                &paper.id,
                report.raw_score,
                report.category,
                &report.embedding,
                self.session.model_name(),
            )
            .await?;

        Ok(changed)
    }
}
