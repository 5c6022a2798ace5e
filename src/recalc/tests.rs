use tempfile::TempDir;

use super::*;
use crate::database::{NewPaper, PaperStatus, RelevanceCategory};
use crate::embedding::TextEncoder;
use crate::scoring::ThresholdTable;

/// Embeds texts as topic word counts plus a constant component, and fails on
/// a marker word so batch error handling can be exercised.
struct StubEncoder;

fn word_count(text: &str, word: &str) -> f32 {
    text.split_whitespace()
        .filter(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .eq_ignore_ascii_case(word)
        })
        .count() as f32
}

impl TextEncoder for StubEncoder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if text.contains("unencodable") {
            return Err(anyhow::anyhow!("Cannot embed this text"));
        }
        Ok(vec![
            word_count(text, "quantum"),
            word_count(text, "classical"),
            1.0,
        ])
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }
}

async fn create_test_database() -> (TempDir, Database) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let database = Database::initialize_from_config_dir(temp_dir.path())
        .await
        .expect("Failed to create test database");
    (temp_dir, database)
}

fn test_session(base: &str) -> ResearchSession {
    let mut session = ResearchSession::new(Box::new(StubEncoder), ThresholdTable::default());
    session.load_base(base).expect("Failed to load base context");
    session
}

fn new_paper(title: &str, abstract_text: &str) -> NewPaper {
    NewPaper {
        title: title.to_string(),
        abstract_text: abstract_text.to_string(),
        notes: String::new(),
        relevance_score: 0.0,
        category: RelevanceCategory::Low,
        arxiv_id: None,
        authors: None,
        published: None,
        embedding: None,
        embedding_model: None,
    }
}

#[tokio::test]
async fn first_pass_updates_second_pass_unchanged() {
    let (_temp_dir, database) = create_test_database().await;
    let session = test_session("quantum research context");

    database
        .create_paper(&new_paper("Quantum decoders", "All about quantum circuits"))
        .await
        .expect("Failed to create paper");
    database
        .create_paper(&new_paper("Classical methods", "Purely classical analysis"))
        .await
        .expect("Failed to create paper");

    let recalculator = Recalculator::new(&session, &database);

    let stats = recalculator
        .recalculate_all_scores(|_, _| {})
        .await
        .expect("Failed to recalculate scores");
    assert_eq!(
        stats,
        ScoreRefreshStats {
            total: 2,
            updated: 2,
            unchanged: 0,
            errors: 0
        }
    );

    let papers = database.list_papers().await.expect("Failed to list papers");
    assert!(
        papers
            .iter()
            .all(|p| p.embedding_model.as_deref() == Some("stub-model"))
    );
    assert!(papers.iter().all(|p| !p.embedding_needs_update));
    assert_eq!(papers[0].title, "Quantum decoders");
    assert!(papers[0].relevance_score > papers[1].relevance_score);

    // Nothing moved, so a second pass reports everything unchanged
    let stats = recalculator
        .recalculate_all_scores(|_, _| {})
        .await
        .expect("Failed to recalculate scores");
    assert_eq!(
        stats,
        ScoreRefreshStats {
            total: 2,
            updated: 0,
            unchanged: 2,
            errors: 0
        }
    );
}

#[tokio::test]
async fn drift_within_one_point_counts_as_unchanged() {
    let (_temp_dir, database) = create_test_database().await;
    let session = test_session("quantum research context");

    database
        .create_paper(&new_paper("Quantum alpha", "About quantum things"))
        .await
        .expect("Failed to create paper");

    let recalculator = Recalculator::new(&session, &database);
    recalculator
        .recalculate_all_scores(|_, _| {})
        .await
        .expect("Failed to recalculate scores");

    let papers = database.list_papers().await.expect("Failed to list papers");
    let true_score = papers[0].relevance_score;

    // Half a point off is still unchanged, and the true score is written back
    database
        .record_paper_score(
            &papers[0].id,
            true_score + 0.5,
            papers[0].category,
            &[1.0],
            "stub-model",
        )
        .await
        .expect("Failed to record score");
    let stats = recalculator
        .recalculate_all_scores(|_, _| {})
        .await
        .expect("Failed to recalculate scores");
    assert_eq!(stats.unchanged, 1);
    assert_eq!(stats.updated, 0);

    // Two points off crosses the threshold
    database
        .record_paper_score(
            &papers[0].id,
            true_score + 2.0,
            papers[0].category,
            &[1.0],
            "stub-model",
        )
        .await
        .expect("Failed to record score");
    let stats = recalculator
        .recalculate_all_scores(|_, _| {})
        .await
        .expect("Failed to recalculate scores");
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.unchanged, 0);

    let papers = database.list_papers().await.expect("Failed to list papers");
    assert!((papers[0].relevance_score - true_score).abs() < 1e-9);
}

#[tokio::test]
async fn per_paper_failures_do_not_abort_the_batch() {
    let (_temp_dir, database) = create_test_database().await;
    let session = test_session("quantum research context");

    database
        .create_paper(&new_paper("Quantum alpha", "Solid quantum work"))
        .await
        .expect("Failed to create paper");
    database
        .create_paper(&new_paper("Broken paper", "This abstract is unencodable"))
        .await
        .expect("Failed to create paper");
    database
        .create_paper(&new_paper("Classical beta", "A classical approach"))
        .await
        .expect("Failed to create paper");

    let recalculator = Recalculator::new(&session, &database);
    let mut calls = Vec::new();
    let stats = recalculator
        .recalculate_all_scores(|processed, total| calls.push((processed, total)))
        .await
        .expect("Failed to recalculate scores");

    assert_eq!(stats.total, 3);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.updated + stats.unchanged, 2);
    assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);

    let papers = database.list_papers().await.expect("Failed to list papers");
    let poisoned = papers
        .iter()
        .find(|p| p.title == "Broken paper")
        .expect("Paper should still exist");
    assert_eq!(poisoned.relevance_score, 0.0);
    assert!(poisoned.embedding.is_none());
}

#[tokio::test]
async fn rescoring_never_touches_reading_status() {
    let (_temp_dir, database) = create_test_database().await;
    let session = test_session("quantum research context");

    let paper = database
        .create_paper(&new_paper("Quantum alpha", "About quantum things"))
        .await
        .expect("Failed to create paper");
    database
        .update_paper_status(&paper.id, PaperStatus::Reading)
        .await
        .expect("Failed to update status");

    Recalculator::new(&session, &database)
        .recalculate_all_scores(|_, _| {})
        .await
        .expect("Failed to recalculate scores");

    let paper = database
        .get_paper(&paper.id)
        .await
        .expect("Failed to get paper")
        .expect("Paper should exist");
    assert_eq!(paper.status, PaperStatus::Reading);
}

#[tokio::test]
async fn recalculation_requires_a_loaded_context() {
    let (_temp_dir, database) = create_test_database().await;
    let session = ResearchSession::new(Box::new(StubEncoder), ThresholdTable::default());
    let recalculator = Recalculator::new(&session, &database);

    let result = recalculator.recalculate_all_scores(|_, _| {}).await;
    assert!(matches!(result, Err(TriageError::ContextNotLoaded)));

    let result = recalculator.refresh_note_embeddings(|_, _| {}).await;
    assert!(matches!(result, Err(TriageError::ContextNotLoaded)));
}

#[tokio::test]
async fn note_refresh_limits_to_flagged_papers_with_notes() {
    let (_temp_dir, database) = create_test_database().await;
    let session = test_session("quantum research context");

    let flagged = database
        .create_paper(&new_paper("Quantum alpha", "About quantum things"))
        .await
        .expect("Failed to create paper");
    database
        .set_paper_notes(&flagged.id, "Check the quantum decoding section")
        .await
        .expect("Failed to set notes");

    let fresh = database
        .create_paper(&new_paper("Untouched", "Never annotated"))
        .await
        .expect("Failed to create paper");

    let blank_notes = database
        .create_paper(&new_paper("Blank notes", "Annotated with whitespace"))
        .await
        .expect("Failed to create paper");
    database
        .set_paper_notes(&blank_notes.id, "   ")
        .await
        .expect("Failed to set notes");

    let poisoned = database
        .create_paper(&new_paper("Poisoned", "Fine abstract"))
        .await
        .expect("Failed to create paper");
    database
        .set_paper_notes(&poisoned.id, "These notes are unencodable")
        .await
        .expect("Failed to set notes");

    let recalculator = Recalculator::new(&session, &database);
    let mut calls = Vec::new();
    let stats = recalculator
        .refresh_note_embeddings(|processed, total| calls.push((processed, total)))
        .await
        .expect("Failed to refresh note embeddings");

    assert_eq!(
        stats,
        NoteRefreshStats {
            updated: 1,
            errors: 1,
            total_papers: 4
        }
    );
    assert_eq!(calls, vec![(1, 2), (2, 2)]);

    let flagged = database
        .get_paper(&flagged.id)
        .await
        .expect("Failed to get paper")
        .expect("Paper should exist");
    assert!(!flagged.embedding_needs_update);
    assert!(flagged.embedding_updated_date.is_some());
    assert!(flagged.relevance_score > 0.0);
    assert_eq!(flagged.embedding_model.as_deref(), Some("stub-model"));

    let fresh = database
        .get_paper(&fresh.id)
        .await
        .expect("Failed to get paper")
        .expect("Paper should exist");
    assert!(fresh.embedding.is_none());
    assert!(!fresh.embedding_needs_update);

    // Whitespace notes stay flagged but are never refreshed
    let blank_notes = database
        .get_paper(&blank_notes.id)
        .await
        .expect("Failed to get paper")
        .expect("Paper should exist");
    assert!(blank_notes.embedding_needs_update);

    let poisoned = database
        .get_paper(&poisoned.id)
        .await
        .expect("Failed to get paper")
        .expect("Paper should exist");
    assert!(poisoned.embedding_needs_update);
    assert_eq!(poisoned.relevance_score, 0.0);
}
