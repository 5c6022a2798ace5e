use super::*;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

async fn create_test_pool() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(
            sqlx::sqlite::SqliteConnectOptions::new()
                .filename(&db_path)
                .create_if_missing(true)
                .foreign_keys(true),
        )
        .await
        .expect("Failed to create test pool");

    sqlx::query(include_str!("../migrations/001_initial_schema.sql"))
        .execute(&pool)
        .await
        .expect("Failed to run migrations");

    (temp_dir, pool)
}

fn sample_paper(title: &str, score: f64, category: RelevanceCategory) -> NewPaper {
    NewPaper {
        title: title.to_string(),
        abstract_text: format!("Abstract for {}", title),
        notes: String::new(),
        relevance_score: score,
        category,
        arxiv_id: None,
        authors: None,
        published: None,
        embedding: Some(vec![0.1, 0.2, 0.3]),
        embedding_model: Some("all-minilm".to_string()),
    }
}

#[tokio::test]
async fn paper_crud_operations() {
    let (_temp_dir, pool) = create_test_pool().await;

    let mut new_paper = sample_paper("Surface code decoders", 87.3, RelevanceCategory::Highly);
    new_paper.arxiv_id = Some("2301.01234".to_string());
    new_paper.authors = Some("A. Researcher".to_string());
    new_paper.published = Some("2023-01-03".to_string());

    let created = PaperQueries::create(&pool, new_paper)
        .await
        .expect("Failed to create paper");

    assert_eq!(created.title, "Surface code decoders");
    assert_eq!(created.status, PaperStatus::ToRead);
    assert_eq!(created.category, RelevanceCategory::Highly);
    assert_eq!(created.relevance_score, 87.3);
    assert!(!created.embedding_needs_update);
    assert!(created.embedding_updated_date.is_some());
    assert_eq!(
        created
            .embedding_vector()
            .expect("Failed to decode embedding")
            .expect("Embedding should be stored"),
        vec![0.1_f32, 0.2, 0.3]
    );

    let retrieved = PaperQueries::get_by_id(&pool, &created.id)
        .await
        .expect("Failed to get paper")
        .expect("Paper should exist");
    assert_eq!(retrieved, created);

    let by_arxiv = PaperQueries::get_by_arxiv_id(&pool, "2301.01234")
        .await
        .expect("Failed to get paper by arxiv id")
        .expect("Paper should be found by arxiv id");
    assert_eq!(by_arxiv.id, created.id);

    let updated = PaperQueries::update_status(&pool, &created.id, PaperStatus::Reading)
        .await
        .expect("Failed to update status");
    assert!(updated);

    let retrieved = PaperQueries::get_by_id(&pool, &created.id)
        .await
        .expect("Failed to get paper")
        .expect("Paper should exist");
    assert_eq!(retrieved.status, PaperStatus::Reading);

    let deleted = PaperQueries::delete(&pool, &created.id)
        .await
        .expect("Failed to delete paper");
    assert!(deleted);

    let not_found = PaperQueries::get_by_id(&pool, &created.id)
        .await
        .expect("Query should succeed");
    assert!(not_found.is_none());

    let deleted_again = PaperQueries::delete(&pool, &created.id)
        .await
        .expect("Delete should succeed");
    assert!(!deleted_again);
}

#[tokio::test]
async fn listing_orders_by_relevance_descending() {
    let (_temp_dir, pool) = create_test_pool().await;

    PaperQueries::create(&pool, sample_paper("Middle", 50.0, RelevanceCategory::Moderately))
        .await
        .expect("Failed to create paper");
    PaperQueries::create(&pool, sample_paper("Top", 91.2, RelevanceCategory::Highly))
        .await
        .expect("Failed to create paper");
    PaperQueries::create(&pool, sample_paper("Bottom", 12.5, RelevanceCategory::Low))
        .await
        .expect("Failed to create paper");

    let papers = PaperQueries::list_all(&pool).await.expect("Failed to list papers");
    let titles: Vec<&str> = papers.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Top", "Middle", "Bottom"]);

    let top = &papers[0];
    PaperQueries::update_status(&pool, &top.id, PaperStatus::Read)
        .await
        .expect("Failed to update status");

    let to_read = PaperQueries::list_by_status(&pool, PaperStatus::ToRead)
        .await
        .expect("Failed to list by status");
    assert_eq!(to_read.len(), 2);
    assert_eq!(to_read[0].title, "Middle");

    let read = PaperQueries::list_by_status(&pool, PaperStatus::Read)
        .await
        .expect("Failed to list by status");
    assert_eq!(read.len(), 1);
    assert_eq!(read[0].title, "Top");
}

#[tokio::test]
async fn search_covers_title_abstract_and_notes() {
    let (_temp_dir, pool) = create_test_pool().await;

    let mut by_title = sample_paper("Quantum error correction", 80.0, RelevanceCategory::Highly);
    by_title.abstract_text = "A study of stabilizer codes.".to_string();
    PaperQueries::create(&pool, by_title)
        .await
        .expect("Failed to create paper");

    let mut by_abstract = sample_paper("Decoder survey", 60.0, RelevanceCategory::Moderately);
    by_abstract.abstract_text = "Covers quantum decoding algorithms in depth.".to_string();
    PaperQueries::create(&pool, by_abstract)
        .await
        .expect("Failed to create paper");

    let mut by_notes = sample_paper("Neural networks", 20.0, RelevanceCategory::Low);
    by_notes.abstract_text = "Classical deep learning methods.".to_string();
    by_notes.notes = "Compare against quantum baselines".to_string();
    PaperQueries::create(&pool, by_notes)
        .await
        .expect("Failed to create paper");

    let results = PaperQueries::search(&pool, "quantum")
        .await
        .expect("Failed to search papers");
    assert_eq!(results.len(), 3);
    // Highest relevance first
    assert_eq!(results[0].title, "Quantum error correction");

    let results = PaperQueries::search(&pool, "sourdough")
        .await
        .expect("Failed to search papers");
    assert!(results.is_empty());
}

#[tokio::test]
async fn notes_update_flags_stale_and_rescore_clears_it() {
    let (_temp_dir, pool) = create_test_pool().await;

    let created = PaperQueries::create(
        &pool,
        sample_paper("Paper with notes", 40.0, RelevanceCategory::Somewhat),
    )
    .await
    .expect("Failed to create paper");
    assert!(!created.embedding_needs_update);

    let updated = PaperQueries::set_notes(&pool, &created.id, "Interesting decoder section")
        .await
        .expect("Failed to set notes");
    assert!(updated);

    let paper = PaperQueries::get_by_id(&pool, &created.id)
        .await
        .expect("Failed to get paper")
        .expect("Paper should exist");
    assert_eq!(paper.notes, "Interesting decoder section");
    assert!(paper.embedding_needs_update);

    let recorded = PaperQueries::record_score(
        &pool,
        &created.id,
        55.5,
        RelevanceCategory::Moderately,
        &[0.4, 0.5, 0.6],
        "all-mpnet-base-v2",
    )
    .await
    .expect("Failed to record score");
    assert!(recorded);

    let paper = PaperQueries::get_by_id(&pool, &created.id)
        .await
        .expect("Failed to get paper")
        .expect("Paper should exist");
    assert_eq!(paper.relevance_score, 55.5);
    assert_eq!(paper.category, RelevanceCategory::Moderately);
    assert_eq!(paper.embedding_model.as_deref(), Some("all-mpnet-base-v2"));
    assert!(!paper.embedding_needs_update);
    assert!(paper.embedding_updated_date.is_some());
    // Rescoring never touches reading status
    assert_eq!(paper.status, PaperStatus::ToRead);
    assert_eq!(
        paper
            .embedding_vector()
            .expect("Failed to decode embedding")
            .expect("Embedding should be stored"),
        vec![0.4_f32, 0.5, 0.6]
    );
}

#[tokio::test]
async fn stale_listing_requires_notes() {
    let (_temp_dir, pool) = create_test_pool().await;

    let with_notes = PaperQueries::create(
        &pool,
        sample_paper("Has notes", 70.0, RelevanceCategory::Moderately),
    )
    .await
    .expect("Failed to create paper");
    PaperQueries::set_notes(&pool, &with_notes.id, "Useful for chapter 3")
        .await
        .expect("Failed to set notes");

    let whitespace_notes = PaperQueries::create(
        &pool,
        sample_paper("Whitespace notes", 30.0, RelevanceCategory::Somewhat),
    )
    .await
    .expect("Failed to create paper");
    PaperQueries::set_notes(&pool, &whitespace_notes.id, "   ")
        .await
        .expect("Failed to set notes");

    PaperQueries::create(&pool, sample_paper("No notes", 10.0, RelevanceCategory::Low))
        .await
        .expect("Failed to create paper");

    let stale = PaperQueries::list_stale_with_notes(&pool)
        .await
        .expect("Failed to list stale papers");
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].title, "Has notes");

    let marked = PaperQueries::mark_all_stale(&pool)
        .await
        .expect("Failed to mark papers stale");
    assert_eq!(marked, 3);

    let stale_count = PaperQueries::count_stale(&pool)
        .await
        .expect("Failed to count stale papers");
    assert_eq!(stale_count, 3);

    // Still filtered to papers with real notes
    let stale = PaperQueries::list_stale_with_notes(&pool)
        .await
        .expect("Failed to list stale papers");
    assert_eq!(stale.len(), 1);
}

#[tokio::test]
async fn pdf_path_updates() {
    let (_temp_dir, pool) = create_test_pool().await;

    let created = PaperQueries::create(
        &pool,
        sample_paper("Downloadable", 65.0, RelevanceCategory::Moderately),
    )
    .await
    .expect("Failed to create paper");

    let updated = PaperQueries::set_pdf_path(&pool, &created.id, "papers/[2301.01234] Downloadable.pdf")
        .await
        .expect("Failed to set PDF path");
    assert!(updated);

    let paper = PaperQueries::get_by_id(&pool, &created.id)
        .await
        .expect("Failed to get paper")
        .expect("Paper should exist");
    assert_eq!(
        paper.pdf_path.as_deref(),
        Some("papers/[2301.01234] Downloadable.pdf")
    );

    let missing = PaperQueries::set_pdf_path(&pool, "no-such-id", "papers/x.pdf")
        .await
        .expect("Update should succeed");
    assert!(!missing);
}

#[tokio::test]
async fn statistics_aggregation() {
    let (_temp_dir, pool) = create_test_pool().await;

    let stats = PaperQueries::get_statistics(&pool)
        .await
        .expect("Failed to get statistics");
    assert_eq!(stats.total_papers, 0);
    assert_eq!(stats.average_score, 0.0);

    let a = PaperQueries::create(&pool, sample_paper("A", 90.0, RelevanceCategory::Highly))
        .await
        .expect("Failed to create paper");
    let b = PaperQueries::create(&pool, sample_paper("B", 60.0, RelevanceCategory::Moderately))
        .await
        .expect("Failed to create paper");
    PaperQueries::create(&pool, sample_paper("C", 30.0, RelevanceCategory::Somewhat))
        .await
        .expect("Failed to create paper");

    PaperQueries::update_status(&pool, &a.id, PaperStatus::Read)
        .await
        .expect("Failed to update status");
    PaperQueries::set_pdf_path(&pool, &b.id, "papers/b.pdf")
        .await
        .expect("Failed to set PDF path");

    let stats = PaperQueries::get_statistics(&pool)
        .await
        .expect("Failed to get statistics");
    assert_eq!(stats.total_papers, 3);
    assert_eq!(stats.read, 1);
    assert_eq!(stats.to_read, 2);
    assert_eq!(stats.reading, 0);
    assert_eq!(stats.discarded, 0);
    assert_eq!(stats.highly, 1);
    assert_eq!(stats.moderately, 1);
    assert_eq!(stats.somewhat, 1);
    assert_eq!(stats.low, 0);
    assert_eq!(stats.with_pdf, 1);
    assert!((stats.average_score - 60.0).abs() < 1e-9);
}

#[tokio::test]
async fn snippet_operations_keep_position_order() {
    let (_temp_dir, pool) = create_test_pool().await;

    let first = SnippetQueries::create(
        &pool,
        NewSnippet {
            id: Uuid::new_v4().to_string(),
            content: "Lattice surgery basics".to_string(),
            source: None,
            paper_id: None,
        },
    )
    .await
    .expect("Failed to create snippet");
    assert_eq!(first.position, 0);

    let second = SnippetQueries::create(
        &pool,
        NewSnippet {
            id: Uuid::new_v4().to_string(),
            content: "Decoder latency constraints".to_string(),
            source: Some("2301.01234".to_string()),
            paper_id: None,
        },
    )
    .await
    .expect("Failed to create snippet");
    assert_eq!(second.position, 1);
    assert_eq!(second.source.as_deref(), Some("2301.01234"));

    let snippets = SnippetQueries::list_all(&pool)
        .await
        .expect("Failed to list snippets");
    assert_eq!(snippets.len(), 2);
    assert_eq!(snippets[0].content, "Lattice surgery basics");
    assert_eq!(snippets[1].content, "Decoder latency constraints");

    let deleted = SnippetQueries::delete(&pool, &first.id)
        .await
        .expect("Failed to delete snippet");
    assert!(deleted);

    // New snippets continue after the remaining maximum
    let third = SnippetQueries::create(
        &pool,
        NewSnippet {
            id: Uuid::new_v4().to_string(),
            content: "Magic state distillation costs".to_string(),
            source: None,
            paper_id: None,
        },
    )
    .await
    .expect("Failed to create snippet");
    assert_eq!(third.position, 2);

    let count = SnippetQueries::count(&pool).await.expect("Failed to count snippets");
    assert_eq!(count, 2);
}

#[tokio::test]
async fn snippet_survives_paper_deletion() {
    let (_temp_dir, pool) = create_test_pool().await;

    let paper = PaperQueries::create(
        &pool,
        sample_paper("Source paper", 75.0, RelevanceCategory::Moderately),
    )
    .await
    .expect("Failed to create paper");

    let snippet = SnippetQueries::create(
        &pool,
        NewSnippet {
            id: Uuid::new_v4().to_string(),
            content: "Key excerpt from the source paper".to_string(),
            source: Some("Source paper".to_string()),
            paper_id: Some(paper.id.clone()),
        },
    )
    .await
    .expect("Failed to create snippet");
    assert_eq!(snippet.paper_id.as_deref(), Some(paper.id.as_str()));

    PaperQueries::delete(&pool, &paper.id)
        .await
        .expect("Failed to delete paper");

    // ON DELETE SET NULL keeps the snippet but drops the link
    let snippet = SnippetQueries::get_by_id(&pool, &snippet.id)
        .await
        .expect("Failed to get snippet")
        .expect("Snippet should survive paper deletion");
    assert!(snippet.paper_id.is_none());
}
