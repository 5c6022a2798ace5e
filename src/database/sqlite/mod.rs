use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::database::sqlite::queries::{PaperQueries, SnippetQueries};


pub mod models;
pub mod queries;

pub use models::*;

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(database_url: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        let db_path = config_dir.join("papers.db");
        let db_url = db_path.to_string_lossy();

        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(db_url.as_ref()).await
    }

    // Paper operations
    pub async fn create_paper(&self, paper: &NewPaper) -> Result<Paper> {
        PaperQueries::create(&self.pool, paper.clone()).await
    }

    pub async fn get_paper(&self, id: &str) -> Result<Option<Paper>> {
        PaperQueries::get_by_id(&self.pool, id).await
    }

    pub async fn get_paper_by_arxiv_id(&self, arxiv_id: &str) -> Result<Option<Paper>> {
        PaperQueries::get_by_arxiv_id(&self.pool, arxiv_id).await
    }

    pub async fn list_papers(&self) -> Result<Vec<Paper>> {
        PaperQueries::list_all(&self.pool).await
    }

    pub async fn list_papers_by_status(&self, status: PaperStatus) -> Result<Vec<Paper>> {
        PaperQueries::list_by_status(&self.pool, status).await
    }

    pub async fn search_papers(&self, term: &str) -> Result<Vec<Paper>> {
        PaperQueries::search(&self.pool, term).await
    }

    pub async fn update_paper_status(&self, id: &str, status: PaperStatus) -> Result<bool> {
        PaperQueries::update_status(&self.pool, id, status).await
    }

    pub async fn set_paper_notes(&self, id: &str, notes: &str) -> Result<bool> {
        PaperQueries::set_notes(&self.pool, id, notes).await
    }

    pub async fn record_paper_score(
        &self,
        id: &str,
        score: f64,
        category: RelevanceCategory,
        embedding: &[f32],
        model: &str,
    ) -> Result<bool> {
        PaperQueries::record_score(&self.pool, id, score, category, embedding, model).await
    }

    pub async fn set_paper_pdf_path(&self, id: &str, pdf_path: &str) -> Result<bool> {
        PaperQueries::set_pdf_path(&self.pool, id, pdf_path).await
    }

    pub async fn mark_all_papers_stale(&self) -> Result<u64> {
        PaperQueries::mark_all_stale(&self.pool).await
    }

    pub async fn list_stale_papers_with_notes(&self) -> Result<Vec<Paper>> {
        PaperQueries::list_stale_with_notes(&self.pool).await
    }

    pub async fn delete_paper(&self, id: &str) -> Result<bool> {
        PaperQueries::delete(&self.pool, id).await
    }

    pub async fn count_papers(&self) -> Result<i64> {
        PaperQueries::count(&self.pool).await
    }

    pub async fn count_stale_papers(&self) -> Result<i64> {
        PaperQueries::count_stale(&self.pool).await
    }

    pub async fn get_statistics(&self) -> Result<PaperStatistics> {
        PaperQueries::get_statistics(&self.pool).await
    }

    // Snippet operations
    pub async fn create_snippet(&self, snippet: &NewSnippet) -> Result<StoredSnippet> {
        SnippetQueries::create(&self.pool, snippet.clone()).await
    }

    pub async fn list_snippets(&self) -> Result<Vec<StoredSnippet>> {
        SnippetQueries::list_all(&self.pool).await
    }

    pub async fn delete_snippet(&self, id: &str) -> Result<bool> {
        SnippetQueries::delete(&self.pool, id).await
    }

    pub async fn count_snippets(&self) -> Result<i64> {
        SnippetQueries::count(&self.pool).await
    }

    /// Optimize database performance by running VACUUM and ANALYZE
    pub async fn optimize(&self) -> Result<()> {
        info!("Optimizing database performance");

        // Run VACUUM to reclaim space and defragment
        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .context("Failed to vacuum database")?;

        // Run ANALYZE to update table statistics for better query planning
        sqlx::query("ANALYZE")
            .execute(&self.pool)
            .await
            .context("Failed to analyze database")?;

        debug!("Database optimization completed");
        Ok(())
    }
}
