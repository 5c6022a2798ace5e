#[cfg(test)]
mod tests;

use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

pub struct PaperQueries;

impl PaperQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_paper: NewPaper) -> Result<Paper> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();
        let embedding_json = new_paper
            .embedding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to encode paper embedding")?;
        let embedding_date = embedding_json.as_ref().map(|_| now);

        sqlx::query(
            r#"
            INSERT INTO papers (id, title, abstract, notes, relevance_score, category, status,
                                arxiv_id, authors, published, embedding, embedding_model,
                                embedding_needs_update, embedding_updated_date, added_date)
            VALUES (?, ?, ?, ?, ?, ?, 'to_read', ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new_paper.title)
        .bind(&new_paper.abstract_text)
        .bind(&new_paper.notes)
        .bind(new_paper.relevance_score)
        .bind(new_paper.category)
        .bind(&new_paper.arxiv_id)
        .bind(&new_paper.authors)
        .bind(&new_paper.published)
        .bind(&embedding_json)
        .bind(&new_paper.embedding_model)
        .bind(embedding_date)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create paper")?;

        debug!("Stored paper {}: {}", id, new_paper.title);

        Self::get_by_id(pool, &id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created paper"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Paper>> {
        let result = sqlx::query_as::<_, Paper>(
            r#"
            SELECT id,
                   title,
                   abstract,
                   notes,
                   relevance_score,
                   category,
                   status,
                   arxiv_id,
                   authors,
                   published,
                   pdf_path,
                   embedding,
                   embedding_model,
                   embedding_needs_update,
                   embedding_updated_date,
                   added_date
            FROM papers WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get paper by id")?;

        Ok(result)
    }

    #[inline]
    pub async fn get_by_arxiv_id(pool: &SqlitePool, arxiv_id: &str) -> Result<Option<Paper>> {
        let result = sqlx::query_as::<_, Paper>(
            r#"
            SELECT id,
                   title,
                   abstract,
                   notes,
                   relevance_score,
                   category,
                   status,
                   arxiv_id,
                   authors,
                   published,
                   pdf_path,
                   embedding,
                   embedding_model,
                   embedding_needs_update,
                   embedding_updated_date,
                   added_date
            FROM papers WHERE arxiv_id = ?
            "#,
        )
        .bind(arxiv_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get paper by arxiv id")?;

        Ok(result)
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Paper>> {
        let papers = sqlx::query_as::<_, Paper>(
            r#"
            SELECT id,
                   title,
                   abstract,
                   notes,
                   relevance_score,
                   category,
                   status,
                   arxiv_id,
                   authors,
                   published,
                   pdf_path,
                   embedding,
                   embedding_model,
                   embedding_needs_update,
                   embedding_updated_date,
                   added_date
            FROM papers ORDER BY relevance_score DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .context("Failed to list all papers")?;

        Ok(papers)
    }

    #[inline]
    pub async fn list_by_status(pool: &SqlitePool, status: PaperStatus) -> Result<Vec<Paper>> {
        let papers = sqlx::query_as::<_, Paper>(
            r#"
            SELECT id,
                   title,
                   abstract,
                   notes,
                   relevance_score,
                   category,
                   status,
                   arxiv_id,
                   authors,
                   published,
                   pdf_path,
                   embedding,
                   embedding_model,
                   embedding_needs_update,
                   embedding_updated_date,
                   added_date
            FROM papers WHERE status = ? ORDER BY relevance_score DESC
            "#,
        )
        .bind(status)
        .fetch_all(pool)
        .await
        .context("Failed to list papers by status")?;

        Ok(papers)
    }

    #[inline]
    pub async fn search(pool: &SqlitePool, term: &str) -> Result<Vec<Paper>> {
        let pattern = format!("%{}%", term);
        let papers = sqlx::query_as::<_, Paper>(
            r#"
            SELECT id,
                   title,
                   abstract,
                   notes,
                   relevance_score,
                   category,
                   status,
                   arxiv_id,
                   authors,
                   published,
                   pdf_path,
                   embedding,
                   embedding_model,
                   embedding_needs_update,
                   embedding_updated_date,
                   added_date
            FROM papers
            WHERE title LIKE ? OR abstract LIKE ? OR notes LIKE ?
            ORDER BY relevance_score DESC
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(pool)
        .await
        .context("Failed to search papers")?;

        Ok(papers)
    }

    #[inline]
    pub async fn update_status(pool: &SqlitePool, id: &str, status: PaperStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE papers SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to update paper status")?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces a paper's notes and flags its cached embedding as stale so the
    /// next refresh pass picks it up.
    #[inline]
    pub async fn set_notes(pool: &SqlitePool, id: &str, notes: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE papers SET notes = ?, embedding_needs_update = 1 WHERE id = ?")
                .bind(notes)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to set paper notes")?;

        Ok(result.rows_affected() > 0)
    }

    /// Persists a scoring result: score, category, the embedding that produced
    /// them, and the model identity. Clears the stale flag and stamps the
    /// refresh time. Never touches `status`.
    #[inline]
    pub async fn record_score(
        pool: &SqlitePool,
        id: &str,
        score: f64,
        category: RelevanceCategory,
        embedding: &[f32],
        model: &str,
    ) -> Result<bool> {
        let embedding_json =
            serde_json::to_string(embedding).context("Failed to encode paper embedding")?;
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE papers
            SET relevance_score = ?,
                category = ?,
                embedding = ?,
                embedding_model = ?,
                embedding_needs_update = 0,
                embedding_updated_date = ?
            WHERE id = ?
            "#,
        )
        .bind(score)
        .bind(category)
        .bind(&embedding_json)
        .bind(model)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to record paper score")?;

        Ok(result.rows_affected() > 0)
    }

    #[inline]
    pub async fn set_pdf_path(pool: &SqlitePool, id: &str, pdf_path: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE papers SET pdf_path = ? WHERE id = ?")
            .bind(pdf_path)
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to set paper PDF path")?;

        Ok(result.rows_affected() > 0)
    }

    /// Flags every stored paper as needing a new embedding. Run when the
    /// active model changes and all cached vectors become incomparable.
    #[inline]
    pub async fn mark_all_stale(pool: &SqlitePool) -> Result<u64> {
        let result = sqlx::query("UPDATE papers SET embedding_needs_update = 1")
            .execute(pool)
            .await
            .context("Failed to mark papers stale")?;

        debug!("Marked {} papers as needing re-embedding", result.rows_affected());

        Ok(result.rows_affected())
    }

    #[inline]
    pub async fn list_stale_with_notes(pool: &SqlitePool) -> Result<Vec<Paper>> {
        let papers = sqlx::query_as::<_, Paper>(
            r#"
            SELECT id,
                   title,
                   abstract,
                   notes,
                   relevance_score,
                   category,
                   status,
                   arxiv_id,
                   authors,
                   published,
                   pdf_path,
                   embedding,
                   embedding_model,
                   embedding_needs_update,
                   embedding_updated_date,
                   added_date
            FROM papers
            WHERE embedding_needs_update = 1 AND TRIM(notes) != ''
            ORDER BY added_date ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .context("Failed to list stale papers with notes")?;

        Ok(papers)
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM papers WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete paper")?;

        Ok(result.rows_affected() > 0)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM papers")
            .fetch_one(pool)
            .await
            .context("Failed to count papers")?;

        Ok(count)
    }

    #[inline]
    pub async fn count_by_status(pool: &SqlitePool, status: PaperStatus) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM papers WHERE status = ?")
            .bind(status)
            .fetch_one(pool)
            .await
            .context("Failed to count papers by status")?;

        Ok(count)
    }

    #[inline]
    pub async fn count_by_category(
        pool: &SqlitePool,
        category: RelevanceCategory,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM papers WHERE category = ?")
            .bind(category)
            .fetch_one(pool)
            .await
            .context("Failed to count papers by category")?;

        Ok(count)
    }

    #[inline]
    pub async fn count_stale(pool: &SqlitePool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM papers WHERE embedding_needs_update = 1",
        )
        .fetch_one(pool)
        .await
        .context("Failed to count stale papers")?;

        Ok(count)
    }

    #[inline]
    pub async fn get_statistics(pool: &SqlitePool) -> Result<PaperStatistics> {
        let total_papers = Self::count(pool).await?;
        let to_read = Self::count_by_status(pool, PaperStatus::ToRead).await?;
        let reading = Self::count_by_status(pool, PaperStatus::Reading).await?;
        let read = Self::count_by_status(pool, PaperStatus::Read).await?;
        let discarded = Self::count_by_status(pool, PaperStatus::Discarded).await?;
        let low = Self::count_by_category(pool, RelevanceCategory::Low).await?;
        let somewhat = Self::count_by_category(pool, RelevanceCategory::Somewhat).await?;
        let moderately = Self::count_by_category(pool, RelevanceCategory::Moderately).await?;
        let highly = Self::count_by_category(pool, RelevanceCategory::Highly).await?;

        let average_score =
            sqlx::query_scalar::<_, Option<f64>>("SELECT AVG(relevance_score) FROM papers")
                .fetch_one(pool)
                .await
                .context("Failed to get average relevance score")?
                .unwrap_or(0.0);

        let with_pdf = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM papers WHERE pdf_path IS NOT NULL",
        )
        .fetch_one(pool)
        .await
        .context("Failed to count papers with PDFs")?;

        Ok(PaperStatistics {
            total_papers,
            to_read,
            reading,
            read,
            discarded,
            low,
            somewhat,
            moderately,
            highly,
            average_score,
            with_pdf,
        })
    }
}

pub struct SnippetQueries;

impl SnippetQueries {
    /// Inserts a snippet at the end of the ordering. The id comes from the
    /// in-memory snippet so the store and the composer stay in agreement.
    #[inline]
    pub async fn create(pool: &SqlitePool, new_snippet: NewSnippet) -> Result<StoredSnippet> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO snippets (id, content, source, paper_id, position, added_date)
            VALUES (?, ?, ?, ?, (SELECT COALESCE(MAX(position) + 1, 0) FROM snippets), ?)
            "#,
        )
        .bind(&new_snippet.id)
        .bind(&new_snippet.content)
        .bind(&new_snippet.source)
        .bind(&new_snippet.paper_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create snippet")?;

        Self::get_by_id(pool, &new_snippet.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created snippet"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<StoredSnippet>> {
        let result = sqlx::query_as::<_, StoredSnippet>(
            r#"
            SELECT id,
                   content,
                   source,
                   paper_id,
                   position,
                   added_date
            FROM snippets WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get snippet by id")?;

        Ok(result)
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<StoredSnippet>> {
        let snippets = sqlx::query_as::<_, StoredSnippet>(
            r#"
            SELECT id,
                   content,
                   source,
                   paper_id,
                   position,
                   added_date
            FROM snippets ORDER BY position ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .context("Failed to list snippets")?;

        Ok(snippets)
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM snippets WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete snippet")?;

        Ok(result.rows_affected() > 0)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM snippets")
            .fetch_one(pool)
            .await
            .context("Failed to count snippets")?;

        Ok(count)
    }
}
